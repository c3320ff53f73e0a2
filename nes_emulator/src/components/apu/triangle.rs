//! Triangle channel ($4008-$400B)
use intbits::Bits;

use super::LENGTH_TABLE;

#[derive(Default)]
pub struct Triangle {
    pub enabled: bool,
    pub length: u8,
    /// Halts the length counter and keeps reloading the linear counter.
    control: bool,
    linear_reload_value: u8,
    linear_reload: bool,
    linear_counter: u8,
    period: u16,
    timer: u16,
    sequencer: u8,
    output: u8,
}

impl Triangle {
    /// Register write, `reg` is the register index 0-3.
    pub fn write(&mut self, reg: u16, value: u8) {
        match reg {
            0 => {
                self.control = value.bit(7);
                self.linear_reload_value = value & 0x7F;
            }
            2 => self.period = (self.period & 0xFF00) | value as u16,
            3 => {
                if self.enabled {
                    self.length = LENGTH_TABLE[(value >> 3) as usize];
                }
                self.period = (((value & 7) as u16) << 8) | (self.period & 0x00FF);
                self.linear_reload = true;
            }
            _ => (),
        }
    }

    /// Clocks the linear counter.
    pub fn quarter_frame(&mut self) {
        if !self.enabled {
            return;
        }
        if self.linear_reload {
            self.linear_counter = self.linear_reload_value;
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.control {
            self.linear_reload = false;
        }
    }

    /// Clocks the length counter.
    pub fn half_frame(&mut self) {
        if self.enabled && self.length > 0 && !self.control {
            self.length -= 1;
        }
    }

    /// Clocks the timer, called on every CPU cycle. The sequencer steps through
    /// 15, 14, .., 0, 0, 1, .., 15 while both counters are non-zero. Periods below 2 produce
    /// ultrasonic output, which is silenced.
    pub fn clock_timer(&mut self) {
        if !self.enabled {
            return;
        }
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.period;
        if self.length > 0 && self.linear_counter > 0 {
            self.output = if self.period > 1 {
                if self.sequencer < 16 {
                    15 - self.sequencer
                } else {
                    self.sequencer - 16
                }
            } else {
                0
            };
            self.sequencer = (self.sequencer + 1) % 32;
        }
    }

    pub fn output(&self) -> u8 {
        self.output
    }
}
