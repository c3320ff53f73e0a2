//! Noise channel ($400C-$400F)
use intbits::Bits;

use super::envelope::Envelope;
use super::LENGTH_TABLE;

const PERIOD_TABLE: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

pub struct Noise {
    pub enabled: bool,
    pub length: u8,
    envelope: Envelope,
    /// Short mode, feedback taken from bit 6 instead of bit 1.
    short_mode: bool,
    period: u16,
    timer: u16,
    shift_register: u16,
    output: u8,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            enabled: false,
            length: 0,
            envelope: Envelope::default(),
            short_mode: false,
            period: 0,
            timer: 0,
            shift_register: 1,
            output: 0,
        }
    }
}

impl Noise {
    /// Register write, `reg` is the register index 0-3.
    pub fn write(&mut self, reg: u16, value: u8) {
        match reg {
            0 => self
                .envelope
                .write_control(value.bit(5), value.bit(4), value & 0x0F),
            2 => {
                self.short_mode = value.bit(7);
                self.period = PERIOD_TABLE[(value & 0x0F) as usize];
            }
            3 => {
                if self.enabled {
                    self.length = LENGTH_TABLE[(value >> 3) as usize];
                }
                self.envelope.start = true;
            }
            _ => (),
        }
    }

    pub fn quarter_frame(&mut self) {
        if self.length > 0 {
            self.envelope.clock();
        }
    }

    pub fn half_frame(&mut self) {
        if self.length > 0 && !self.envelope.loop_flag {
            self.length -= 1;
        }
    }

    /// Clocks the timer, called on every other CPU cycle.
    pub fn clock_timer(&mut self) {
        if self.length == 0 {
            self.output = 0;
            return;
        }
        if self.timer == 0 {
            self.timer = self.period;
            self.shift_lfsr();
        } else {
            self.timer -= 1;
        }
        self.output = if self.shift_register.bit(0) {
            0
        } else {
            self.envelope.output()
        };
    }

    pub fn output(&self) -> u8 {
        self.output
    }

    /// 15 bit linear feedback shift register, bit 0 XOR bit 1 (or bit 6 in short mode) is
    /// shifted in at bit 14.
    fn shift_lfsr(&mut self) {
        let tap = if self.short_mode { 6 } else { 1 };
        let feedback = (self.shift_register ^ (self.shift_register >> tap)) & 1;
        self.shift_register = (self.shift_register >> 1) | (feedback << 14);
    }
}
