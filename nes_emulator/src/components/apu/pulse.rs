//! Pulse channels ($4000-$4007)
use bilge::prelude::*;

use super::envelope::Envelope;
use super::LENGTH_TABLE;

const DUTY_SEQUENCES: [u8; 4] = [0x80, 0xC0, 0xF0, 0x3F];

/// Periods at or above this value mute the channel.
const PERIOD_LIMIT: u16 = 0x800;

/// $4000 / $4004
#[bitsize(8)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
struct PulseControl {
    volume: u4,
    constant_volume: bool,
    halt: bool,
    duty: u2,
}

/// $4001 / $4005
#[bitsize(8)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
struct SweepControl {
    shift: u3,
    negate: bool,
    period: u3,
    enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PulseId {
    /// Negates the sweep change in ones' complement.
    Pulse1,
    /// Negates the sweep change in two's complement.
    Pulse2,
}

pub struct Pulse {
    id: PulseId,
    pub enabled: bool,
    pub length: u8,
    envelope: Envelope,
    duty: u8,
    sequencer: u8,
    sequence_output: bool,
    period: u16,
    timer: u16,
    sweep: SweepControl,
    sweep_reload: bool,
    sweep_divider: u8,
    sweep_target: u16,
    output: u8,
}

impl Pulse {
    pub fn new(id: PulseId) -> Self {
        Self {
            id,
            enabled: false,
            length: 0,
            envelope: Envelope::default(),
            duty: 0,
            sequencer: 0,
            sequence_output: false,
            period: 0,
            timer: 0,
            sweep: SweepControl::default(),
            sweep_reload: false,
            sweep_divider: 0,
            sweep_target: 0,
            output: 0,
        }
    }

    /// Register write, `reg` is the register index 0-3.
    pub fn write(&mut self, reg: u16, value: u8) {
        match reg {
            0 => {
                let control = PulseControl::from(value);
                self.duty = control.duty().value();
                self.envelope.write_control(
                    control.halt(),
                    control.constant_volume(),
                    control.volume().value(),
                );
            }
            1 => {
                self.sweep = SweepControl::from(value);
                self.sweep_reload = true;
            }
            2 => self.period = (self.period & 0xFF00) | value as u16,
            _ => {
                if self.enabled {
                    self.length = LENGTH_TABLE[(value >> 3) as usize];
                }
                self.period = (((value & 7) as u16) << 8) | (self.period & 0x00FF);
                self.sequencer = 0;
                self.envelope.start = true;
            }
        }
        self.update_sweep_target();
    }

    pub fn quarter_frame(&mut self) {
        if self.length > 0 {
            self.envelope.clock();
        }
    }

    /// Clocks the length counter and the sweep unit.
    pub fn half_frame(&mut self) {
        if self.length == 0 {
            return;
        }
        if !self.envelope.loop_flag {
            self.length -= 1;
        }
        if self.sweep_divider == 0 && self.sweep.enabled() && self.sweep_target < PERIOD_LIMIT {
            self.period = self.sweep_target;
            self.update_sweep_target();
        }
        if self.sweep_divider == 0 || self.sweep_reload {
            self.sweep_divider = self.sweep.period().value();
            self.sweep_reload = false;
        } else {
            self.sweep_divider -= 1;
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
            self.sequence_output = (DUTY_SEQUENCES[self.duty as usize] >> self.sequencer) & 1 != 0;
            self.sequencer = self.sequencer.wrapping_sub(1) & 7;
        } else {
            self.timer -= 1;
        }
        let muted = self.period < 8 || self.sweep_target >= PERIOD_LIMIT;
        self.output = if self.sequence_output && !muted {
            self.envelope.output()
        } else {
            0
        };
    }

    pub fn output(&self) -> u8 {
        self.output
    }

    fn update_sweep_target(&mut self) {
        let change = self.period >> self.sweep.shift().value();
        self.sweep_target = if self.sweep.negate() {
            match self.id {
                PulseId::Pulse1 => self.period.wrapping_sub(change).wrapping_sub(1),
                PulseId::Pulse2 => self.period.wrapping_sub(change),
            }
        } else {
            self.period.wrapping_add(change)
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pulse_with_period(id: PulseId, period: u16, sweep: u8) -> Pulse {
        let mut pulse = Pulse::new(id);
        pulse.enabled = true;
        pulse.write(1, sweep);
        pulse.write(2, period as u8);
        pulse.write(3, (period >> 8) as u8);
        pulse
    }

    #[test]
    fn test_sweep_negation() {
        // Negate with shift 1
        let pulse1 = pulse_with_period(PulseId::Pulse1, 0x100, 0x89);
        assert_eq!(pulse1.sweep_target, 0x100 - 0x80 - 1);
        let pulse2 = pulse_with_period(PulseId::Pulse2, 0x100, 0x89);
        assert_eq!(pulse2.sweep_target, 0x100 - 0x80);
        // Increase with shift 1
        let pulse2 = pulse_with_period(PulseId::Pulse2, 0x100, 0x81);
        assert_eq!(pulse2.sweep_target, 0x180);
    }

    #[test]
    fn test_sweep_updates_period() {
        // Enabled, divider period 1, shift 1
        let mut pulse = pulse_with_period(PulseId::Pulse2, 0x100, 0x91);
        pulse.half_frame();
        assert_eq!(pulse.period, 0x180);
        pulse.half_frame();
        assert_eq!(pulse.period, 0x180);
        pulse.half_frame();
        assert_eq!(pulse.period, 0x240);
        assert_eq!(pulse.sweep_target, 0x360);
    }

    #[test]
    fn test_sweep_overflow_mutes() {
        let mut pulse = pulse_with_period(PulseId::Pulse1, 0x600, 0x01);
        pulse.write(0, 0x9F);
        for _ in 0..16 {
            pulse.clock_timer();
            assert_eq!(pulse.output(), 0);
        }
    }

    #[test]
    fn test_duty_output() {
        // Duty 2 (50%), constant volume 9, period 8
        let mut pulse = pulse_with_period(PulseId::Pulse1, 8, 0x00);
        pulse.write(0, 0xB9);
        let mut outputs = Vec::new();
        for _ in 0..8 {
            pulse.timer = 0;
            pulse.clock_timer();
            outputs.push(pulse.output());
        }
        assert_eq!(outputs, vec![0, 9, 9, 9, 9, 0, 0, 0]);
    }
}
