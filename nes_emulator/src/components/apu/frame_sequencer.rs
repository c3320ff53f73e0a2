//! Frame sequencer ($4017), the low frequency clock of envelopes, sweeps and length counters.
use intbits::Bits;

/// Cycle numbers at which the 4-step sequence raises the frame interrupt.
const INTERRUPT_CYCLES: std::ops::RangeInclusive<u32> = 29828..=29830;

/// Signals produced by one cycle of the frame sequencer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameTick {
    pub quarter_frame: bool,
    pub half_frame: bool,
    /// Pulse and noise timers are clocked on odd APU cycles.
    pub odd_cycle: bool,
}

#[derive(Default)]
pub struct FrameSequencer {
    five_step: bool,
    inhibit_interrupt: bool,
    pub interrupt: bool,
    cycle: u32,
    /// Cycles until a write to $4017 restarts the sequence.
    reset_delay: u8,
}

impl FrameSequencer {
    pub fn write(&mut self, value: u8) {
        self.five_step = value.bit(7);
        self.inhibit_interrupt = value.bit(6);
        if self.inhibit_interrupt {
            self.interrupt = false;
        }
        self.reset_delay = if self.cycle.bit(0) { 4 } else { 3 };
    }

    /// Reading $4015 acknowledges the interrupt, unless it is being raised in this very cycle.
    pub fn acknowledge_interrupt(&mut self) {
        self.interrupt &= !self.five_step && INTERRUPT_CYCLES.contains(&self.cycle);
    }

    pub fn clock(&mut self) -> FrameTick {
        let mut tick = FrameTick::default();
        if self.reset_delay > 0 {
            self.reset_delay -= 1;
            if self.reset_delay == 0 {
                self.cycle = 0;
                tick.quarter_frame = self.five_step;
                tick.half_frame = self.five_step;
            }
        }

        if self.five_step {
            match self.cycle {
                7457 | 22371 => tick.quarter_frame = true,
                14913 | 37281 => {
                    tick.quarter_frame = true;
                    tick.half_frame = true;
                }
                37282 => self.cycle = 0,
                _ => (),
            }
        } else {
            match self.cycle {
                7457 | 22371 => tick.quarter_frame = true,
                14913 => {
                    tick.quarter_frame = true;
                    tick.half_frame = true;
                }
                29828 => self.interrupt = !self.inhibit_interrupt,
                29829 => {
                    tick.quarter_frame = true;
                    tick.half_frame = true;
                    self.interrupt = !self.inhibit_interrupt;
                }
                29830 => {
                    self.interrupt = !self.inhibit_interrupt;
                    self.cycle = 0;
                }
                _ => (),
            }
        }

        tick.odd_cycle = self.cycle.bit(0);
        self.cycle += 1;
        tick
    }
}
