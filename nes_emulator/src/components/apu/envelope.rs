//! Volume envelope shared by the pulse and noise channels.

#[derive(Clone, Copy, Debug, Default)]
pub struct Envelope {
    /// Restart the decay on the next quarter frame.
    pub start: bool,
    /// Restart the decay at 15 after reaching 0. Shares its bit with the length counter halt.
    pub loop_flag: bool,
    pub constant_volume: bool,
    /// Constant volume, or the divider period of the decay.
    pub volume: u8,
    divider: u8,
    decay: u8,
}

impl Envelope {
    pub fn write_control(&mut self, loop_flag: bool, constant_volume: bool, volume: u8) {
        self.loop_flag = loop_flag;
        self.constant_volume = constant_volume;
        self.volume = volume & 0x0F;
    }

    /// Clocked by the quarter frame signal.
    pub fn clock(&mut self) {
        if self.start {
            self.start = false;
            self.decay = 15;
            self.divider = self.volume + 1;
        } else if self.divider == 0 {
            self.divider = self.volume;
            if self.decay > 0 {
                self.decay -= 1;
            } else if self.loop_flag {
                self.decay = 15;
            }
        } else {
            self.divider -= 1;
        }
    }

    pub fn output(&self) -> u8 {
        if self.constant_volume {
            self.volume
        } else {
            self.decay
        }
    }
}
