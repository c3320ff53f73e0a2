//! General utility functions and types.
use itertools::Itertools;

/// A simple edge detector that can be used to detect rising and falling edges of a signal.
/// Used to turn level signals, like the PPU's vblank NMI output, into edge triggered ones.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EdgeDetector {
    pub value: bool,
    pub rise_triggered: bool,
    pub fall_triggered: bool,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self {
            value: false,
            rise_triggered: false,
            fall_triggered: false,
        }
    }

    pub fn update_signal(&mut self, value: bool) {
        if value && !self.value {
            self.rise_triggered = true;
        }
        if !value && self.value {
            self.fall_triggered = true;
        }
        self.value = value;
    }

    pub fn consume_rise(&mut self) -> bool {
        let rise_triggered = self.rise_triggered;
        self.rise_triggered = false;
        rise_triggered
    }

    pub fn consume_fall(&mut self) -> bool {
        let fall_triggered = self.fall_triggered;
        self.fall_triggered = false;
        fall_triggered
    }
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats memory as rows of 16 hex bytes. Used to produce readable diffs in tests.
pub fn format_memory(memory: &[u8]) -> String {
    memory
        .chunks(16)
        .map(|chunk| chunk.iter().map(|byte| format!("{:02X}", byte)).join(" ") + "\n")
        .collect()
}
