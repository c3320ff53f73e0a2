use packed_struct::prelude::*;

/// Standard controller button state, in the order the buttons are shifted out of $4016/$4017:
/// 7  bit  0
/// ---- ----
/// ABsS UDLR
/// |||| ||||
/// |||| ++++- D-pad
/// ||++------ Select (s) and Start (S)
/// ++-------- A/B buttons
#[derive(PackedStruct, Clone, Default, Debug, Copy, PartialEq, Eq)]
#[packed_struct(bit_numbering = "msb0")]
pub struct StandardController {
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl StandardController {
    /// Value loaded into the controller shift register when the strobe is released.
    pub fn to_u8(&self) -> u8 {
        self.pack().map(u8::from_be_bytes).unwrap_or_default()
    }

    pub fn from_u8(value: u8) -> Self {
        Self::unpack(&[value]).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    pub fn test_latch_order() {
        let controller = StandardController {
            a: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(controller.to_u8(), 0x81);

        let controller = StandardController {
            select: true,
            up: true,
            ..Default::default()
        };
        assert_eq!(controller.to_u8(), 0x28);
        assert_eq!(StandardController::from_u8(0x28), controller);
    }
}
