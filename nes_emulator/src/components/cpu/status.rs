//! Type for status register and boilerplate for conversion and display
use std::str::FromStr;

use anyhow::bail;
use packed_struct::prelude::*;

/// The P register.
///
/// Bit 5 is not backed by a flip-flop and always reads as 1. The break flag only exists on the
/// stack: it is set in the byte pushed by BRK and PHP and ignored by PLP and RTI.
#[derive(PackedStruct, Clone, Debug, Copy, PartialEq, Eq)]
#[packed_struct(bit_numbering = "msb0")]
pub struct StatusFlags {
    pub negative: bool,
    pub overflow: bool,
    pub unused: bool,
    pub break_flag: bool,
    pub decimal: bool,
    pub irq_disable: bool,
    pub zero: bool,
    pub carry: bool,
}

impl StatusFlags {
    pub fn format_string(&self) -> String {
        let mut parts: Vec<char> = Vec::with_capacity(8);
        parts.push(if self.negative { 'N' } else { '.' });
        parts.push(if self.overflow { 'V' } else { '.' });
        parts.push(if self.unused { '1' } else { '.' });
        parts.push(if self.break_flag { 'B' } else { '.' });
        parts.push(if self.decimal { 'D' } else { '.' });
        parts.push(if self.irq_disable { 'I' } else { '.' });
        parts.push(if self.zero { 'Z' } else { '.' });
        parts.push(if self.carry { 'C' } else { '.' });
        parts.into_iter().collect()
    }

    /// Status as loaded from the stack by PLP and RTI.
    pub fn from_stack(value: u8) -> Self {
        Self {
            unused: true,
            break_flag: false,
            ..Self::from(value)
        }
    }

    /// Status as pushed to the stack, `software` selects the state of the break flag.
    pub fn to_stack(self, software: bool) -> u8 {
        u8::from(Self {
            unused: true,
            break_flag: software,
            ..self
        })
    }
}

impl Default for StatusFlags {
    fn default() -> Self {
        Self {
            negative: false,
            overflow: false,
            unused: true,
            break_flag: false,
            decimal: false,
            irq_disable: true,
            zero: false,
            carry: false,
        }
    }
}

// Shorthand to convert StatusFlags into and from u8 reqister value
impl From<u8> for StatusFlags {
    fn from(value: u8) -> Self {
        match StatusFlags::unpack(&[value]) {
            Ok(flags) => flags,
            Err(_) => unreachable!("every bit pattern is a valid status"),
        }
    }
}

impl From<StatusFlags> for u8 {
    fn from(value: StatusFlags) -> Self {
        match value.pack() {
            Ok(bytes) => bytes[0],
            Err(_) => unreachable!("status flags always pack into one byte"),
        }
    }
}

impl FromStr for StatusFlags {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 8 {
            bail!("StatusFlags string must be 8 characters long");
        }
        Ok(StatusFlags {
            negative: chars[0] != '.',
            overflow: chars[1] != '.',
            unused: chars[2] != '.',
            break_flag: chars[3] != '.',
            decimal: chars[4] != '.',
            irq_disable: chars[5] != '.',
            zero: chars[6] != '.',
            carry: chars[7] != '.',
        })
    }
}
