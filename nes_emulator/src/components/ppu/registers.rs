//! Bit layouts of the PPU registers and of the internal VRAM address.
use bilge::prelude::*;

/// PPUCTRL ($2000)
#[bitsize(8)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
pub struct Control {
    pub nametable: u2,
    pub increment_32: bool,
    pub sprite_table: bool,
    pub background_table: bool,
    pub tall_sprites: bool,
    pub master_slave: bool,
    pub nmi_enable: bool,
}

impl Control {
    pub fn vram_increment(&self) -> u16 {
        if self.increment_32() {
            32
        } else {
            1
        }
    }

    pub fn sprite_height(&self) -> u16 {
        if self.tall_sprites() {
            16
        } else {
            8
        }
    }
}

/// PPUMASK ($2001)
#[bitsize(8)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
pub struct Mask {
    pub greyscale: bool,
    pub show_background_left: bool,
    pub show_sprites_left: bool,
    pub show_background: bool,
    pub show_sprites: bool,
    pub emphasize_red: bool,
    pub emphasize_green: bool,
    pub emphasize_blue: bool,
}

impl Mask {
    pub fn rendering_enabled(&self) -> bool {
        self.show_background() || self.show_sprites()
    }
}

/// PPUSTATUS ($2002). The low bits are not driven by the PPU and return stale bus contents.
#[bitsize(8)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
pub struct Status {
    pub open_bus: u5,
    pub sprite_overflow: bool,
    pub sprite_zero_hit: bool,
    pub vblank: bool,
}

/// The internal `v` and `t` registers.
///
/// ```text
/// yyy NN YYYYY XXXXX
/// ||| || ||||| +++++-- coarse X scroll
/// ||| || +++++-------- coarse Y scroll
/// ||| ++-------------- nametable select
/// +++----------------- fine Y scroll
/// ```
#[bitsize(16)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
pub struct VramAddress {
    pub coarse_x: u5,
    pub coarse_y: u5,
    pub nametable: u2,
    pub fine_y: u3,
    pub unused: bool,
}

impl VramAddress {
    /// Bits copied from `t` at dot 257: coarse X and the horizontal nametable bit.
    pub const HORIZONTAL_MASK: u16 = 0x041F;
    /// Bits copied from `t` during the pre-render line.
    pub const VERTICAL_MASK: u16 = 0x7BE0;

    pub fn increment_x(&mut self) {
        if self.coarse_x().value() == 31 {
            self.set_coarse_x(u5::new(0));
            self.set_nametable(u2::new(self.nametable().value() ^ 1));
        } else {
            self.set_coarse_x(u5::new(self.coarse_x().value() + 1));
        }
    }

    /// Moves to the next pixel row. Coarse Y wraps at 30 into the next nametable; values 30
    /// and 31 (attribute table rows) wrap to 0 without switching.
    pub fn increment_y(&mut self) {
        let fine_y = self.fine_y().value();
        if fine_y < 7 {
            self.set_fine_y(u3::new(fine_y + 1));
            return;
        }
        self.set_fine_y(u3::new(0));
        match self.coarse_y().value() {
            29 => {
                self.set_coarse_y(u5::new(0));
                self.set_nametable(u2::new(self.nametable().value() ^ 2));
            }
            31 => self.set_coarse_y(u5::new(0)),
            coarse_y => self.set_coarse_y(u5::new(coarse_y + 1)),
        }
    }

    /// Replaces the bits selected by `mask` with those of `other`.
    pub fn copy_bits(&mut self, other: VramAddress, mask: u16) {
        *self = VramAddress::from((u16::from(*self) & !mask) | (u16::from(other) & mask));
    }

    /// Address of the nametable byte of the current tile.
    pub fn tile_address(&self) -> u16 {
        0x2000 | (u16::from(*self) & 0x0FFF)
    }

    /// Address of the attribute byte covering the current tile.
    pub fn attribute_address(&self) -> u16 {
        let raw = u16::from(*self);
        0x23C0 | (raw & 0x0C00) | ((raw >> 4) & 0x38) | ((raw >> 2) & 0x07)
    }
}

/// Byte 2 of an OAM entry
#[bitsize(8)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
pub struct SpriteAttributes {
    pub palette: u2,
    pub unused: u3,
    pub behind_background: bool,
    pub flip_x: bool,
    pub flip_y: bool,
}
