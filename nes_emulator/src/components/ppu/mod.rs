//! Implementation of the 2C02 Picture Processing Unit
//!
//! The PPU is advanced one dot at a time. Like the CPU it does not own a bus, it communicates
//! through two side channels that are serviced by the owner:
//!
//! - The register channel (`reg_rw_mode`, `reg_addr`, `reg_data`) carries CPU accesses to
//!   $2000-$2007. The access is applied during the next step and read results are available in
//!   `reg_data` afterwards.
//! - The VRAM channel (`vram_address`, `vram_data`, `vram_read`, `vram_write`) carries accesses
//!   to pattern tables and nametables. The owner completes the request before the next step.
//!
//! Palette RAM and OAM are internal to the PPU.
mod registers;

use bilge::prelude::*;
use log::trace;

use self::registers::Control;
use self::registers::Mask;
use self::registers::SpriteAttributes;
use self::registers::Status;
use self::registers::VramAddress;
use crate::common::bus::RwMode;

pub const DOTS_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VISIBLE_SCANLINES: u16 = 240;
pub const VBLANK_SCANLINE: u16 = 241;
pub const PRE_RENDER_SCANLINE: u16 = 261;

/// Palette index output while not rendering.
pub const COLOR_BLACK: u8 = 15;

const POWER_UP_PALETTE: [u8; 32] = [
    0x09, 0x01, 0x00, 0x01, 0x00, 0x02, 0x02, 0x0D, 0x08, 0x10, 0x08, 0x24, 0x00, 0x00, 0x04, 0x2C,
    0x09, 0x01, 0x34, 0x03, 0x00, 0x04, 0x00, 0x14, 0x08, 0x3A, 0x00, 0x02, 0x00, 0x20, 0x2C, 0x08,
];

/// Color emphasis bits of PPUMASK, applied by the video output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Emphasis {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

/// One of the 8 sprites loaded for the current scanline.
#[derive(Clone, Copy, Default)]
struct SpriteSlot {
    attributes: SpriteAttributes,
    x: u8,
    pattern_low: u8,
    pattern_high: u8,
}

/// Progress of the sprite evaluation of the current scanline.
#[derive(Clone, Copy, Default)]
struct SpriteEvaluation {
    /// Next free slot in secondary OAM
    free_slot: u8,
    /// Number of OAM entries examined
    n: u8,
    /// Byte index within the entry being read. Incremented incorrectly once secondary OAM is
    /// full, which causes the sprite overflow flag to be evaluated on the wrong bytes.
    m: u8,
    entry: [u8; 4],
    found_sprite_zero: bool,
    /// All 64 entries have been examined, later reads are not checked.
    done: bool,
}

pub struct Ppu {
    pub dot: u16,
    pub scanline: u16,

    pub reg_rw_mode: RwMode,
    pub reg_addr: u8,
    pub reg_data: u8,

    pub vram_address: u16,
    pub vram_data: u8,
    pub vram_read: bool,
    pub vram_write: bool,

    /// Palette index of the pixel produced by the last step.
    pub color_out: u8,
    /// NMI output, vblank flag and NMI enable.
    pub vbl: bool,

    ctrl: Control,
    mask: Mask,
    status: Status,
    even_frame: bool,
    pre_vblank: bool,

    v: VramAddress,
    t: VramAddress,
    fine_x: u8,
    write_toggle: bool,
    read_buffer: u8,
    refresh_read_buffer: bool,

    tile_index: u8,
    tile_attribute: u8,
    tile_pattern_low: u8,
    bg_shift_low: u16,
    bg_shift_high: u16,
    attr_shift_low: u16,
    attr_shift_high: u16,

    oam_address: u8,
    oam: [u8; 256],
    secondary_oam: [u8; 32],
    evaluation: SpriteEvaluation,
    sprites: [SpriteSlot; 8],
    sprite_zero_on_line: bool,

    palettes: [u8; 32],
}

impl Ppu {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            dot: 0,
            scanline: VBLANK_SCANLINE,
            reg_rw_mode: RwMode::None,
            reg_addr: 0,
            reg_data: 0,
            vram_address: 0,
            vram_data: 0,
            vram_read: false,
            vram_write: false,
            color_out: COLOR_BLACK,
            vbl: false,
            ctrl: Control::default(),
            mask: Mask::default(),
            status: Status::default(),
            even_frame: false,
            pre_vblank: false,
            v: VramAddress::default(),
            t: VramAddress::default(),
            fine_x: 0,
            write_toggle: false,
            read_buffer: 0,
            refresh_read_buffer: false,
            tile_index: 0,
            tile_attribute: 0,
            tile_pattern_low: 0,
            bg_shift_low: 0,
            bg_shift_high: 0,
            attr_shift_low: 0,
            attr_shift_high: 0,
            oam_address: 0,
            oam: [0; 256],
            secondary_oam: [0; 32],
            evaluation: SpriteEvaluation::default(),
            sprites: [SpriteSlot::default(); 8],
            sprite_zero_on_line: false,
            palettes: POWER_UP_PALETTE,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// True on frames that skip the last dot of the pre-render scanline.
    pub fn odd_frame(&self) -> bool {
        !self.even_frame
    }

    pub fn emphasis(&self) -> Emphasis {
        Emphasis {
            red: self.mask.emphasize_red(),
            green: self.mask.emphasize_green(),
            blue: self.mask.emphasize_blue(),
        }
    }

    pub fn oam_address(&self) -> u8 {
        self.oam_address
    }

    /// Direct write into OAM, used by sprite DMA.
    pub fn write_oam(&mut self, index: u8, value: u8) {
        self.oam[index as usize] = value;
    }

    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }

    /// Advances the PPU by one dot.
    pub fn step(&mut self) {
        self.dot += 1;
        if self.dot >= DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline = (self.scanline + 1) % SCANLINES_PER_FRAME;
        }

        if self.vram_read || self.vram_write {
            self.complete_vram_access();
        }
        if self.reg_rw_mode != RwMode::None {
            self.apply_register_access();
            self.reg_rw_mode = RwMode::None;
        }

        if self.scanline == PRE_RENDER_SCANLINE && self.dot == 1 {
            self.status.set_vblank(false);
            self.status.set_sprite_zero_hit(false);
            self.status.set_sprite_overflow(false);
            self.even_frame = !self.even_frame;
        } else if self.rendering() {
            self.render_dot();
        } else if self.scanline == VBLANK_SCANLINE {
            match self.dot {
                0 => self.pre_vblank = true,
                1 => self.status.set_vblank(self.pre_vblank),
                _ => (),
            }
        } else if self.scanline < VISIBLE_SCANLINES {
            self.color_out = COLOR_BLACK;
        }

        self.vbl = self.status.vblank() && self.ctrl.nmi_enable();
    }

    /// True during the visible and pre-render scanlines while background or sprites are
    /// enabled.
    fn rendering(&self) -> bool {
        (self.scanline < VISIBLE_SCANLINES || self.scanline == PRE_RENDER_SCANLINE)
            && self.mask.rendering_enabled()
    }

    /// The VRAM request of the previous dot has been serviced by the owner.
    fn complete_vram_access(&mut self) {
        if !self.rendering() {
            self.vram_address = self.vram_address.wrapping_add(self.ctrl.vram_increment());
        }
        if self.refresh_read_buffer {
            self.read_buffer = self.vram_data;
            self.refresh_read_buffer = false;
        }
        self.vram_read = false;
        self.vram_write = false;
    }

    fn apply_register_access(&mut self) {
        let write = self.reg_rw_mode == RwMode::Write;
        match (self.reg_addr & 7, write) {
            (0, true) => {
                self.ctrl = Control::from(self.reg_data);
                self.t.set_nametable(self.ctrl.nametable());
            }
            (1, true) => self.mask = Mask::from(self.reg_data),
            (2, false) => {
                self.status.set_open_bus(Status::from(self.reg_data).open_bus());
                self.reg_data = u8::from(self.status);
                self.status.set_vblank(false);
                self.write_toggle = false;
                self.pre_vblank = false;
            }
            (3, true) => self.oam_address = self.reg_data,
            (3, false) => self.reg_data = self.oam_address,
            (4, true) => {
                self.oam[self.oam_address as usize] = self.reg_data;
                self.oam_address = self.oam_address.wrapping_add(1);
            }
            (4, false) => self.reg_data = self.oam[self.oam_address as usize],
            (5, true) => self.write_scroll(self.reg_data),
            (6, true) => self.write_address(self.reg_data),
            (7, _) => self.access_data(write),
            (reg, _) => {
                trace!(
                    target: "ppu",
                    "Ignored {} of PPU register {}",
                    if write { "write" } else { "read" },
                    reg
                );
            }
        }
    }

    fn write_scroll(&mut self, value: u8) {
        if self.write_toggle {
            self.t.set_coarse_y(u5::new(value >> 3));
            self.t.set_fine_y(u3::new(value & 7));
        } else {
            self.t.set_coarse_x(u5::new(value >> 3));
            self.fine_x = value & 7;
        }
        self.write_toggle = !self.write_toggle;
    }

    fn write_address(&mut self, value: u8) {
        let t = u16::from(self.t);
        if self.write_toggle {
            self.t = VramAddress::from((t & 0xFF00) | value as u16);
            self.v = self.t;
            self.vram_address = u16::from(self.t);
        } else {
            self.t = VramAddress::from((((value & 0x3F) as u16) << 8) | (t & 0x00FF));
        }
        self.write_toggle = !self.write_toggle;
    }

    /// PPUDATA access. Reads outside of the palette return the read buffer and refill it on the
    /// next dot. Palette reads are direct but still refill the buffer with the nametable byte
    /// underneath.
    fn access_data(&mut self, write: bool) {
        if (0x3F00..=0x3FFF).contains(&(self.vram_address & 0x3FFF)) {
            let index = palette_index(self.vram_address);
            if write {
                self.palettes[index] = self.reg_data & 0x3F;
                if !self.rendering() {
                    self.vram_address = self.vram_address.wrapping_add(self.ctrl.vram_increment());
                }
            } else {
                self.reg_data = self.palettes[index];
                self.vram_read = true;
                self.refresh_read_buffer = true;
            }
        } else if write {
            self.vram_data = self.reg_data;
            self.vram_write = true;
        } else {
            self.reg_data = self.read_buffer;
            self.vram_read = true;
            self.refresh_read_buffer = true;
        }

        if self.rendering() {
            self.v.increment_x();
            self.v.increment_y();
        }
    }

    fn render_dot(&mut self) {
        let dot = self.dot;
        if dot <= 257 {
            self.output_pixel();
        } else {
            self.color_out = COLOR_BLACK;
        }

        if (2..=257).contains(&dot) || (322..=337).contains(&dot) {
            self.bg_shift_low <<= 1;
            self.bg_shift_high <<= 1;
            self.attr_shift_low <<= 1;
            self.attr_shift_high <<= 1;
        }

        if (1..=256).contains(&dot) || (321..=336).contains(&dot) {
            self.fetch_background();
            if dot == 1 {
                self.evaluation = SpriteEvaluation::default();
            }
            if dot <= 256 && self.scanline < VISIBLE_SCANLINES {
                self.evaluate_sprites();
            }
            return;
        }

        if dot == 257 {
            self.v.copy_bits(self.t, VramAddress::HORIZONTAL_MASK);
        }
        if (257..=320).contains(&dot) && self.mask.show_sprites() {
            self.fetch_sprite();
        }
        if self.scanline == PRE_RENDER_SCANLINE {
            if (280..=304).contains(&dot) {
                self.v.copy_bits(self.t, VramAddress::VERTICAL_MASK);
            } else if dot == 339 && !self.even_frame {
                self.dot = 340;
            }
        }
    }

    fn output_pixel(&mut self) {
        // Pixels lag the dot counter by 2 due to the fetch pipeline.
        let x = self.dot.checked_sub(2);
        let clip = |show_left: bool| !show_left && x.map_or(true, |x| x < 8);

        let mut background = 0;
        let mut palette = 0;
        if self.mask.show_background() && !clip(self.mask.show_background_left()) {
            let shift = 15 - self.fine_x as u16;
            background = plane_bits(self.bg_shift_low, self.bg_shift_high, shift);
            if background != 0 {
                let attribute = plane_bits(self.attr_shift_low, self.attr_shift_high, shift);
                palette = (background | (attribute << 2)) as usize;
            }
        }

        if let Some(x) = x {
            if self.mask.show_sprites() && !clip(self.mask.show_sprites_left()) {
                if let Some(sprite_palette) = self.sprite_pixel(x, background != 0) {
                    palette = sprite_palette;
                }
            }
        }

        let mut color = self.palettes[palette_index(palette as u16)];
        if self.mask.greyscale() {
            color &= 0x30;
        }
        self.color_out = color;
    }

    /// Returns the palette entry of the first opaque sprite pixel at `x`, unless that sprite is
    /// behind an opaque background pixel. Also detects sprite zero hits.
    fn sprite_pixel(&mut self, x: u16, background_opaque: bool) -> Option<usize> {
        for (index, sprite) in self.sprites.iter().enumerate() {
            let offset = x.wrapping_sub(sprite.x as u16);
            if offset >= 8 {
                continue;
            }
            let shift = 7 - offset;
            let pattern =
                plane_bits(sprite.pattern_low as u16, sprite.pattern_high as u16, shift);
            if pattern == 0 {
                continue;
            }
            if index == 0 && self.sprite_zero_on_line && background_opaque && x != 255 {
                self.status.set_sprite_zero_hit(true);
            }
            if background_opaque && sprite.attributes.behind_background() {
                return None;
            }
            let palette = sprite.attributes.palette().value() as usize;
            return Some(0x10 | palette << 2 | pattern as usize);
        }
        None
    }

    /// Background fetch pipeline. Each tile takes 8 dots: nametable, attribute, pattern low and
    /// pattern high, each fetch taking 2 dots.
    fn fetch_background(&mut self) {
        match self.dot & 7 {
            1 => {
                self.bg_shift_low |= self.tile_pattern_low as u16;
                self.bg_shift_high |= self.vram_data as u16;
                self.attr_shift_low |= if self.tile_attribute & 1 != 0 { 0xFF } else { 0 };
                self.attr_shift_high |= if self.tile_attribute & 2 != 0 { 0xFF } else { 0 };
                self.request_vram_read(self.v.tile_address());
            }
            2 => self.tile_index = self.vram_data,
            3 => self.request_vram_read(self.v.attribute_address()),
            4 => {
                let mut attribute = self.vram_data;
                if self.v.coarse_y().value() & 2 != 0 {
                    attribute >>= 4;
                }
                if self.v.coarse_x().value() & 2 != 0 {
                    attribute >>= 2;
                }
                self.tile_attribute = attribute & 3;
            }
            5 => self.request_vram_read(self.background_pattern_address()),
            6 => self.tile_pattern_low = self.vram_data,
            7 => self.request_vram_read(self.background_pattern_address() | 8),
            _ => {
                self.v.increment_x();
                if self.dot == 256 {
                    self.v.increment_y();
                }
            }
        }
    }

    fn background_pattern_address(&self) -> u16 {
        ((self.ctrl.background_table() as u16) << 12)
            | ((self.tile_index as u16) << 4)
            | self.v.fine_y().value() as u16
    }

    /// Sprite evaluation for the next scanline during dots 1-256. Secondary OAM is cleared
    /// during dots 1-64, then OAM entries are read on odd dots and checked on even dots.
    fn evaluate_sprites(&mut self) {
        let dot = self.dot;
        if dot < 65 {
            self.secondary_oam[((dot - 1) >> 1) as usize] = 0xFF;
            return;
        }

        let evaluation = &mut self.evaluation;
        if dot & 1 == 1 {
            for _ in 0..4 {
                evaluation.entry[(evaluation.m & 3) as usize] = self.oam[self.oam_address as usize];
                evaluation.m = evaluation.m.wrapping_add(1);
                self.oam_address = self.oam_address.wrapping_add(1);
            }
            return;
        }

        if !evaluation.done {
            let has_free_slot = evaluation.free_slot < 8;
            let y = evaluation.entry[0] as u16;
            if has_free_slot {
                self.secondary_oam[evaluation.free_slot as usize * 4] = evaluation.entry[0];
            }
            if self.scanline >= y && self.scanline < y + self.ctrl.sprite_height() {
                if has_free_slot {
                    if self.oam_address == 4 {
                        evaluation.found_sprite_zero = true;
                    }
                    let slot = evaluation.free_slot as usize * 4;
                    self.secondary_oam[slot..slot + 4].copy_from_slice(&evaluation.entry);
                    evaluation.free_slot += 1;
                } else {
                    self.status.set_sprite_overflow(true);
                }
            } else if !has_free_slot {
                evaluation.m = evaluation.m.wrapping_add(1);
            }
        }
        evaluation.n = (evaluation.n + 1) & 0x3F;
        evaluation.done |= evaluation.n == 0;
    }

    /// Sprite fetches for the next scanline during dots 257-320, 8 dots per slot.
    fn fetch_sprite(&mut self) {
        let slot = ((self.dot - 257) >> 3) as usize;
        let entry: [u8; 4] = [
            self.secondary_oam[slot * 4],
            self.secondary_oam[slot * 4 + 1],
            self.secondary_oam[slot * 4 + 2],
            self.secondary_oam[slot * 4 + 3],
        ];
        let attributes = SpriteAttributes::from(entry[2]);
        self.oam_address = 0;
        self.sprite_zero_on_line = self.evaluation.found_sprite_zero;

        match self.dot & 7 {
            1 => self.sprites[slot].attributes = attributes,
            2 => self.sprites[slot].x = entry[3],
            5 => self.request_vram_read(self.sprite_pattern_address(entry)),
            6 => {
                self.sprites[slot].pattern_low = if attributes.flip_x() {
                    self.vram_data.reverse_bits()
                } else {
                    self.vram_data
                };
            }
            7 => self.request_vram_read(self.sprite_pattern_address(entry) + 8),
            0 => {
                self.sprites[slot].pattern_high = if attributes.flip_x() {
                    self.vram_data.reverse_bits()
                } else {
                    self.vram_data
                };
                if slot >= self.evaluation.free_slot as usize {
                    self.sprites[slot].pattern_low = 0;
                    self.sprites[slot].pattern_high = 0;
                }
            }
            _ => (),
        }
    }

    /// Address of the low pattern plane of the row of `entry` on the current scanline. 8x16
    /// sprites select their table with bit 0 of the tile index and continue into the next tile
    /// for rows 8-15.
    fn sprite_pattern_address(&self, entry: [u8; 4]) -> u16 {
        let height = self.ctrl.sprite_height();
        let (table, tile) = if self.ctrl.tall_sprites() {
            ((entry[1] & 1) as u16, (entry[1] & !1) as u16)
        } else {
            (self.ctrl.sprite_table() as u16, entry[1] as u16)
        };
        let mut row = self.scanline.wrapping_sub(entry[0] as u16) & (height - 1);
        if SpriteAttributes::from(entry[2]).flip_y() {
            row = height - 1 - row;
        }
        row += row & 8;
        (table << 12) | (tile << 4) | row
    }

    fn request_vram_read(&mut self, address: u16) {
        self.vram_address = address;
        self.vram_read = true;
    }
}

/// Combines bit `shift` of two bit planes into a 2 bit pixel value.
fn plane_bits(low: u16, high: u16, shift: u16) -> u16 {
    ((low >> shift) & 1) | (((high >> shift) & 1) << 1)
}

/// Maps a palette address to an index into palette RAM. The backdrop entries of the sprite
/// palettes ($3F10/$3F14/$3F18/$3F1C) mirror those of the background palettes.
fn palette_index(address: u16) -> usize {
    let index = (address & 0x1F) as usize;
    if index & 0x13 == 0x10 {
        index & !0x10
    } else {
        index
    }
}
