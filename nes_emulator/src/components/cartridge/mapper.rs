//! Bank switching logic of the supported cartridge boards.
//!
//! Mappers do not own any memory. They translate CPU and PPU addresses into offsets of the
//! PRG and CHR arrays owned by the cartridge.
use log::warn;

use super::ines::CHR_BANK_SIZE;
use super::ines::PRG_BANK_SIZE;
use super::mmc1::Mmc1;

/// Arrangement of the 2 KB of nametable RAM in the 4 KB nametable address space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
pub enum Mirroring {
    /// All nametables map to the first 1 KB.
    SingleLow,
    /// All nametables map to the second 1 KB.
    SingleHigh,
    /// $2000 and $2800 share memory, used by horizontally scrolling games.
    #[default]
    Vertical,
    /// $2000 and $2400 share memory, used by vertically scrolling games.
    Horizontal,
}

impl Mirroring {
    /// Mirroring as selected by the two low bits of the MMC1 control register.
    pub fn from_mmc1_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Mirroring::SingleLow,
            1 => Mirroring::SingleHigh,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }

    /// Maps an offset into the nametable address space ($2000-$2FFF minus $2000) onto
    /// an offset in the 2 KB of nametable RAM.
    pub fn nametable_offset(self, offset: u16) -> usize {
        let offset = offset & 0x0FFF;
        let mapped = match self {
            Mirroring::Vertical => offset & 0x07FF,
            Mirroring::Horizontal => ((offset >> 1) & 0x0400) | (offset & 0x03FF),
            Mirroring::SingleLow => offset & 0x03FF,
            Mirroring::SingleHigh => 0x0400 | (offset & 0x03FF),
        };
        mapped as usize
    }
}

/// The board used by a cartridge, selected once from the iNES mapper number.
#[derive(Clone, Debug, strum::Display)]
pub enum Mapper {
    Nrom(Nrom),
    Uxrom(Uxrom),
    Cnrom(Cnrom),
    Mmc1(Mmc1),
}

impl Mapper {
    pub fn new(mapper_id: u8, prg_rom_size: usize, chr_size: usize, mirroring: Mirroring) -> Self {
        match mapper_id {
            0 => Mapper::Nrom(Nrom::new(prg_rom_size)),
            1 => Mapper::Mmc1(Mmc1::new(prg_rom_size, chr_size, mirroring)),
            2 => Mapper::Uxrom(Uxrom::new(prg_rom_size)),
            3 => Mapper::Cnrom(Cnrom::new(prg_rom_size)),
            other => {
                warn!("Unsupported mapper {other}, falling back to NROM");
                Mapper::Nrom(Nrom::new(prg_rom_size))
            }
        }
    }

    /// Offset into PRG ROM for a CPU address in $8000-$FFFF.
    pub fn prg_offset(&self, addr: u16) -> usize {
        match self {
            Mapper::Nrom(nrom) => nrom.prg_offset(addr),
            Mapper::Uxrom(uxrom) => uxrom.prg_offset(addr),
            Mapper::Cnrom(cnrom) => cnrom.nrom.prg_offset(addr),
            Mapper::Mmc1(mmc1) => mmc1.prg_offset(addr),
        }
    }

    /// Offset into CHR ROM/RAM for a PPU address in $0000-$1FFF.
    pub fn chr_offset(&self, addr: u16) -> usize {
        let addr = (addr & 0x1FFF) as usize;
        match self {
            Mapper::Nrom(_) | Mapper::Uxrom(_) => addr,
            Mapper::Cnrom(cnrom) => cnrom.chr_bank_offset + addr,
            Mapper::Mmc1(mmc1) => mmc1.chr_offset(addr),
        }
    }

    /// Handles a CPU write to $8000-$FFFF. `prg_rom` is needed to model bus conflicts.
    pub fn write(&mut self, addr: u16, value: u8, cycle: u64, prg_rom: &[u8]) {
        match self {
            Mapper::Nrom(_) => {}
            Mapper::Uxrom(uxrom) => {
                let rom_value = prg_rom[uxrom.prg_offset(addr) % prg_rom.len()];
                uxrom.write(value, rom_value);
            }
            Mapper::Cnrom(cnrom) => cnrom.write(value),
            Mapper::Mmc1(mmc1) => mmc1.write(addr, value, cycle),
        }
    }

    /// False while the board disconnects its PRG RAM at $6000-$7FFF.
    pub fn prg_ram_enabled(&self) -> bool {
        match self {
            Mapper::Mmc1(mmc1) => mmc1.prg_ram_enabled(),
            _ => true,
        }
    }

    /// Current nametable mirroring, `fixed` is the arrangement hardwired on the board.
    pub fn mirroring(&self, fixed: Mirroring) -> Mirroring {
        match self {
            Mapper::Mmc1(mmc1) => mmc1.mirroring(),
            _ => fixed,
        }
    }
}

/// Board without bank switching. 16 KB images are mirrored into $C000-$FFFF.
#[derive(Clone, Debug)]
pub struct Nrom {
    prg_mask: u16,
}

impl Nrom {
    pub fn new(prg_rom_size: usize) -> Self {
        Self {
            prg_mask: if prg_rom_size > PRG_BANK_SIZE {
                0x7FFF
            } else {
                0x3FFF
            },
        }
    }

    fn prg_offset(&self, addr: u16) -> usize {
        (addr & self.prg_mask) as usize
    }
}

/// UxROM: a switchable 16 KB bank at $8000 and the last bank fixed at $C000.
#[derive(Clone, Debug)]
pub struct Uxrom {
    bank_offset: usize,
    fixed_bank_offset: usize,
    bank_mask: u8,
}

impl Uxrom {
    pub fn new(prg_rom_size: usize) -> Self {
        let banks = (prg_rom_size / PRG_BANK_SIZE).max(1);
        let fixed_bank_offset = (banks - 1) * PRG_BANK_SIZE;
        Self {
            bank_offset: fixed_bank_offset,
            fixed_bank_offset,
            bank_mask: if banks < 16 { 0x07 } else { 0x0F },
        }
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let offset = (addr & 0x3FFF) as usize;
        if addr >= 0xC000 {
            self.fixed_bank_offset + offset
        } else {
            self.bank_offset + offset
        }
    }

    /// The CPU and ROM drive the data bus at the same time. The bank is only latched when both
    /// agree on the value.
    fn write(&mut self, value: u8, rom_value: u8) {
        if value == rom_value {
            self.bank_offset = (value & self.bank_mask) as usize * PRG_BANK_SIZE;
        }
    }
}

/// CNROM: fixed PRG like NROM and a switchable 8 KB CHR bank.
#[derive(Clone, Debug)]
pub struct Cnrom {
    nrom: Nrom,
    chr_bank_offset: usize,
}

impl Cnrom {
    pub fn new(prg_rom_size: usize) -> Self {
        Self {
            nrom: Nrom::new(prg_rom_size),
            chr_bank_offset: 0,
        }
    }

    fn write(&mut self, value: u8) {
        self.chr_bank_offset = (value & 0x03) as usize * CHR_BANK_SIZE;
    }
}
