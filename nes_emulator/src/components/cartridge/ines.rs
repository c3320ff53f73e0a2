//! Parsing of the 16 byte iNES header.
use anyhow::bail;
use anyhow::ensure;
use anyhow::Result;
use intbits::Bits;
use packed_struct::prelude::*;

use super::mapper::Mirroring;

pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_BANK_SIZE: usize = 0x4000;
pub const CHR_BANK_SIZE: usize = 0x2000;

const MAGIC: [u8; 4] = *b"NES\x1A";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InesHeader {
    pub mapper_id: u8,
    pub prg_rom_size: usize,
    pub chr_rom_size: usize,
    pub mirroring: Mirroring,
    pub battery: bool,
    pub trainer: bool,
}

impl InesHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        ensure!(data.len() >= HEADER_SIZE, "Header too short");
        let raw = RawInesHeader::unpack_from_slice(&data[0..HEADER_SIZE])?;
        if raw.magic != MAGIC {
            bail!("Invalid iNES magic: {:02X?}", raw.magic);
        }
        ensure!(raw.prg_rom_banks > 0, "ROM does not contain any PRG banks");

        Ok(InesHeader {
            mapper_id: (raw.flags7.bits(4..8) << 4) | raw.flags6.bits(4..8),
            prg_rom_size: raw.prg_rom_banks as usize * PRG_BANK_SIZE,
            chr_rom_size: raw.chr_rom_banks as usize * CHR_BANK_SIZE,
            mirroring: if raw.flags6.bit(0) {
                Mirroring::Vertical
            } else {
                Mirroring::Horizontal
            },
            battery: raw.flags6.bit(1),
            trainer: raw.flags6.bit(2),
        })
    }

    /// Offset of the first PRG ROM byte in the image.
    pub fn prg_rom_offset(&self) -> usize {
        if self.trainer {
            HEADER_SIZE + TRAINER_SIZE
        } else {
            HEADER_SIZE
        }
    }

    /// Total size of the image described by this header.
    pub fn image_size(&self) -> usize {
        self.prg_rom_offset() + self.prg_rom_size + self.chr_rom_size
    }
}

///   Byte   Contents
///   0-3    Constant $4E $45 $53 $1A ("NES" followed by MS-DOS end-of-file)
///   4      Size of PRG ROM in 16 KB units
///   5      Size of CHR ROM in 8 KB units (0 means the board uses CHR RAM)
///   6      Flags 6: NNNN FTBM
///               |||| |||+- Nametable mirroring: 0 horizontal, 1 vertical
///               |||| ||+-- Battery backed PRG RAM
///               |||| |+--- 512 byte trainer before PRG data
///               |||| +---- Four screen VRAM (not supported)
///               ++++------ Lower nibble of mapper number
///   7      Flags 7: NNNN xxxx, upper nibble of mapper number
///   8-15   Unused padding
#[derive(PackedStruct, Clone, Debug, Default, PartialEq, Eq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb")]
struct RawInesHeader {
    magic: [u8; 4],
    prg_rom_banks: u8,
    chr_rom_banks: u8,
    flags6: u8,
    flags7: u8,
    padding: [u8; 8],
}
