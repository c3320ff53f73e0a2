//! Cartridge images in the iNES format and the boards used to access them.
mod ines;
mod mapper;
mod mmc1;

use std::path::Path;

use anyhow::bail;
use anyhow::ensure;
use anyhow::Context;
use anyhow::Result;
use log::info;

pub use self::ines::InesHeader;
use self::ines::CHR_BANK_SIZE;
use self::mapper::Mapper;
pub use self::mapper::Mirroring;

const PRG_RAM_SIZE: usize = 0x2000;

/// A cartridge owns its PRG ROM, CHR ROM (or CHR RAM) and an 8 KB PRG RAM at $6000-$7FFF.
/// Bank switching is delegated to the mapper selected by the header.
#[derive(Clone, Debug)]
pub struct Cartridge {
    pub header: InesHeader,
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    mapper: Mapper,
}

impl Cartridge {
    pub fn with_ines_data(data: &[u8]) -> Result<Cartridge> {
        let header = InesHeader::parse(data)?;
        ensure!(
            data.len() >= header.image_size(),
            "ROM image truncated. Expected {} bytes, got {} bytes",
            header.image_size(),
            data.len()
        );
        let prg_start = header.prg_rom_offset();
        let chr_start = prg_start + header.prg_rom_size;
        let prg_rom = data[prg_start..chr_start].to_vec();
        let chr_rom = data[chr_start..(chr_start + header.chr_rom_size)].to_vec();
        Ok(Self::new(header, prg_rom, chr_rom))
    }

    pub fn with_ines_file(path: &Path) -> Result<Cartridge> {
        if path.extension().and_then(|ext| ext.to_str()) != Some("nes") {
            bail!("Unknown ROM format: {}", path.display());
        }
        let data =
            std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
        Self::with_ines_data(&data).with_context(|| format!("Cannot load {}", path.display()))
    }

    /// Creates a cartridge from already split ROM images. An empty `chr_rom` gives the board
    /// 8 KB of CHR RAM.
    pub fn new(header: InesHeader, prg_rom: Vec<u8>, chr_rom: Vec<u8>) -> Cartridge {
        let chr_is_ram = chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0; CHR_BANK_SIZE]
        } else {
            chr_rom
        };
        let prg_rom = if prg_rom.is_empty() {
            vec![0; ines::PRG_BANK_SIZE]
        } else {
            prg_rom
        };
        let mapper = Mapper::new(header.mapper_id, prg_rom.len(), chr.len(), header.mirroring);
        info!(
            "Cartridge: mapper {} ({}), {} KB PRG, {} KB CHR {}, {} mirroring",
            header.mapper_id,
            mapper,
            prg_rom.len() / 1024,
            chr.len() / 1024,
            if chr_is_ram { "RAM" } else { "ROM" },
            header.mirroring
        );
        Self {
            header,
            prg_rom,
            chr,
            chr_is_ram,
            prg_ram: vec![0; PRG_RAM_SIZE],
            mapper,
        }
    }

    /// NROM cartridge with the given PRG image, CHR RAM and vertical mirroring. Mostly used to
    /// run small test programs.
    pub fn with_program(prg_rom: &[u8]) -> Cartridge {
        let header = InesHeader {
            mapper_id: 0,
            prg_rom_size: prg_rom.len(),
            chr_rom_size: 0,
            mirroring: Mirroring::Vertical,
            battery: false,
            trainer: false,
        };
        Self::new(header, prg_rom.to_vec(), Vec::new())
    }

    /// CPU read of $6000-$FFFF. Disabled PRG RAM reads as open bus (0).
    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF if self.mapper.prg_ram_enabled() => {
                self.prg_ram[(addr & 0x1FFF) as usize]
            }
            0x8000..=0xFFFF => self.prg_rom[self.mapper.prg_offset(addr) % self.prg_rom.len()],
            _ => 0,
        }
    }

    /// CPU write to $6000-$FFFF. `cycle` is the CPU cycle counter, some boards react to the
    /// timing of writes.
    pub fn write(&mut self, addr: u16, value: u8, cycle: u64) {
        match addr {
            0x6000..=0x7FFF if self.mapper.prg_ram_enabled() => {
                self.prg_ram[(addr & 0x1FFF) as usize] = value
            }
            0x8000..=0xFFFF => self.mapper.write(addr, value, cycle, &self.prg_rom),
            _ => {}
        }
    }

    /// PPU read of the pattern tables at $0000-$1FFF.
    pub fn read_chr(&self, addr: u16) -> u8 {
        self.chr[self.mapper.chr_offset(addr) % self.chr.len()]
    }

    /// PPU write to the pattern tables. Only boards with CHR RAM accept writes.
    pub fn write_chr(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            let offset = self.mapper.chr_offset(addr) % self.chr.len();
            self.chr[offset] = value;
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring(self.header.mirroring)
    }

    pub fn prg_ram(&self) -> &[u8] {
        &self.prg_ram
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::with_program(&[])
    }
}
