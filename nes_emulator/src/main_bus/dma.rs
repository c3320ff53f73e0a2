//! Sprite DMA ($4014): copies one 256 byte page of CPU memory into OAM while the CPU is halted.
use std::fmt::Display;

use log::trace;

/// Last cycle of a transfer. Cycle 0 is the alignment cycle, cycle 1 the dummy cycle, then
/// reads and writes alternate for 512 cycles.
const LAST_CYCLE: u16 = 513;

/// Bus operation performed on one DMA cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DmaCycle {
    Idle,
    Read(u16),
    Write(u8),
}

#[derive(Clone, Debug, Default)]
pub struct OamDma {
    active: bool,
    cycle: u16,
    source: u16,
    destination: u8,
    pub data: u8,
}

impl OamDma {
    /// Starts a transfer of `page` into OAM at `oam_address`. Only a transfer started on an odd
    /// CPU cycle needs the alignment cycle, making it 514 cycles long instead of 513.
    pub fn start(&mut self, page: u8, oam_address: u8, odd_cycle: bool) {
        self.active = true;
        self.cycle = (!odd_cycle) as u16;
        self.source = (page as u16) << 8;
        self.destination = oam_address;
        trace!(target: "dma", "Start {}", self);
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// Advances the transfer by one CPU cycle and returns the bus operation to perform. For
    /// `Write`, the byte to store is `data`.
    pub fn step(&mut self) -> DmaCycle {
        let cycle = self.cycle;
        self.cycle += 1;
        match cycle {
            0 | 1 => DmaCycle::Idle,
            _ if cycle % 2 == 1 => {
                if cycle == LAST_CYCLE {
                    self.active = false;
                }
                let destination = self.destination;
                self.destination = self.destination.wrapping_add(1);
                DmaCycle::Write(destination)
            }
            _ => {
                let source = self.source;
                self.source = self.source.wrapping_add(1);
                DmaCycle::Read(source)
            }
        }
    }
}

impl Display for OamDma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04X} -> OAM[{:02X}] (cycle {})",
            self.source, self.destination, self.cycle
        )
    }
}
