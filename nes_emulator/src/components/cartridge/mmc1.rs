//! MMC1 (SxROM boards).
//!
//! Registers are loaded serially: each write to $8000-$FFFF shifts bit 0 of the value into a
//! 5 bit shift register. The fifth write transfers the shift register into the internal register
//! selected by address bits 13-14. A write with bit 7 set resets the shift register.
use bilge::prelude::*;
use intbits::Bits;
use log::trace;

use super::ines::PRG_BANK_SIZE;
use super::mapper::Mirroring;

const CHR_BANK_SIZE_4K: usize = 0x1000;

/// Control register ($8000-$9FFF)
///
/// 4bit0
/// -----
/// CPPMM
/// |||||
/// |||++- Mirroring (0: single low, 1: single high, 2: vertical, 3: horizontal)
/// |++--- PRG ROM bank mode (0, 1: 32 KB at $8000; 2: first bank fixed at $8000, switchable
/// |                         bank at $C000; 3: switchable bank at $8000, last bank fixed at $C000)
/// +----- CHR ROM bank mode (0: one 8 KB bank; 1: two 4 KB banks)
#[bitsize(5)]
#[derive(Clone, Copy, DebugBits, FromBits, PartialEq)]
struct Control {
    mirroring: u2,
    prg_mode: u2,
    chr_4k_mode: bool,
}

#[derive(Clone, Debug)]
pub struct Mmc1 {
    shift_register: u8,
    shift_count: u8,
    control: Control,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
    /// Bit 4 of the PRG bank register.
    prg_ram_disabled: bool,
    prg_banks: usize,
    /// CPU cycle of the last write to the serial port. MMC1 ignores the second of two writes
    /// on consecutive cycles, as issued by read-modify-write instructions.
    last_write_cycle: Option<u64>,
    prg_offsets: [usize; 2],
    chr_offsets: [usize; 2],
}

impl Mmc1 {
    pub fn new(prg_rom_size: usize, _chr_size: usize, mirroring: Mirroring) -> Self {
        let mirroring_bits = match mirroring {
            Mirroring::SingleLow => 0,
            Mirroring::SingleHigh => 1,
            Mirroring::Vertical => 2,
            Mirroring::Horizontal => 3,
        };
        let mut mmc1 = Self {
            shift_register: 0,
            shift_count: 0,
            control: Control::new(u2::new(mirroring_bits), u2::new(3), false),
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
            prg_ram_disabled: false,
            prg_banks: (prg_rom_size / PRG_BANK_SIZE).max(1),
            last_write_cycle: None,
            prg_offsets: [0; 2],
            chr_offsets: [0; 2],
        };
        mmc1.update_banks();
        mmc1
    }

    pub fn mirroring(&self) -> Mirroring {
        Mirroring::from_mmc1_bits(self.control.mirroring().value())
    }

    pub fn prg_ram_enabled(&self) -> bool {
        !self.prg_ram_disabled
    }

    pub fn prg_offset(&self, addr: u16) -> usize {
        self.prg_offsets[addr.bit(14) as usize] + (addr & 0x3FFF) as usize
    }

    pub fn chr_offset(&self, addr: usize) -> usize {
        self.chr_offsets[addr.bit(12) as usize] + (addr & 0x0FFF)
    }

    pub fn write(&mut self, addr: u16, value: u8, cycle: u64) {
        let consecutive = self
            .last_write_cycle
            .is_some_and(|last| last.wrapping_add(1) == cycle);
        self.last_write_cycle = Some(cycle);
        if consecutive {
            trace!(target: "mapper", "MMC1: ignoring consecutive write {value:02X} to {addr:04X}");
            return;
        }

        if value.bit(7) {
            self.reset_shift_register();
            self.control.set_prg_mode(u2::new(3));
            self.update_banks();
            return;
        }

        self.shift_register = (self.shift_register >> 1) | ((value & 0x01) << 4);
        self.shift_count += 1;
        if self.shift_count < 5 {
            return;
        }

        let register = self.shift_register;
        match addr.bits(13..15) {
            0 => self.control = Control::from(u5::new(register)),
            1 => self.chr_bank0 = register,
            2 => self.chr_bank1 = register,
            _ => {
                self.prg_bank = register & 0x0F;
                self.prg_ram_disabled = register.bit(4);
            }
        }
        trace!(target: "mapper", "MMC1: register {} = {register:05b}", addr.bits(13..15));
        self.reset_shift_register();
        self.update_banks();
    }

    fn reset_shift_register(&mut self) {
        self.shift_register = 0;
        self.shift_count = 0;
    }

    fn update_banks(&mut self) {
        let bank = self.prg_bank as usize;
        let last_bank = self.prg_banks - 1;
        let prg_banks = match self.control.prg_mode().value() {
            0 | 1 => [bank & !1, bank | 1],
            2 => [0, bank],
            _ => [bank, last_bank],
        };
        self.prg_offsets = prg_banks.map(|bank| (bank % self.prg_banks) * PRG_BANK_SIZE);

        let chr_banks = if self.control.chr_4k_mode() {
            [self.chr_bank0, self.chr_bank1]
        } else {
            [self.chr_bank0 & !1, self.chr_bank0 | 1]
        };
        self.chr_offsets = chr_banks.map(|bank| bank as usize * CHR_BANK_SIZE_4K);
    }
}
