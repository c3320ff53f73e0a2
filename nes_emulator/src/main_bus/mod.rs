//! Address decoding of the CPU and PPU buses.
//!
//! The components raise bus requests as plain fields (address, data, mode). The main bus owns
//! the memories and peripherals those requests are routed to.
mod dma;

use intbits::Bits;
use log::trace;

use self::dma::DmaCycle;
pub use self::dma::OamDma;
use crate::common::bus::RwMode;
use crate::components::apu::Apu;
use crate::components::cartridge::Cartridge;
use crate::components::cpu::Cpu;
use crate::components::ppu::Ppu;
use crate::controller::StandardController;

pub const RAM_SIZE: usize = 0x800;
pub const VRAM_SIZE: usize = 0x800;

pub const OAM_DMA_REGISTER: u16 = 0x4014;
pub const CONTROLLER1_REGISTER: u16 = 0x4016;
pub const CONTROLLER2_REGISTER: u16 = 0x4017;
pub const APU_STATUS_REGISTER: u16 = 0x4015;

pub struct MainBus {
    pub ppu: Ppu,
    pub apu: Apu,
    pub cartridge: Cartridge,
    pub ram: Vec<u8>,
    pub vram: Vec<u8>,
    pub dma: OamDma,
    /// Shift registers of both controller ports. Bit 7 is the next bit read.
    pub controller_shift: [u8; 2],
    /// Set by a strobe write, the owner latches the input state of both controllers.
    pub latch_requested: bool,
    /// Parity of the current CPU cycle.
    pub odd_cycle: bool,
    /// CPU cycles since power on.
    pub cycle: u64,
}

impl MainBus {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            ppu: Ppu::new(),
            apu: Apu::new(),
            cartridge,
            ram: vec![0; RAM_SIZE],
            vram: vec![0; VRAM_SIZE],
            dma: OamDma::default(),
            controller_shift: [0, 0],
            latch_requested: false,
            odd_cycle: false,
            cycle: 0,
        }
    }

    /// Resets the PPU, APU, DMA and controllers. Memory and the cartridge are kept.
    pub fn reset(&mut self) {
        self.ppu.reset();
        self.apu.reset();
        self.dma = OamDma::default();
        self.controller_shift = [0, 0];
        self.latch_requested = false;
        self.odd_cycle = false;
    }

    /// Completes the VRAM access requested by the PPU in its last step.
    pub fn resolve_ppu_access(&mut self) {
        let addr = self.ppu.vram_address & 0x3FFF;
        if self.ppu.vram_read {
            self.ppu.vram_data = self.ppu_read(addr);
        } else if self.ppu.vram_write {
            self.ppu_write(addr, self.ppu.vram_data);
        }
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.cartridge.read_chr(addr),
            _ => self.vram[self.nametable_offset(addr)],
        }
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.cartridge.write_chr(addr, value),
            _ => {
                let offset = self.nametable_offset(addr);
                self.vram[offset] = value;
            }
        }
    }

    /// Nametables at $2000-$2FFF, mirrored at $3000-$3EFF. Palette accesses at $3F00+ are
    /// served inside the PPU, the request lands under $2F00.
    fn nametable_offset(&self, addr: u16) -> usize {
        self.cartridge.mirroring().nametable_offset(addr - 0x2000) % VRAM_SIZE
    }

    /// Completes the bus access requested by the CPU in its last step.
    pub fn resolve_cpu_access(&mut self, cpu: &mut Cpu) {
        match cpu.rw_mode {
            RwMode::Read => cpu.data = self.cpu_read(cpu.address),
            RwMode::Write => self.cpu_write(cpu.address, cpu.data),
            RwMode::None => (),
        }
    }

    /// Reads from the CPU address space. Register reads are forwarded to the PPU and APU,
    /// which provide the value on their next step.
    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[addr as usize & (RAM_SIZE - 1)],
            0x2000..=0x3FFF => {
                self.ppu.reg_rw_mode = RwMode::Read;
                self.ppu.reg_addr = (addr & 7) as u8;
                self.ppu.reg_data
            }
            APU_STATUS_REGISTER => {
                self.apu.reg_rw_mode = RwMode::Read;
                self.apu.reg_addr = addr;
                self.apu.reg_data
            }
            CONTROLLER1_REGISTER => self.read_controller(0),
            CONTROLLER2_REGISTER => self.read_controller(1),
            0x6000..=0xFFFF => self.cartridge.read(addr),
            _ => {
                trace!(target: "main_bus", "Read from open bus {:04X}", addr);
                0
            }
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[addr as usize & (RAM_SIZE - 1)] = value,
            0x2000..=0x3FFF => {
                self.ppu.reg_rw_mode = RwMode::Write;
                self.ppu.reg_addr = (addr & 7) as u8;
                self.ppu.reg_data = value;
            }
            OAM_DMA_REGISTER => self.dma.start(value, self.ppu.oam_address(), self.odd_cycle),
            CONTROLLER1_REGISTER => {
                if value.bit(0) {
                    self.controller_shift = [0, 0];
                } else {
                    self.latch_requested = true;
                }
            }
            0x4000..=0x4013 | APU_STATUS_REGISTER | CONTROLLER2_REGISTER => {
                self.apu.reg_rw_mode = RwMode::Write;
                self.apu.reg_addr = addr;
                self.apu.reg_data = value;
            }
            0x6000..=0xFFFF => self.cartridge.write(addr, value, self.cycle),
            _ => trace!(target: "main_bus", "Write to open bus {:04X}={:02X}", addr, value),
        }
    }

    /// Loads the button state of both controllers into their shift registers.
    pub fn latch_controllers(&mut self, controllers: [StandardController; 2]) {
        self.controller_shift = [controllers[0].to_u8(), controllers[1].to_u8()];
        self.latch_requested = false;
    }

    /// CPU address decoding as seen by sprite DMA. Register pages ($2000-$5FFF) read as open bus
    /// so a transfer never triggers register side effects.
    fn dma_read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[addr as usize & (RAM_SIZE - 1)],
            0x6000..=0xFFFF => self.cartridge.read(addr),
            _ => {
                trace!(target: "main_bus", "DMA read from register page {:04X}", addr);
                0
            }
        }
    }

    /// Shifts out the next button, ones are shifted in behind the last button.
    fn read_controller(&mut self, port: usize) -> u8 {
        let shift = &mut self.controller_shift[port];
        let value = *shift >> 7;
        *shift = (*shift << 1) | 1;
        value
    }

    /// Runs one cycle of sprite DMA.
    pub fn dma_step(&mut self) {
        match self.dma.step() {
            DmaCycle::Idle => (),
            DmaCycle::Read(addr) => self.dma.data = self.dma_read(addr),
            DmaCycle::Write(oam_address) => self.ppu.write_oam(oam_address, self.dma.data),
        }
    }
}
