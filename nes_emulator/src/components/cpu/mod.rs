//! Cycle-stepped implementation of the 6502 core of the 2A03.
//!
//! The CPU does not own a bus. Each call to [Cpu::step] advances the CPU by one cycle and
//! describes the bus access of that cycle in `address`, `data` and `rw_mode`. The owner has to
//! complete the access before the next step: store `data` for writes, or place the value read
//! into `data` for reads.
//!
//! Instructions are broken down into cycles by address mode, following the bus activity
//! documented for the NMOS 6502, including dummy reads of unfixed addresses for indexed modes
//! and the double write of read-modify-write instructions.
mod instructions;
mod opcode_table;
mod status;
#[cfg(test)]
mod test;

use std::fmt::Display;

use self::opcode_table::AddressMode;
use self::opcode_table::Operation;
use self::opcode_table::OPCODE_TABLE;
pub use self::status::StatusFlags;
use crate::common::bus::RwMode;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Reason for running the BRK sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BreakSource {
    /// The BRK opcode
    Software,
    /// NMI or IRQ injected in place of the next opcode
    Interrupt,
    /// Stack writes are suppressed and the reset vector is used.
    Reset,
}

pub struct Cpu {
    pub pc: u16,
    pub s: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub status: StatusFlags,

    /// Address of the bus access requested for the current cycle.
    pub address: u16,
    /// Value to be written, or the value read in the previous cycle.
    pub data: u8,
    pub rw_mode: RwMode,

    /// NMI input, set by the owner on the falling edge of the NMI line. Cleared by the CPU when
    /// the NMI is serviced.
    pub nmi: bool,
    /// IRQ input, level triggered.
    pub irq: bool,

    /// Cycle of the current instruction, 0 is the cycle that receives the opcode.
    cycle: u8,
    opcode: u8,
    break_source: BreakSource,
    temp: u8,
    pointer: u8,
    effective_addr: u16,
    page_crossed: bool,
    /// Cycle on which the data access of a memory operand takes place.
    access_cycle: Option<u8>,
}

impl Cpu {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let mut cpu = Self {
            pc: 0,
            s: 0,
            a: 0,
            x: 0,
            y: 0,
            status: StatusFlags::default(),
            address: 0,
            data: 0,
            rw_mode: RwMode::None,
            nmi: false,
            irq: false,
            cycle: 0,
            opcode: 0,
            break_source: BreakSource::Software,
            temp: 0,
            pointer: 0,
            effective_addr: 0,
            page_crossed: false,
            access_cycle: None,
        };
        cpu.reset();
        cpu
    }

    /// Resets the CPU. The following steps run the reset sequence which loads PC from the reset
    /// vector at $FFFC.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.s = 0xFF;
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.status = StatusFlags::default();
        self.address = 0;
        self.data = 0;
        self.rw_mode = RwMode::None;
        self.nmi = false;
        self.irq = false;
        self.opcode = 0x00;
        self.cycle = 1;
        self.break_source = BreakSource::Reset;
        self.temp = 0;
        self.pointer = 0;
        self.effective_addr = 0;
        self.page_crossed = false;
        self.access_cycle = None;
    }

    /// True between instructions, i.e. when the next step will decode a new opcode.
    pub fn instruction_complete(&self) -> bool {
        self.cycle == 0
    }

    /// Opcode of the instruction currently executing.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Advances the CPU by one cycle.
    pub fn step(&mut self) {
        let cycle = self.cycle;
        self.cycle = self.cycle.wrapping_add(1);
        if cycle == 0 {
            self.opcode = match self.break_source {
                BreakSource::Software => self.data,
                _ => 0x00,
            };
            self.access_cycle = None;
        }

        let instruction = OPCODE_TABLE[self.opcode as usize];
        let done = match (instruction.operation, instruction.mode) {
            (Operation::Implied(operation), _) => self.step_implied(cycle, operation),
            (Operation::ReadModifyWrite(operation), AddressMode::Accumulator) => {
                self.step_accumulator(cycle, operation)
            }
            (Operation::Read(operation), AddressMode::Immediate) => {
                self.step_immediate(cycle, operation)
            }
            (Operation::Branch(condition), _) => self.step_branch(cycle, condition),
            (Operation::Push(value), _) => self.step_push(cycle, value),
            (Operation::Pull(operation), _) => self.step_pull(cycle, operation),
            (Operation::Jmp, AddressMode::Indirect) => self.step_jmp_indirect(cycle),
            (Operation::Jmp, _) => self.step_jmp_absolute(cycle),
            (Operation::Jsr, _) => self.step_jsr(cycle),
            (Operation::Rts, _) => self.step_rts(cycle),
            (Operation::Rti, _) => self.step_rti(cycle),
            (Operation::Brk, _) => self.step_brk(cycle),
            (operation, mode) => self.step_memory(cycle, mode, operation),
        };
        if done {
            self.complete_instruction();
        }
    }

    /// Polls the interrupt lines and fetches the next opcode. If an interrupt is pending the
    /// fetched opcode is replaced with BRK.
    fn complete_instruction(&mut self) {
        #[cfg(feature = "debug_log")]
        log::trace!(target: "cpu_state", "{}", self);

        self.cycle = 0;
        self.read(self.pc);
        if self.nmi || (self.irq && !self.status.irq_disable) {
            self.break_source = BreakSource::Interrupt;
        } else {
            self.break_source = BreakSource::Software;
            self.pc = self.pc.wrapping_add(1);
        }
    }

    fn step_implied(&mut self, cycle: u8, operation: fn(&mut Cpu)) -> bool {
        match cycle {
            0 => {
                operation(self);
                self.read(self.pc);
                false
            }
            _ => true,
        }
    }

    fn step_accumulator(&mut self, cycle: u8, operation: fn(&mut Cpu, u8) -> u8) -> bool {
        match cycle {
            0 => {
                self.a = operation(self, self.a);
                self.read(self.pc);
                false
            }
            _ => true,
        }
    }

    fn step_immediate(&mut self, cycle: u8, operation: fn(&mut Cpu, u8)) -> bool {
        match cycle {
            0 => {
                self.fetch_operand();
                false
            }
            _ => {
                operation(self, self.data);
                true
            }
        }
    }

    fn step_branch(&mut self, cycle: u8, condition: fn(&Cpu) -> bool) -> bool {
        match cycle {
            0 => self.fetch_operand(),
            1 => {
                if !condition(self) {
                    return true;
                }
                let target = self.pc.wrapping_add(self.data as i8 as u16);
                self.read(self.pc);
                self.page_crossed = (target ^ self.pc) & 0xFF00 != 0;
                self.effective_addr = target;
                self.pc = (self.pc & 0xFF00) | (target & 0x00FF);
            }
            2 if self.page_crossed => {
                self.read(self.pc);
                self.pc = self.effective_addr;
            }
            _ => return true,
        }
        false
    }

    fn step_push(&mut self, cycle: u8, value: fn(&Cpu) -> u8) -> bool {
        match cycle {
            0 => self.read(self.pc),
            1 => self.push(value(self)),
            _ => return true,
        }
        false
    }

    fn step_pull(&mut self, cycle: u8, operation: fn(&mut Cpu, u8)) -> bool {
        match cycle {
            0 => self.read(self.pc),
            1 => self.read(self.stack_addr()),
            2 => self.pull(),
            _ => {
                operation(self, self.data);
                return true;
            }
        }
        false
    }

    fn step_jmp_absolute(&mut self, cycle: u8) -> bool {
        match cycle {
            0 => self.fetch_operand(),
            1 => {
                self.temp = self.data;
                self.fetch_operand();
            }
            _ => {
                self.pc = u16::from_le_bytes([self.temp, self.data]);
                return true;
            }
        }
        false
    }

    /// JMP ($nnnn). The pointer high byte is read without carry into the page: JMP ($10FF)
    /// reads $10FF and $1000.
    fn step_jmp_indirect(&mut self, cycle: u8) -> bool {
        match cycle {
            0 => self.fetch_operand(),
            1 => {
                self.temp = self.data;
                self.fetch_operand();
            }
            2 => {
                self.effective_addr = u16::from_le_bytes([self.temp, self.data]);
                self.read(self.effective_addr);
            }
            3 => {
                self.temp = self.data;
                let pointer = self.effective_addr;
                self.read((pointer & 0xFF00) | (pointer.wrapping_add(1) & 0x00FF));
            }
            _ => {
                self.pc = u16::from_le_bytes([self.temp, self.data]);
                return true;
            }
        }
        false
    }

    fn step_jsr(&mut self, cycle: u8) -> bool {
        match cycle {
            0 => self.fetch_operand(),
            1 => {
                self.temp = self.data;
                self.read(self.stack_addr());
            }
            2 => self.push((self.pc >> 8) as u8),
            3 => self.push(self.pc as u8),
            4 => self.read(self.pc),
            _ => {
                self.pc = u16::from_le_bytes([self.temp, self.data]);
                return true;
            }
        }
        false
    }

    fn step_rts(&mut self, cycle: u8) -> bool {
        match cycle {
            0 => self.read(self.pc),
            1 => self.read(self.stack_addr()),
            2 => self.pull(),
            3 => {
                self.temp = self.data;
                self.pull();
            }
            4 => {
                self.pc = u16::from_le_bytes([self.temp, self.data]);
                self.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            _ => return true,
        }
        false
    }

    fn step_rti(&mut self, cycle: u8) -> bool {
        match cycle {
            0 => self.read(self.pc),
            1 => self.read(self.stack_addr()),
            2 => self.pull(),
            3 => {
                self.status = StatusFlags::from_stack(self.data);
                self.pull();
            }
            4 => {
                self.temp = self.data;
                self.pull();
            }
            _ => {
                self.pc = u16::from_le_bytes([self.temp, self.data]);
                return true;
            }
        }
        false
    }

    /// The 7 cycle sequence shared by BRK, NMI, IRQ and reset. The vector is selected when the
    /// status is pushed, an NMI arriving before then hijacks a BRK or IRQ.
    fn step_brk(&mut self, cycle: u8) -> bool {
        match cycle {
            0 => {
                self.read(self.pc);
                if self.break_source == BreakSource::Software {
                    self.pc = self.pc.wrapping_add(1);
                }
            }
            1 => self.push((self.pc >> 8) as u8),
            2 => self.push(self.pc as u8),
            3 => {
                self.effective_addr = match self.break_source {
                    BreakSource::Reset => RESET_VECTOR,
                    _ if self.nmi => {
                        self.nmi = false;
                        NMI_VECTOR
                    }
                    _ => IRQ_VECTOR,
                };
                let software = self.break_source == BreakSource::Software;
                self.push(self.status.to_stack(software));
                self.status.irq_disable = true;
            }
            4 => self.read(self.effective_addr),
            5 => {
                self.temp = self.data;
                self.read(self.effective_addr.wrapping_add(1));
            }
            _ => {
                self.pc = u16::from_le_bytes([self.temp, self.data]);
                return true;
            }
        }
        false
    }

    /// Instructions with a memory operand. The operand address is resolved first, then the
    /// data access runs starting at `access_cycle`.
    fn step_memory(&mut self, cycle: u8, mode: AddressMode, operation: Operation) -> bool {
        if let Some(access_cycle) = self.access_cycle {
            if cycle == access_cycle {
                self.begin_access(operation);
                return false;
            }
            return self.continue_access(operation, cycle.wrapping_sub(access_cycle));
        }

        use AddressMode::*;
        match (mode, cycle) {
            (_, 0) => self.fetch_operand(),
            (ZeroPage, _) => self.resolve(cycle, self.data as u16, operation),
            (ZeroPageX | ZeroPageY | IndexedIndirect, 1) => {
                self.pointer = self.data;
                self.read(self.pointer as u16);
            }
            (ZeroPageX, _) => {
                let address = self.pointer.wrapping_add(self.x) as u16;
                self.resolve(cycle, address, operation)
            }
            (ZeroPageY, _) => {
                let address = self.pointer.wrapping_add(self.y) as u16;
                self.resolve(cycle, address, operation)
            }
            (Absolute | AbsoluteX | AbsoluteY, 1) => {
                self.temp = self.data;
                self.fetch_operand();
            }
            (Absolute, _) => {
                let addr = u16::from_le_bytes([self.temp, self.data]);
                self.resolve(cycle, addr, operation);
            }
            (AbsoluteX, _) => {
                let base = u16::from_le_bytes([self.temp, self.data]);
                self.resolve_indexed(cycle, base, self.x, operation);
            }
            (AbsoluteY, _) => {
                let base = u16::from_le_bytes([self.temp, self.data]);
                self.resolve_indexed(cycle, base, self.y, operation);
            }
            (IndexedIndirect, 2) => {
                self.pointer = self.pointer.wrapping_add(self.x);
                self.read(self.pointer as u16);
            }
            (IndexedIndirect, 3) => {
                self.temp = self.data;
                self.read(self.pointer.wrapping_add(1) as u16);
            }
            (IndexedIndirect, _) => {
                let addr = u16::from_le_bytes([self.temp, self.data]);
                self.resolve(cycle, addr, operation);
            }
            (IndirectIndexed, 1) => {
                self.pointer = self.data;
                self.read(self.pointer as u16);
            }
            (IndirectIndexed, 2) => {
                self.temp = self.data;
                self.read(self.pointer.wrapping_add(1) as u16);
            }
            (IndirectIndexed, _) => {
                let base = u16::from_le_bytes([self.temp, self.data]);
                self.resolve_indexed(cycle, base, self.y, operation);
            }
            _ => return true,
        }
        false
    }

    /// The operand address is known, the data access happens in this cycle.
    fn resolve(&mut self, cycle: u8, addr: u16, operation: Operation) {
        self.effective_addr = addr;
        self.access_cycle = Some(cycle);
        self.begin_access(operation);
    }

    /// Indexed modes read from the address before the carry into the high byte is applied.
    /// Reads without page cross use this value, other accesses take an extra cycle.
    fn resolve_indexed(&mut self, cycle: u8, base: u16, index: u8, operation: Operation) {
        let addr = base.wrapping_add(index as u16);
        self.effective_addr = addr;
        self.page_crossed = (addr ^ base) & 0xFF00 != 0;
        self.read((base & 0xFF00) | (addr & 0x00FF));
        self.access_cycle = match operation {
            Operation::Read(_) if !self.page_crossed => Some(cycle),
            _ => Some(cycle.wrapping_add(1)),
        };
    }

    fn begin_access(&mut self, operation: Operation) {
        match operation {
            Operation::Write(value) => self.write(self.effective_addr, value(self)),
            _ => self.read(self.effective_addr),
        }
    }

    fn continue_access(&mut self, operation: Operation, phase: u8) -> bool {
        match (operation, phase) {
            (Operation::Read(operation), _) => {
                operation(self, self.data);
                true
            }
            (Operation::ReadModifyWrite(_), 1) => {
                self.temp = self.data;
                self.write(self.effective_addr, self.temp);
                false
            }
            (Operation::ReadModifyWrite(operation), 2) => {
                let result = operation(self, self.temp);
                self.write(self.effective_addr, result);
                false
            }
            _ => true,
        }
    }

    fn fetch_operand(&mut self) {
        self.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
    }

    fn read(&mut self, addr: u16) {
        self.address = addr;
        self.rw_mode = RwMode::Read;
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.address = addr;
        self.data = value;
        self.rw_mode = RwMode::Write;
    }

    fn stack_addr(&self) -> u16 {
        0x0100 | self.s as u16
    }

    /// Pushes `value`. During reset the write is suppressed but the stack pointer still moves.
    fn push(&mut self, value: u8) {
        if self.break_source == BreakSource::Reset {
            self.rw_mode = RwMode::None;
        } else {
            self.write(self.stack_addr(), value);
        }
        self.s = self.s.wrapping_sub(1);
    }

    /// Increments the stack pointer and reads the top of the stack.
    fn pull(&mut self) {
        self.s = self.s.wrapping_add(1);
        self.read(self.stack_addr());
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.carry = register >= value;
        self.update_negative_zero_flags(register.wrapping_sub(value));
    }

    fn update_negative_zero_flags(&mut self, value: u8) {
        self.status.negative = value & 0x80 != 0;
        self.status.zero = value == 0;
    }
}

impl Display for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04X} {} A:{:02X} X:{:02X} Y:{:02X} S:{:02X} P:{}",
            self.pc,
            OPCODE_TABLE[self.opcode as usize].mnemonic.to_uppercase(),
            self.a,
            self.x,
            self.y,
            self.s,
            self.status.format_string()
        )
    }
}
