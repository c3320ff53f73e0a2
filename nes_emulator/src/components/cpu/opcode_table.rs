//! Combines [AddressMode]s with instruction implementations to form the opcode table.
//!
//! Each entry names the data operation of an opcode and the address mode that drives its bus
//! cycles. Opcodes without an entry decode as a 2 cycle NOP.
use lazy_static::lazy_static;

use super::instructions::*;
use super::Cpu;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum AddressMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// ($nn,X)
    IndexedIndirect,
    /// ($nn),Y
    IndirectIndexed,
    /// ($nnnn), only used by JMP
    Indirect,
    Relative,
}

/// The data operation performed by an opcode.
#[derive(Clone, Copy)]
pub enum Operation {
    Implied(fn(&mut Cpu)),
    Read(fn(&mut Cpu, u8)),
    Write(fn(&Cpu) -> u8),
    ReadModifyWrite(fn(&mut Cpu, u8) -> u8),
    Branch(fn(&Cpu) -> bool),
    Push(fn(&Cpu) -> u8),
    Pull(fn(&mut Cpu, u8)),
    Jmp,
    Jsr,
    Rts,
    Rti,
    Brk,
}

/// An entry in the opcode table
#[derive(Clone, Copy)]
pub struct Instruction {
    pub mnemonic: &'static str,
    pub operation: Operation,
    pub mode: AddressMode,
}

lazy_static! {
    pub static ref OPCODE_TABLE: [Instruction; 256] = build_opcode_table();
}

fn build_opcode_table() -> [Instruction; 256] {
    macro_rules! instruction {
        // Instruction implemented by a function in `instructions`
        ($kind: ident, $method: ident, $mode: ident) => {
            Instruction {
                mnemonic: stringify!($method),
                operation: Operation::$kind($method),
                mode: AddressMode::$mode,
            }
        };
        // Control flow instruction implemented directly by the CPU
        ($kind: ident, $mode: ident) => {
            Instruction {
                mnemonic: stringify!($kind),
                operation: Operation::$kind,
                mode: AddressMode::$mode,
            }
        };
    }

    let mut opcodes = [instruction!(Implied, nop, Implied); 256];

    // Control flow
    opcodes[0x00] = instruction!(Brk, Implied);
    opcodes[0x20] = instruction!(Jsr, Absolute);
    opcodes[0x40] = instruction!(Rti, Implied);
    opcodes[0x60] = instruction!(Rts, Implied);
    opcodes[0x4C] = instruction!(Jmp, Absolute);
    opcodes[0x6C] = instruction!(Jmp, Indirect);

    opcodes[0x10] = instruction!(Branch, bpl, Relative);
    opcodes[0x30] = instruction!(Branch, bmi, Relative);
    opcodes[0x50] = instruction!(Branch, bvc, Relative);
    opcodes[0x70] = instruction!(Branch, bvs, Relative);
    opcodes[0x90] = instruction!(Branch, bcc, Relative);
    opcodes[0xB0] = instruction!(Branch, bcs, Relative);
    opcodes[0xD0] = instruction!(Branch, bne, Relative);
    opcodes[0xF0] = instruction!(Branch, beq, Relative);

    // Stack
    opcodes[0x48] = instruction!(Push, pha, Implied);
    opcodes[0x08] = instruction!(Push, php, Implied);
    opcodes[0x68] = instruction!(Pull, pla, Implied);
    opcodes[0x28] = instruction!(Pull, plp, Implied);

    // Flags and register transfers
    opcodes[0x18] = instruction!(Implied, clc, Implied);
    opcodes[0x38] = instruction!(Implied, sec, Implied);
    opcodes[0x58] = instruction!(Implied, cli, Implied);
    opcodes[0x78] = instruction!(Implied, sei, Implied);
    opcodes[0xB8] = instruction!(Implied, clv, Implied);
    opcodes[0xD8] = instruction!(Implied, cld, Implied);
    opcodes[0xF8] = instruction!(Implied, sed, Implied);
    opcodes[0xAA] = instruction!(Implied, tax, Implied);
    opcodes[0xA8] = instruction!(Implied, tay, Implied);
    opcodes[0x8A] = instruction!(Implied, txa, Implied);
    opcodes[0x98] = instruction!(Implied, tya, Implied);
    opcodes[0xBA] = instruction!(Implied, tsx, Implied);
    opcodes[0x9A] = instruction!(Implied, txs, Implied);
    opcodes[0xE8] = instruction!(Implied, inx, Implied);
    opcodes[0xC8] = instruction!(Implied, iny, Implied);
    opcodes[0xCA] = instruction!(Implied, dex, Implied);
    opcodes[0x88] = instruction!(Implied, dey, Implied);
    opcodes[0xEA] = instruction!(Implied, nop, Implied);

    // Loads
    opcodes[0xA9] = instruction!(Read, lda, Immediate);
    opcodes[0xA5] = instruction!(Read, lda, ZeroPage);
    opcodes[0xB5] = instruction!(Read, lda, ZeroPageX);
    opcodes[0xAD] = instruction!(Read, lda, Absolute);
    opcodes[0xBD] = instruction!(Read, lda, AbsoluteX);
    opcodes[0xB9] = instruction!(Read, lda, AbsoluteY);
    opcodes[0xA1] = instruction!(Read, lda, IndexedIndirect);
    opcodes[0xB1] = instruction!(Read, lda, IndirectIndexed);

    opcodes[0xA2] = instruction!(Read, ldx, Immediate);
    opcodes[0xA6] = instruction!(Read, ldx, ZeroPage);
    opcodes[0xB6] = instruction!(Read, ldx, ZeroPageY);
    opcodes[0xAE] = instruction!(Read, ldx, Absolute);
    opcodes[0xBE] = instruction!(Read, ldx, AbsoluteY);

    opcodes[0xA0] = instruction!(Read, ldy, Immediate);
    opcodes[0xA4] = instruction!(Read, ldy, ZeroPage);
    opcodes[0xB4] = instruction!(Read, ldy, ZeroPageX);
    opcodes[0xAC] = instruction!(Read, ldy, Absolute);
    opcodes[0xBC] = instruction!(Read, ldy, AbsoluteX);

    // Stores
    opcodes[0x85] = instruction!(Write, sta, ZeroPage);
    opcodes[0x95] = instruction!(Write, sta, ZeroPageX);
    opcodes[0x8D] = instruction!(Write, sta, Absolute);
    opcodes[0x9D] = instruction!(Write, sta, AbsoluteX);
    opcodes[0x99] = instruction!(Write, sta, AbsoluteY);
    opcodes[0x81] = instruction!(Write, sta, IndexedIndirect);
    opcodes[0x91] = instruction!(Write, sta, IndirectIndexed);

    opcodes[0x86] = instruction!(Write, stx, ZeroPage);
    opcodes[0x96] = instruction!(Write, stx, ZeroPageY);
    opcodes[0x8E] = instruction!(Write, stx, Absolute);

    opcodes[0x84] = instruction!(Write, sty, ZeroPage);
    opcodes[0x94] = instruction!(Write, sty, ZeroPageX);
    opcodes[0x8C] = instruction!(Write, sty, Absolute);

    // Arithmetic, logic and compare with the standard set of 8 address modes
    macro_rules! alu_group {
        ($method: ident, $base: expr) => {
            opcodes[$base + 0x09] = instruction!(Read, $method, Immediate);
            opcodes[$base + 0x05] = instruction!(Read, $method, ZeroPage);
            opcodes[$base + 0x15] = instruction!(Read, $method, ZeroPageX);
            opcodes[$base + 0x0D] = instruction!(Read, $method, Absolute);
            opcodes[$base + 0x1D] = instruction!(Read, $method, AbsoluteX);
            opcodes[$base + 0x19] = instruction!(Read, $method, AbsoluteY);
            opcodes[$base + 0x01] = instruction!(Read, $method, IndexedIndirect);
            opcodes[$base + 0x11] = instruction!(Read, $method, IndirectIndexed);
        };
    }
    alu_group!(ora, 0x00);
    alu_group!(and, 0x20);
    alu_group!(eor, 0x40);
    alu_group!(adc, 0x60);
    alu_group!(cmp, 0xC0);
    alu_group!(sbc, 0xE0);

    opcodes[0xE0] = instruction!(Read, cpx, Immediate);
    opcodes[0xE4] = instruction!(Read, cpx, ZeroPage);
    opcodes[0xEC] = instruction!(Read, cpx, Absolute);
    opcodes[0xC0] = instruction!(Read, cpy, Immediate);
    opcodes[0xC4] = instruction!(Read, cpy, ZeroPage);
    opcodes[0xCC] = instruction!(Read, cpy, Absolute);
    opcodes[0x24] = instruction!(Read, bit, ZeroPage);
    opcodes[0x2C] = instruction!(Read, bit, Absolute);

    // Shifts, rotates, increments and decrements
    macro_rules! rmw_group {
        ($method: ident, $base: expr) => {
            opcodes[$base + 0x06] = instruction!(ReadModifyWrite, $method, ZeroPage);
            opcodes[$base + 0x16] = instruction!(ReadModifyWrite, $method, ZeroPageX);
            opcodes[$base + 0x0E] = instruction!(ReadModifyWrite, $method, Absolute);
            opcodes[$base + 0x1E] = instruction!(ReadModifyWrite, $method, AbsoluteX);
        };
    }
    rmw_group!(asl, 0x00);
    rmw_group!(rol, 0x20);
    rmw_group!(lsr, 0x40);
    rmw_group!(ror, 0x60);
    rmw_group!(dec, 0xC0);
    rmw_group!(inc, 0xE0);
    opcodes[0x0A] = instruction!(ReadModifyWrite, asl, Accumulator);
    opcodes[0x2A] = instruction!(ReadModifyWrite, rol, Accumulator);
    opcodes[0x4A] = instruction!(ReadModifyWrite, lsr, Accumulator);
    opcodes[0x6A] = instruction!(ReadModifyWrite, ror, Accumulator);

    // Unofficial NOPs
    for opcode in [0x1A, 0x3A, 0x5A, 0x7A, 0xDA, 0xFA] {
        opcodes[opcode] = instruction!(Implied, nop, Implied);
    }
    for opcode in [0x80, 0x82, 0x89, 0xC2, 0xE2] {
        opcodes[opcode] = instruction!(Read, ign, Immediate);
    }
    for opcode in [0x04, 0x44, 0x64] {
        opcodes[opcode] = instruction!(Read, ign, ZeroPage);
    }
    for opcode in [0x14, 0x34, 0x54, 0x74, 0xD4, 0xF4] {
        opcodes[opcode] = instruction!(Read, ign, ZeroPageX);
    }
    opcodes[0x0C] = instruction!(Read, ign, Absolute);
    for opcode in [0x1C, 0x3C, 0x5C, 0x7C, 0xDC, 0xFC] {
        opcodes[opcode] = instruction!(Read, ign, AbsoluteX);
    }

    // Unofficial loads and stores
    opcodes[0xA7] = instruction!(Read, lax, ZeroPage);
    opcodes[0xB7] = instruction!(Read, lax, ZeroPageY);
    opcodes[0xAF] = instruction!(Read, lax, Absolute);
    opcodes[0xBF] = instruction!(Read, lax, AbsoluteY);
    opcodes[0xA3] = instruction!(Read, lax, IndexedIndirect);
    opcodes[0xB3] = instruction!(Read, lax, IndirectIndexed);

    opcodes[0x87] = instruction!(Write, sax, ZeroPage);
    opcodes[0x97] = instruction!(Write, sax, ZeroPageY);
    opcodes[0x8F] = instruction!(Write, sax, Absolute);
    opcodes[0x83] = instruction!(Write, sax, IndexedIndirect);

    opcodes[0xEB] = instruction!(Read, sbc, Immediate);

    // Unofficial combined read-modify-write operations
    macro_rules! combined_rmw_group {
        ($method: ident, $base: expr) => {
            opcodes[$base + 0x07] = instruction!(ReadModifyWrite, $method, ZeroPage);
            opcodes[$base + 0x17] = instruction!(ReadModifyWrite, $method, ZeroPageX);
            opcodes[$base + 0x0F] = instruction!(ReadModifyWrite, $method, Absolute);
            opcodes[$base + 0x1F] = instruction!(ReadModifyWrite, $method, AbsoluteX);
            opcodes[$base + 0x1B] = instruction!(ReadModifyWrite, $method, AbsoluteY);
            opcodes[$base + 0x03] = instruction!(ReadModifyWrite, $method, IndexedIndirect);
            opcodes[$base + 0x13] = instruction!(ReadModifyWrite, $method, IndirectIndexed);
        };
    }
    combined_rmw_group!(slo, 0x00);
    combined_rmw_group!(rla, 0x20);
    combined_rmw_group!(sre, 0x40);
    combined_rmw_group!(rra, 0x60);
    combined_rmw_group!(dcp, 0xC0);
    combined_rmw_group!(isb, 0xE0);

    opcodes
}
