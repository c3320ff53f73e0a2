//! Instruction timing and flag behavior, checked against a flat 64K memory.
use pretty_assertions::assert_eq;

use super::Cpu;
use super::StatusFlags;
use crate::common::bus::RwMode;

/// Cycle counts of all non-branch opcodes without page crossing. Opcodes that are not
/// implemented (KIL, SHX and the other unstable ones) execute as 2 cycle NOPs.
#[rustfmt::skip]
const CYCLE_COUNTS: [u8; 256] = [
    7, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6, // 0x
    0, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 1x
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6, // 2x
    0, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 3x
    6, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6, // 4x
    0, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 5x
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6, // 6x
    0, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 7x
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // 8x
    0, 6, 2, 2, 4, 4, 4, 4, 2, 5, 2, 2, 2, 5, 2, 2, // 9x
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // Ax
    0, 5, 2, 5, 4, 4, 4, 4, 2, 4, 2, 2, 4, 4, 4, 4, // Bx
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // Cx
    0, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // Dx
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // Ex
    0, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // Fx
];

struct TestSystem {
    cpu: Cpu,
    memory: Vec<u8>,
}

impl TestSystem {
    /// Loads `program` at `origin`, points the reset vector at it and runs the reset sequence.
    fn new(origin: u16, program: &[u8]) -> Self {
        let mut memory = vec![0; 0x10000];
        memory[origin as usize..origin as usize + program.len()].copy_from_slice(program);
        memory[0xFFFC..0xFFFE].copy_from_slice(&origin.to_le_bytes());
        let mut system = Self {
            cpu: Cpu::new(),
            memory,
        };
        system.run_instruction();
        system
    }

    fn step(&mut self) {
        self.cpu.step();
        let addr = self.cpu.address as usize;
        match self.cpu.rw_mode {
            RwMode::Read => self.cpu.data = self.memory[addr],
            RwMode::Write => self.memory[addr] = self.cpu.data,
            RwMode::None => (),
        }
    }

    /// Steps until the current instruction completes and returns the number of cycles taken.
    fn run_instruction(&mut self) -> usize {
        let mut cycles = 0;
        loop {
            self.step();
            cycles += 1;
            if self.cpu.instruction_complete() {
                return cycles;
            }
        }
    }
}

#[test]
pub fn test_reset_state() {
    let cpu = Cpu::new();
    assert_eq!(u8::from(cpu.status), 0x24);
    assert_eq!(cpu.s, 0xFF);
    assert!(!cpu.instruction_complete());
}

#[test]
pub fn test_reset_sequence() {
    let system = TestSystem::new(0x8123, &[0xEA]);
    assert_eq!(system.cpu.pc, 0x8124);
    assert_eq!(system.cpu.s, 0xFC);
    assert_eq!(system.cpu.opcode(), 0x00);
    // Stack writes are suppressed during reset.
    assert!(system.memory[0x0100..0x0200].iter().all(|b| *b == 0));
}

#[test]
pub fn test_cycle_counts() {
    for opcode in 0..=255_u8 {
        let expected = CYCLE_COUNTS[opcode as usize];
        if expected == 0 {
            continue;
        }
        let mut system = TestSystem::new(0x8000, &[opcode, 0x00, 0x02]);
        let cycles = system.run_instruction();
        assert_eq!(
            (opcode, cycles),
            (opcode, expected as usize),
            "cycle count of opcode {:02X}",
            opcode
        );
    }
}

#[test]
pub fn test_branch_cycles() {
    // BEQ not taken
    let mut system = TestSystem::new(0x8000, &[0xF0, 0x05]);
    assert_eq!(system.run_instruction(), 2);
    assert_eq!(system.cpu.pc, 0x8003);

    // BNE taken on the same page
    let mut system = TestSystem::new(0x8000, &[0xD0, 0x05]);
    assert_eq!(system.run_instruction(), 3);
    assert_eq!(system.cpu.pc, 0x8008);

    // BNE taken across a page boundary
    let mut system = TestSystem::new(0x80F0, &[0xD0, 0x20]);
    assert_eq!(system.run_instruction(), 4);
    assert_eq!(system.cpu.pc, 0x8113);

    // BNE taken backwards across a page boundary
    let mut system = TestSystem::new(0x8000, &[0xD0, 0xFC]);
    assert_eq!(system.run_instruction(), 4);
    assert_eq!(system.cpu.pc, 0x7FFF);
}

#[test]
pub fn test_page_cross_cycles() {
    // LDX #$FF; LDA $0201,X
    let mut system = TestSystem::new(0x8000, &[0xA2, 0xFF, 0xBD, 0x01, 0x02]);
    system.memory[0x0300] = 0x42;
    system.run_instruction();
    assert_eq!(system.run_instruction(), 5);
    assert_eq!(system.cpu.a, 0x42);

    // LDX #$01; STA $0200,X takes 5 cycles without page crossing
    let mut system = TestSystem::new(0x8000, &[0xA2, 0x01, 0x9D, 0x00, 0x02]);
    system.run_instruction();
    assert_eq!(system.run_instruction(), 5);

    // LDY #$10; LDA ($00),Y with pointer $02F8
    let mut system = TestSystem::new(0x8000, &[0xA0, 0x10, 0xB1, 0x00]);
    system.memory[0x0000] = 0xF8;
    system.memory[0x0001] = 0x02;
    system.memory[0x0308] = 0x99;
    system.run_instruction();
    assert_eq!(system.run_instruction(), 6);
    assert_eq!(system.cpu.a, 0x99);
}

#[test]
pub fn test_zero_page_index_wraps() {
    // LDX #$10; LDA $F8,X reads $0008
    let mut system = TestSystem::new(0x8000, &[0xA2, 0x10, 0xB5, 0xF8]);
    system.memory[0x0008] = 0x77;
    system.memory[0x0108] = 0x11;
    system.run_instruction();
    system.run_instruction();
    assert_eq!(system.cpu.a, 0x77);
}

#[test]
pub fn test_jmp_indirect_page_wrap() {
    let mut system = TestSystem::new(0x8000, &[0x6C, 0xFF, 0x10]);
    system.memory[0x10FF] = 0x34;
    system.memory[0x1000] = 0x12;
    system.memory[0x1100] = 0x56;
    assert_eq!(system.run_instruction(), 5);
    assert_eq!(system.cpu.pc, 0x1235);
}

#[test]
pub fn test_jsr_rts() {
    // JSR $9000; ... $9000: RTS
    let mut system = TestSystem::new(0x8000, &[0x20, 0x00, 0x90]);
    system.memory[0x9000] = 0x60;
    system.run_instruction();
    assert_eq!(system.cpu.pc, 0x9001);
    assert_eq!(system.memory[0x01FC], 0x80);
    assert_eq!(system.memory[0x01FB], 0x02);
    system.run_instruction();
    assert_eq!(system.cpu.pc, 0x8004);
    assert_eq!(system.cpu.s, 0xFC);
}

#[test]
pub fn test_adc_flags() {
    // CLC; LDA #$50; ADC #$50
    let mut system = TestSystem::new(0x8000, &[0x18, 0xA9, 0x50, 0x69, 0x50]);
    for _ in 0..3 {
        system.run_instruction();
    }
    assert_eq!(system.cpu.a, 0xA0);
    assert!(system.cpu.status.overflow);
    assert!(system.cpu.status.negative);
    assert!(!system.cpu.status.carry);

    // SEC; LDA #$FF; ADC #$00
    let mut system = TestSystem::new(0x8000, &[0x38, 0xA9, 0xFF, 0x69, 0x00]);
    for _ in 0..3 {
        system.run_instruction();
    }
    assert_eq!(system.cpu.a, 0x00);
    assert!(system.cpu.status.carry);
    assert!(system.cpu.status.zero);
    assert!(!system.cpu.status.overflow);
}

#[test]
pub fn test_sbc_flags() {
    // SEC; LDA #$50; SBC #$B0
    let mut system = TestSystem::new(0x8000, &[0x38, 0xA9, 0x50, 0xE9, 0xB0]);
    for _ in 0..3 {
        system.run_instruction();
    }
    assert_eq!(system.cpu.a, 0xA0);
    assert!(system.cpu.status.overflow);
    assert!(!system.cpu.status.carry);

    // SEC; LDA #$05; SBC #$03
    let mut system = TestSystem::new(0x8000, &[0x38, 0xA9, 0x05, 0xE9, 0x03]);
    for _ in 0..3 {
        system.run_instruction();
    }
    assert_eq!(system.cpu.a, 0x02);
    assert!(system.cpu.status.carry);
    assert!(!system.cpu.status.overflow);
}

#[test]
pub fn test_compare() {
    // LDA #$40; CMP #$41
    let mut system = TestSystem::new(0x8000, &[0xA9, 0x40, 0xC9, 0x41]);
    system.run_instruction();
    system.run_instruction();
    assert!(!system.cpu.status.carry);
    assert!(system.cpu.status.negative);
    assert!(!system.cpu.status.zero);
}

#[test]
pub fn test_php_plp_break_flag() {
    // PHP; PLP
    let mut system = TestSystem::new(0x8000, &[0x08, 0x28]);
    system.run_instruction();
    assert_eq!(system.memory[0x01FC], 0x34);
    system.run_instruction();
    assert_eq!(system.cpu.status, StatusFlags::from(0x24));
}

#[test]
pub fn test_nmi() {
    let mut system = TestSystem::new(0x8000, &[0xEA, 0xEA]);
    system.memory[0xFFFA] = 0x00;
    system.memory[0xFFFB] = 0x90;
    system.cpu.nmi = true;
    system.run_instruction();
    assert_eq!(system.run_instruction(), 7);
    assert_eq!(system.cpu.pc, 0x9001);
    assert!(!system.cpu.nmi);
    assert!(system.cpu.status.irq_disable);
    // Return address points at the second NOP, B is clear in the pushed status.
    assert_eq!(system.memory[0x01FC], 0x80);
    assert_eq!(system.memory[0x01FB], 0x01);
    assert_eq!(system.memory[0x01FA], 0x24);
}

#[test]
pub fn test_irq_masked_by_irq_disable() {
    // NOP; CLI; NOP
    let mut system = TestSystem::new(0x8000, &[0xEA, 0x58, 0xEA, 0xEA]);
    system.memory[0xFFFE] = 0x00;
    system.memory[0xFFFF] = 0xA0;
    system.cpu.irq = true;
    system.run_instruction();
    assert_eq!(system.cpu.pc, 0x8002);
    system.run_instruction();
    // The interrupt is taken at the poll that ends CLI
    system.run_instruction();
    assert_eq!(system.cpu.pc, 0xA001);
    assert_eq!(system.memory[0x01FA] & 0x10, 0);
}

#[test]
pub fn test_brk() {
    let mut system = TestSystem::new(0x8000, &[0x00, 0xFF]);
    system.memory[0xFFFE] = 0x00;
    system.memory[0xFFFF] = 0xA0;
    assert_eq!(system.run_instruction(), 7);
    assert_eq!(system.cpu.pc, 0xA001);
    // BRK skips its padding byte
    assert_eq!(system.memory[0x01FB], 0x02);
    assert_eq!(system.memory[0x01FA] & 0x10, 0x10);
}

#[test]
pub fn test_unknown_opcode_is_nop() {
    let mut system = TestSystem::new(0x8000, &[0x02, 0xEA]);
    let a = system.cpu.a;
    assert_eq!(system.run_instruction(), 2);
    assert_eq!(system.cpu.pc, 0x8002);
    assert_eq!(system.cpu.a, a);
}

#[test]
pub fn test_read_modify_write() {
    // INC $0200; ASL A
    let mut system = TestSystem::new(0x8000, &[0xEE, 0x00, 0x02, 0x0A]);
    system.memory[0x0200] = 0x7F;
    system.cpu.a = 0x81;
    system.run_instruction();
    assert_eq!(system.memory[0x0200], 0x80);
    assert!(system.cpu.status.negative);
    system.run_instruction();
    assert_eq!(system.cpu.a, 0x02);
    assert!(system.cpu.status.carry);
}

/// Register and memory state around a single instruction.
struct InstructionCase {
    program: &'static [u8],
    /// A, X, Y and P before the instruction
    registers: (u8, u8, u8, u8),
    memory: &'static [(u16, u8)],
    /// A, X and P after the instruction
    expected: (u8, u8, u8),
    expected_memory: &'static [(u16, u8)],
}

#[rustfmt::skip]
const UNOFFICIAL_CASES: &[InstructionCase] = &[
    // LAX $10
    InstructionCase { program: &[0xA7, 0x10], registers: (0x00, 0x00, 0x00, 0x24),
        memory: &[(0x0010, 0x80)], expected: (0x80, 0x80, 0xA4), expected_memory: &[] },
    // LAX $20,Y
    InstructionCase { program: &[0xB7, 0x20], registers: (0x11, 0x22, 0x05, 0x24),
        memory: &[(0x0025, 0x00)], expected: (0x00, 0x00, 0x26), expected_memory: &[] },
    // LAX ($60,X)
    InstructionCase { program: &[0xA3, 0x60], registers: (0x00, 0x02, 0x00, 0x24),
        memory: &[(0x0062, 0x00), (0x0063, 0x04), (0x0400, 0x7F)],
        expected: (0x7F, 0x7F, 0x24), expected_memory: &[] },
    // SAX $30
    InstructionCase { program: &[0x87, 0x30], registers: (0xF0, 0x3C, 0x00, 0x24),
        memory: &[], expected: (0xF0, 0x3C, 0x24), expected_memory: &[(0x0030, 0x30)] },
    // SAX $30,Y
    InstructionCase { program: &[0x97, 0x30], registers: (0xF0, 0x3C, 0x02, 0xA7),
        memory: &[], expected: (0xF0, 0x3C, 0xA7), expected_memory: &[(0x0032, 0x30)] },
    // SBC #$03 ($EB)
    InstructionCase { program: &[0xEB, 0x03], registers: (0x05, 0x00, 0x00, 0x25),
        memory: &[], expected: (0x02, 0x00, 0x25), expected_memory: &[] },
    // SLO $40
    InstructionCase { program: &[0x07, 0x40], registers: (0x01, 0x00, 0x00, 0x24),
        memory: &[(0x0040, 0x81)], expected: (0x03, 0x00, 0x25),
        expected_memory: &[(0x0040, 0x02)] },
    // SLO $0200,X
    InstructionCase { program: &[0x1F, 0x00, 0x02], registers: (0x01, 0x03, 0x00, 0x24),
        memory: &[(0x0203, 0x40)], expected: (0x81, 0x03, 0xA4),
        expected_memory: &[(0x0203, 0x80)] },
    // RLA $40
    InstructionCase { program: &[0x27, 0x40], registers: (0xFF, 0x00, 0x00, 0x25),
        memory: &[(0x0040, 0x80)], expected: (0x01, 0x00, 0x25),
        expected_memory: &[(0x0040, 0x01)] },
    // RLA $40,X
    InstructionCase { program: &[0x37, 0x40], registers: (0x0F, 0x01, 0x00, 0x24),
        memory: &[(0x0041, 0x40)], expected: (0x00, 0x01, 0x26),
        expected_memory: &[(0x0041, 0x80)] },
    // SRE $40
    InstructionCase { program: &[0x47, 0x40], registers: (0x0F, 0x00, 0x00, 0x24),
        memory: &[(0x0040, 0x03)], expected: (0x0E, 0x00, 0x25),
        expected_memory: &[(0x0040, 0x01)] },
    // SRE $0200,Y
    InstructionCase { program: &[0x5B, 0x00, 0x02], registers: (0x40, 0x00, 0x04, 0x24),
        memory: &[(0x0204, 0x80)], expected: (0x00, 0x00, 0x26),
        expected_memory: &[(0x0204, 0x40)] },
    // RRA $40
    InstructionCase { program: &[0x67, 0x40], registers: (0x10, 0x00, 0x00, 0x24),
        memory: &[(0x0040, 0x02)], expected: (0x11, 0x00, 0x24),
        expected_memory: &[(0x0040, 0x01)] },
    // RRA $40,X: the carry rotated out feeds the addition
    InstructionCase { program: &[0x77, 0x40], registers: (0x7F, 0x02, 0x00, 0x25),
        memory: &[(0x0042, 0x01)], expected: (0x00, 0x02, 0x27),
        expected_memory: &[(0x0042, 0x80)] },
    // DCP $11
    InstructionCase { program: &[0xC7, 0x11], registers: (0x10, 0x00, 0x00, 0x24),
        memory: &[(0x0011, 0x11)], expected: (0x10, 0x00, 0x27),
        expected_memory: &[(0x0011, 0x10)] },
    // DCP $0200,X
    InstructionCase { program: &[0xDF, 0x00, 0x02], registers: (0x10, 0x01, 0x00, 0x24),
        memory: &[(0x0201, 0x20)], expected: (0x10, 0x01, 0xA4),
        expected_memory: &[(0x0201, 0x1F)] },
    // ISB $01
    InstructionCase { program: &[0xE7, 0x01], registers: (0x05, 0x00, 0x00, 0x25),
        memory: &[(0x0001, 0x01)], expected: (0x03, 0x00, 0x25),
        expected_memory: &[(0x0001, 0x02)] },
    // ISB ($50),Y
    InstructionCase { program: &[0xF3, 0x50], registers: (0x80, 0x00, 0x10, 0x25),
        memory: &[(0x0050, 0x00), (0x0051, 0x03), (0x0310, 0xFF)],
        expected: (0x80, 0x00, 0xA5), expected_memory: &[(0x0310, 0x00)] },
];

#[test]
pub fn test_unofficial_opcodes() {
    for case in UNOFFICIAL_CASES {
        let mut system = TestSystem::new(0x8000, case.program);
        let (a, x, y, p) = case.registers;
        system.cpu.a = a;
        system.cpu.x = x;
        system.cpu.y = y;
        system.cpu.status = StatusFlags::from(p);
        for (addr, value) in case.memory {
            system.memory[*addr as usize] = *value;
        }
        system.run_instruction();

        let opcode = case.program[0];
        assert_eq!(
            (system.cpu.a, system.cpu.x, u8::from(system.cpu.status)),
            case.expected,
            "A, X and P after opcode {:02X}",
            opcode
        );
        for (addr, value) in case.expected_memory {
            assert_eq!(
                system.memory[*addr as usize],
                *value,
                "memory at {:04X} after opcode {:02X}",
                addr,
                opcode
            );
        }
    }
}
