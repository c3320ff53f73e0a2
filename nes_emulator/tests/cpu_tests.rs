//! Compares the bus activity of the CPU cycle by cycle against the documented 6502 sequences.
mod util;

use nes_emulator::common::logging;
use nes_emulator::components::cpu::Cpu;
use pretty_assertions::assert_eq;
use util::test_bus::Cycle;
use util::test_bus::TestBus;

const ORIGIN: u16 = 0x8000;

/// Returns a CPU that completed the reset sequence and fetched the first opcode of `program`.
fn reset_with_program(program: &[u8]) -> (Cpu, TestBus) {
    logging::test_init(false);
    let mut cpu = Cpu::new();
    let mut bus = TestBus::with_program(ORIGIN, program);
    bus.run_instruction(&mut cpu);
    (cpu, bus)
}

#[test]
pub fn test_reset_sequence() {
    let mut cpu = Cpu::new();
    let mut bus = TestBus::with_program(ORIGIN, &[0xEA]);
    assert_eq!(
        bus.run_instruction(&mut cpu),
        vec![
            Cycle::Internal,
            Cycle::Internal,
            Cycle::Internal,
            Cycle::Read(0xFFFC, 0x00),
            Cycle::Read(0xFFFD, 0x80),
            Cycle::Read(0x8000, 0xEA),
        ]
    );
    assert_eq!(cpu.pc, 0x8001);
    assert_eq!(cpu.s, 0xFC);
    assert_eq!(u8::from(cpu.status), 0x24);
}

#[test]
pub fn test_read_modify_write_trace() {
    // INC $10
    let (mut cpu, mut bus) = reset_with_program(&[0xE6, 0x10, 0xEA]);
    bus.memory.set(0x0010, 0x41);
    assert_eq!(
        bus.run_instruction(&mut cpu),
        vec![
            Cycle::Read(0x8001, 0x10),
            Cycle::Read(0x0010, 0x41),
            Cycle::Write(0x0010, 0x41),
            Cycle::Write(0x0010, 0x42),
            Cycle::Read(0x8002, 0xEA),
        ]
    );
}

#[test]
pub fn test_indexed_store_trace() {
    // LDX #$05; LDA #$77; STA $0200,X
    let (mut cpu, mut bus) =
        reset_with_program(&[0xA2, 0x05, 0xA9, 0x77, 0x9D, 0x00, 0x02, 0xEA]);
    bus.run_instruction(&mut cpu);
    bus.run_instruction(&mut cpu);
    assert_eq!(
        bus.run_instruction(&mut cpu),
        vec![
            Cycle::Read(0x8005, 0x00),
            Cycle::Read(0x8006, 0x02),
            Cycle::Read(0x0205, 0x00),
            Cycle::Write(0x0205, 0x77),
            Cycle::Read(0x8007, 0xEA),
        ]
    );
}

#[test]
pub fn test_page_cross_read_trace() {
    // LDX #$01; LDA $02FF,X
    let (mut cpu, mut bus) = reset_with_program(&[0xA2, 0x01, 0xBD, 0xFF, 0x02, 0xEA]);
    bus.memory.set(0x0300, 0x55);
    bus.run_instruction(&mut cpu);
    assert_eq!(
        bus.run_instruction(&mut cpu),
        vec![
            Cycle::Read(0x8003, 0xFF),
            Cycle::Read(0x8004, 0x02),
            Cycle::Read(0x0200, 0x00),
            Cycle::Read(0x0300, 0x55),
            Cycle::Read(0x8005, 0xEA),
        ]
    );
    assert_eq!(cpu.a, 0x55);
}

#[test]
pub fn test_jsr_rts_trace() {
    // JSR $9000; NOP, with RTS at $9000
    let (mut cpu, mut bus) = reset_with_program(&[0x20, 0x00, 0x90, 0xEA]);
    bus.memory.set(0x9000, 0x60);
    assert_eq!(
        bus.run_instruction(&mut cpu),
        vec![
            Cycle::Read(0x8001, 0x00),
            Cycle::Read(0x01FC, 0x00),
            Cycle::Write(0x01FC, 0x80),
            Cycle::Write(0x01FB, 0x02),
            Cycle::Read(0x8002, 0x90),
            Cycle::Read(0x9000, 0x60),
        ]
    );
    assert_eq!(
        bus.run_instruction(&mut cpu),
        vec![
            Cycle::Read(0x9001, 0x00),
            Cycle::Read(0x01FA, 0x00),
            Cycle::Read(0x01FB, 0x02),
            Cycle::Read(0x01FC, 0x80),
            Cycle::Read(0x8002, 0x90),
            Cycle::Read(0x8003, 0xEA),
        ]
    );
    assert_eq!(cpu.s, 0xFC);
}

#[test]
pub fn test_nmi_trace() {
    let (mut cpu, mut bus) = reset_with_program(&[0xEA, 0xEA, 0xEA]);
    bus.memory.set(0xFFFA, 0x00);
    bus.memory.set(0xFFFB, 0x90);
    bus.memory.set(0x9000, 0x40);
    cpu.nmi = true;

    // The NOP completes, the following opcode fetch is discarded
    assert_eq!(
        bus.run_instruction(&mut cpu),
        vec![Cycle::Read(0x8001, 0xEA), Cycle::Read(0x8001, 0xEA)]
    );
    assert_eq!(
        bus.run_instruction(&mut cpu),
        vec![
            Cycle::Read(0x8001, 0xEA),
            Cycle::Write(0x01FC, 0x80),
            Cycle::Write(0x01FB, 0x01),
            Cycle::Write(0x01FA, 0x24),
            Cycle::Read(0xFFFA, 0x00),
            Cycle::Read(0xFFFB, 0x90),
            Cycle::Read(0x9000, 0x40),
        ]
    );
    assert!(!cpu.nmi);
    assert!(cpu.status.irq_disable);

    // RTI returns to the interrupted instruction
    bus.run_instruction(&mut cpu);
    assert_eq!(cpu.pc, 0x8002);
    assert_eq!(cpu.data, 0xEA);
}
