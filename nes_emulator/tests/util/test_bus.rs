use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;

use itertools::Itertools;
use nes_emulator::common::bus::RwMode;
use nes_emulator::components::cpu::Cpu;

/// A test bus for the CPU.
///
/// Stores memory sparsely and records all bus cycles for comparison to the expected trace.
#[derive(Default)]
pub struct TestBus {
    pub memory: SparseMemory,
    pub cycles: Vec<Cycle>,
}

impl TestBus {
    /// Places `program` at `origin` and points the reset vector at it.
    pub fn with_program(origin: u16, program: &[u8]) -> Self {
        let mut bus = Self::default();
        for (i, byte) in program.iter().enumerate() {
            bus.memory.set(origin.wrapping_add(i as u16), *byte);
        }
        bus.memory.set(0xFFFC, origin as u8);
        bus.memory.set(0xFFFD, (origin >> 8) as u8);
        bus
    }

    /// Runs one CPU cycle and services its bus request.
    pub fn step(&mut self, cpu: &mut Cpu) {
        cpu.step();
        let cycle = match cpu.rw_mode {
            RwMode::Read => {
                let value = self.memory.get(cpu.address).unwrap_or_default();
                cpu.data = value;
                Cycle::Read(cpu.address, value)
            }
            RwMode::Write => {
                self.memory.set(cpu.address, cpu.data);
                Cycle::Write(cpu.address, cpu.data)
            }
            RwMode::None => Cycle::Internal,
        };
        self.cycles.push(cycle);
    }

    /// Runs until the current instruction (or the reset sequence) completes and returns the
    /// bus cycles it performed.
    pub fn run_instruction(&mut self, cpu: &mut Cpu) -> Vec<Cycle> {
        self.cycles.clear();
        self.step(cpu);
        while !cpu.instruction_complete() {
            self.step(cpu);
        }
        std::mem::take(&mut self.cycles)
    }
}

/// Description of a bus cycle
#[derive(Clone, Copy, Eq, PartialEq)]
pub enum Cycle {
    /// The bus was in read mode: (addr, value read)
    Read(u16, u8),
    /// The bus was in write mode: (addr, value written)
    Write(u16, u8),
    /// The CPU did not access the bus
    Internal,
}

impl Debug for Cycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Cycle::Read(addr, value) => write!(f, "R({:04X})={:02X}", addr, value),
            Cycle::Write(addr, value) => write!(f, "W({:04X})={:02X}", addr, value),
            Cycle::Internal => write!(f, "I"),
        }
    }
}

/// Implements a sparse memory HashMap with a readable display format.
#[derive(Default, PartialEq)]
pub struct SparseMemory {
    pub memory: HashMap<u16, u8>,
}

impl SparseMemory {
    pub fn get(&self, addr: u16) -> Option<u8> {
        self.memory.get(&addr).copied()
    }

    pub fn set(&mut self, addr: u16, value: u8) {
        self.memory.insert(addr, value);
    }
}

impl Display for SparseMemory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (addr, value) in self.memory.iter().sorted() {
            writeln!(f, "{:04X}: {:02X}", addr, value)?;
        }
        Ok(())
    }
}
