//! Simple fuzzer that executes random programs on the emulator.
#![no_main]

use libfuzzer_sys::fuzz_target;
use nes_emulator::components::cartridge::Cartridge;
use nes_emulator::System;

fuzz_target!(|data: &[u8]| {
    // Load a random program into the emulator.
    let mut system = System::new(Cartridge::with_program(data));
    // Any program may run, but the emulator should never ever panic!
    for _ in 0..10000 {
        system.tick();
    }
});
