#![no_main]

use libfuzzer_sys::fuzz_target;
use nes_emulator::components::cartridge::Cartridge;
use nes_emulator::System;

fuzz_target!(|data: &[u8]| {
    // This will likely fail, but should never panic!
    if let Ok(cartridge) = Cartridge::with_ines_data(data) {
        let mut system = System::new(cartridge);
        for _ in 0..1000 {
            system.tick();
        }
    }
});
