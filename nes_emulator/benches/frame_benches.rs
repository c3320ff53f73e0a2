use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use nes_emulator::components::cartridge::Cartridge;
use nes_emulator::System;

/// Busy loop decrementing X and Y, with rendering of the backdrop enabled.
const PROGRAM: &[u8] = &[
    0xA9, 0x0A, 0x8D, 0x01, 0x20, // PPUMASK: show background
    0xCA, // DEX
    0xD0, 0xFD, // BNE -3
    0x88, // DEY
    0xD0, 0xFA, // BNE -6
    0x4C, 0x05, 0x80, // JMP $8005
];

fn with_reset_vector(program: &[u8]) -> Vec<u8> {
    let mut prg = vec![0; 0x4000];
    prg[..program.len()].copy_from_slice(program);
    prg[0x3FFC] = 0x00;
    prg[0x3FFD] = 0x80;
    prg
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("frame_time", |b| {
        let mut system = System::new(Cartridge::with_program(&with_reset_vector(PROGRAM)));
        b.iter(|| system.execute_frames(1));
    });

    c.bench_function("frame_time_idle", |b| {
        let mut system = System::new(Cartridge::with_program(&with_reset_vector(&[
            0x4C, 0x00, 0x80,
        ])));
        b.iter(|| system.execute_frames(1));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
