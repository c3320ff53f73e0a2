//! Implementation of the 2A03 Audio Processing Unit
//!
//! Two pulse channels, the triangle and the noise channel are clocked once per CPU cycle and
//! mixed into one sample per cycle. The delta modulation channel is not emulated.
//!
//! Register accesses use the same side channel as the PPU: the owner fills in `reg_rw_mode`,
//! `reg_addr` and `reg_data`, the access is applied during the next [Apu::step].
mod envelope;
mod frame_sequencer;
mod noise;
mod pulse;
mod triangle;

use log::trace;

use self::frame_sequencer::FrameSequencer;
use self::noise::Noise;
use self::pulse::Pulse;
use self::pulse::PulseId;
use self::triangle::Triangle;
use crate::common::bus::RwMode;

/// Number of samples produced per video frame. Samples are produced at the CPU clock rate.
pub const SAMPLES_PER_FRAME: usize = 29781;
pub const SAMPLE_RATE: u32 = 1_789_773;

pub const STATUS_REGISTER: u16 = 0x4015;
pub const FRAME_COUNTER_REGISTER: u16 = 0x4017;

/// Length counter load values, indexed by bits 3-7 of the length register.
const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

pub struct Apu {
    pub reg_rw_mode: RwMode,
    pub reg_addr: u16,
    pub reg_data: u8,

    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    frame_sequencer: FrameSequencer,
    samples: Vec<i16>,
}

impl Apu {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            reg_rw_mode: RwMode::None,
            reg_addr: 0,
            reg_data: 0,
            pulse1: Pulse::new(PulseId::Pulse1),
            pulse2: Pulse::new(PulseId::Pulse2),
            triangle: Triangle::default(),
            noise: Noise::default(),
            frame_sequencer: FrameSequencer::default(),
            samples: Vec::with_capacity(SAMPLES_PER_FRAME),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Frame interrupt output, connected to the CPU IRQ line.
    pub fn frame_interrupt(&self) -> bool {
        self.frame_sequencer.interrupt
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn clear_samples(&mut self) {
        self.samples.clear();
    }

    /// Advances the APU by one CPU cycle and appends one sample.
    pub fn step(&mut self) {
        if self.reg_rw_mode != RwMode::None {
            self.apply_register_access();
            self.reg_rw_mode = RwMode::None;
        }

        let tick = self.frame_sequencer.clock();
        if tick.quarter_frame {
            self.pulse1.quarter_frame();
            self.pulse2.quarter_frame();
            self.triangle.quarter_frame();
            self.noise.quarter_frame();
        }
        if tick.half_frame {
            self.pulse1.half_frame();
            self.pulse2.half_frame();
            self.triangle.half_frame();
            self.noise.half_frame();
        }
        if tick.odd_cycle {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
            self.noise.clock_timer();
        }
        self.triangle.clock_timer();

        if self.samples.len() < SAMPLES_PER_FRAME {
            let sample = self.mix();
            self.samples.push(sample);
        } else {
            trace!(target: "apu", "Sample buffer full, dropping sample");
        }
    }

    /// Approximation of the non-linear DAC, scaled to 0..=21000.
    fn mix(&self) -> i16 {
        let pulse = (self.pulse1.output() as u64 + self.pulse2.output() as u64) * 32298154;
        let tnd = self.triangle.output() as u64 * 36550171 + self.noise.output() as u64 * 21217138;
        ((pulse + tnd) / 42949672 * 500) as i16
    }

    fn apply_register_access(&mut self) {
        let addr = self.reg_addr;
        if self.reg_rw_mode == RwMode::Read {
            if addr == STATUS_REGISTER {
                self.reg_data = self.read_status();
            } else {
                trace!(target: "apu", "Read from write-only register {:04X}", addr);
            }
            return;
        }

        let value = self.reg_data;
        match addr {
            0x4000..=0x4003 => self.pulse1.write(addr & 3, value),
            0x4004..=0x4007 => self.pulse2.write(addr & 3, value),
            0x4008..=0x400B => self.triangle.write(addr & 3, value),
            0x400C..=0x400F => self.noise.write(addr & 3, value),
            STATUS_REGISTER => self.write_status(value),
            FRAME_COUNTER_REGISTER => self.frame_sequencer.write(value),
            _ => trace!(target: "apu", "Ignored write {:04X}={:02X}", addr, value),
        }
    }

    /// $4015 read: length counter status of each channel and the frame interrupt flag.
    fn read_status(&mut self) -> u8 {
        let value = (self.pulse1.length > 0) as u8
            | ((self.pulse2.length > 0) as u8) << 1
            | ((self.triangle.length > 0) as u8) << 2
            | ((self.noise.length > 0) as u8) << 3
            | (self.frame_sequencer.interrupt as u8) << 6;
        self.frame_sequencer.acknowledge_interrupt();
        value
    }

    /// $4015 write: enables channels, disabling a channel clears its length counter.
    fn write_status(&mut self, value: u8) {
        self.pulse1.enabled = value & 0x01 != 0;
        self.pulse2.enabled = value & 0x02 != 0;
        self.triangle.enabled = value & 0x04 != 0;
        self.noise.enabled = value & 0x08 != 0;
        if !self.pulse1.enabled {
            self.pulse1.length = 0;
        }
        if !self.pulse2.enabled {
            self.pulse2.length = 0;
        }
        if !self.triangle.enabled {
            self.triangle.length = 0;
        }
        if !self.noise.enabled {
            self.noise.length = 0;
        }
    }
}
