//! Cycle accurate emulation of the NTSC NES.
//!
//! [System] ties the independent components together: every tick runs three PPU dots, one
//! APU cycle and one CPU cycle (or one cycle of sprite DMA), routing the bus requests raised by
//! each component through the [main_bus::MainBus].
pub mod common;
pub mod components;
pub mod controller;
pub mod main_bus;

use std::path::Path;

use anyhow::Result;
use log::debug;

use crate::common::bus::RwMode;
use crate::common::util::EdgeDetector;
use crate::components::apu::SAMPLES_PER_FRAME;
use crate::components::apu::SAMPLE_RATE;
use crate::components::cartridge::Cartridge;
use crate::components::cpu::Cpu;
use crate::components::ppu::Emphasis;
use crate::components::ppu::DOTS_PER_SCANLINE;
use crate::components::ppu::SCANLINES_PER_FRAME;
use crate::components::ppu::VBLANK_SCANLINE;
use crate::controller::StandardController;
use crate::main_bus::MainBus;

/// CPU cycles per video frame.
pub const CYCLES_PER_FRAME: usize = 29781;

pub const FRAME_WIDTH: usize = 256;
pub const FRAME_HEIGHT: usize = 224;
/// The visible window skips the top 8 scanlines and the 2 dot pipeline delay of the PPU.
const FRAME_OFFSET: usize = 2 + 8 * DOTS_PER_SCANLINE as usize;

const FRAMEBUFFER_SIZE: usize = DOTS_PER_SCANLINE as usize * SCANLINES_PER_FRAME as usize;

/// One frame of video as palette indices, `FRAME_WIDTH` x `FRAME_HEIGHT`.
#[derive(Clone, Debug, Default)]
pub struct VideoFrame {
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub odd_frame: bool,
    pub emphasis: Emphasis,
}

impl VideoFrame {
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(self.width)
    }
}

/// One frame of audio, signed 16 bit mono samples.
#[derive(Clone, Debug, Default)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

pub trait VideoSink {
    fn video_frame(&mut self, frame: &VideoFrame);
}

pub trait AudioSink {
    fn audio_frame(&mut self, frame: &AudioFrame);
}

/// Provides the button state of a controller port (0 or 1) when the game latches the
/// controllers.
pub trait InputProvider {
    fn controller_state(&mut self, port: usize) -> StandardController;
}

impl<F: FnMut(&VideoFrame)> VideoSink for F {
    fn video_frame(&mut self, frame: &VideoFrame) {
        self(frame)
    }
}

impl<F: FnMut(&AudioFrame)> AudioSink for F {
    fn audio_frame(&mut self, frame: &AudioFrame) {
        self(frame)
    }
}

impl<F: FnMut(usize) -> StandardController> InputProvider for F {
    fn controller_state(&mut self, port: usize) -> StandardController {
        self(port)
    }
}

/// The console with one cartridge inserted.
pub struct System {
    pub cpu: Cpu,
    pub bus: MainBus,
    framebuffer: Vec<u8>,
    vbl: EdgeDetector,
    video_frame: VideoFrame,
    video_ready: bool,
    audio_frame: AudioFrame,
    audio_ready: bool,
}

impl System {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cpu: Cpu::new(),
            bus: MainBus::new(cartridge),
            framebuffer: vec![0; FRAMEBUFFER_SIZE],
            vbl: EdgeDetector::new(),
            video_frame: VideoFrame {
                pixels: vec![0; FRAME_WIDTH * FRAME_HEIGHT],
                width: FRAME_WIDTH,
                height: FRAME_HEIGHT,
                ..Default::default()
            },
            video_ready: false,
            audio_frame: AudioFrame {
                samples: Vec::with_capacity(SAMPLES_PER_FRAME),
                sample_rate: SAMPLE_RATE,
            },
            audio_ready: false,
        }
    }

    pub fn with_ines_file(path: &Path) -> Result<Self> {
        Ok(Self::new(Cartridge::with_ines_file(path)?))
    }

    /// Resets CPU, PPU, APU, DMA and controllers. RAM and the cartridge are left untouched.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.reset();
        self.vbl = EdgeDetector::new();
        self.video_ready = false;
        self.audio_ready = false;
    }

    /// Runs one CPU cycle. Completed video and audio frames are held until delivered by
    /// [System::frame].
    pub fn tick(&mut self) {
        self.ppu_tick();
        // Register reads are answered by the PPU step following the request.
        if self.cpu_reading(0x2000..=0x3FFF) {
            self.cpu.data = self.bus.ppu.reg_data;
        }
        self.ppu_tick();
        self.ppu_tick();

        // NMI is raised on the rising edge of the PPU vblank output.
        self.vbl.update_signal(self.bus.ppu.vbl);
        if self.vbl.consume_rise() {
            self.cpu.nmi = true;
        }

        self.apu_tick();
        if self.cpu_reading(0x4015..=0x4015) {
            self.cpu.data = self.bus.apu.reg_data;
        }
        self.cpu.irq = self.bus.apu.frame_interrupt();

        if self.bus.dma.active() {
            self.bus.dma_step();
        } else {
            self.cpu.step();
            self.bus.resolve_cpu_access(&mut self.cpu);
        }

        self.bus.odd_cycle = !self.bus.odd_cycle;
        self.bus.cycle += 1;
    }

    /// Runs one frame worth of CPU cycles, delivering the completed video and audio frames to
    /// the sinks. `input` is queried whenever the game latches the controllers.
    pub fn frame(
        &mut self,
        video: &mut impl VideoSink,
        audio: &mut impl AudioSink,
        input: &mut impl InputProvider,
    ) {
        for _ in 0..CYCLES_PER_FRAME {
            self.tick();
            if self.bus.latch_requested {
                let controllers = [input.controller_state(0), input.controller_state(1)];
                self.bus.latch_controllers(controllers);
            }
            if self.video_ready {
                video.video_frame(&self.video_frame);
                self.video_ready = false;
            }
            if self.audio_ready {
                audio.audio_frame(&self.audio_frame);
                self.audio_ready = false;
            }
        }
    }

    /// Runs `count` frames without input, discarding their output.
    pub fn execute_frames(&mut self, count: u64) {
        debug!("Executing {} frames", count);
        for _ in 0..count {
            self.frame(
                &mut |_: &VideoFrame| {},
                &mut |_: &AudioFrame| {},
                &mut |_: usize| StandardController::default(),
            );
        }
    }

    /// Palette indices of all 341 x 262 dots of the last frame.
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    fn cpu_reading(&self, range: std::ops::RangeInclusive<u16>) -> bool {
        self.cpu.rw_mode == RwMode::Read && range.contains(&self.cpu.address)
    }

    fn ppu_tick(&mut self) {
        self.bus.resolve_ppu_access();
        let ppu = &mut self.bus.ppu;
        ppu.step();
        let index = ppu.scanline as usize * DOTS_PER_SCANLINE as usize + ppu.dot as usize;
        self.framebuffer[index] = ppu.color_out;
        if ppu.scanline == VBLANK_SCANLINE && ppu.dot == 0 {
            self.capture_video_frame();
        }
    }

    fn capture_video_frame(&mut self) {
        let ppu = &self.bus.ppu;
        self.video_frame.odd_frame = ppu.odd_frame();
        self.video_frame.emphasis = ppu.emphasis();
        for (y, row) in self
            .video_frame
            .pixels
            .chunks_mut(FRAME_WIDTH)
            .enumerate()
        {
            let start = FRAME_OFFSET + y * DOTS_PER_SCANLINE as usize;
            row.copy_from_slice(&self.framebuffer[start..start + FRAME_WIDTH]);
        }
        self.video_ready = true;
    }

    fn apu_tick(&mut self) {
        let apu = &mut self.bus.apu;
        apu.step();
        if apu.sample_count() == SAMPLES_PER_FRAME {
            self.audio_frame.samples.clear();
            self.audio_frame.samples.extend_from_slice(apu.samples());
            apu.clear_samples();
            self.audio_ready = true;
        }
    }
}
