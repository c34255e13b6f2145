//! The actual emulation code, provided as a library.
//!
//! Contains the entire state of the console, and updates it accordingly as
//! the machine is advanced. The visual output is stored as a 256x240 buffer
//! of palette indices (see [FrameBuffer]), and the audio output as a queue of
//! normalized floating point samples.
//!
//! The [Emulator] type adds real-time pacing on top of the raw machine state
//! in [Nes]:
//! ```
//! use famicore::core::{Nes, Settings};
//! // The actual state of the console, with no cartridge inserted
//! let mut nes = Nes::new();
//! let settings = Settings::default();
//! // Advance the console by one instruction
//! nes.advance_instruction(&settings);
//! // Advance the console by one frame's worth of CPU cycles
//! nes.advance_frame(&settings);
//! ```
mod nes;
pub use nes::{Nes, CPU_CYCLES_PER_OAM};
mod cpu;
pub use cpu::Cpu;
mod apu;
pub use apu::{Apu, FrameSequencer, SAMPLE_RATE};
mod status_register;
pub use status_register::StatusRegister;
mod cartridge;
pub use cartridge::*;
pub mod opcodes;
mod ppu;
pub use ppu::{FrameBuffer, Ppu};
mod palette;
pub use palette::PALETTE;
mod controller;
pub use controller::{Controller, ControllerPort};
mod settings;
pub use settings::Settings;
mod emulator;
pub use emulator::{AudioSink, Emulator, RunState, VideoSink, FRAME_PERIOD};

/// The clock speed of the console's CPU, in hertz.
pub const CPU_CLOCK_SPEED: u32 = 1_789_773;
/// The number of CPU cycles in one frame.
///
/// The PPU runs 341 dots x 262 scanlines = 89342 dots per frame, at 3 dots
/// per CPU cycle.
pub const CYCLES_PER_FRAME: f64 = 89342.0 / 3.0;
/// The location of the non-maskable interrupt's vector.
pub const NMI_VECTOR: usize = 0xFFFA;
/// The location of the reset interrupt vector.
pub const RESET_VECTOR: usize = 0xFFFC;
/// The location of the maskable interrupt (IRQ/BRK) vector.
pub const IRQ_VECTOR: usize = 0xFFFE;
/// The width of the visible picture, in pixels.
pub const SCREEN_WIDTH: usize = 256;
/// The height of the visible picture, in pixels.
pub const SCREEN_HEIGHT: usize = 240;
/// The byte answered by unmapped reads (an absent cartridge, missing PRG RAM,
/// and so on). Real hardware would answer with whatever decayed on the bus;
/// a fixed value keeps emulation deterministic.
pub const OPEN_BUS: u8 = 0xFF;

/// The debug palette, used instead of the palette ram if
/// [Settings::use_debug_palette] is `true`.
pub const DEBUG_PALETTE: [u8; 32] = [
    0x1D, 0x01, 0x11, 0x21, 0x1D, 0x05, 0x15, 0x25, 0x1D, 0x09, 0x19, 0x29, 0x1D, 0x06, 0x16, 0x26,
    0x1D, 0x13, 0x23, 0x33, 0x1D, 0x17, 0x27, 0x37, 0x1D, 0x1B, 0x2B, 0x3B, 0x1D, 0x18, 0x28, 0x38,
];
