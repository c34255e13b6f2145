//! The audio processing unit and its five channels.
mod dmc;
mod envelope;
mod frame_sequencer;
mod length_counter;
mod noise;
mod pulse;
mod sweep;
mod triangle;

pub use dmc::{DmcRegister, DMC_RATES};
pub use envelope::Envelope;
pub use frame_sequencer::FrameSequencer;
pub use length_counter::LengthCounter;
pub use noise::NoiseRegister;
pub use pulse::PulseRegister;
pub use sweep::Sweep;
pub use triangle::TriangleRegister;

use log::*;
use serde::{Deserialize, Serialize};

use crate::core::{Cartridge, CPU_CLOCK_SPEED};

/// The rate at which the APU produces audio samples, in Hz
pub const SAMPLE_RATE: u32 = 44_100;

// CPU cycles between output samples
const CYCLES_PER_SAMPLE: f64 = CPU_CLOCK_SPEED as f64 / SAMPLE_RATE as f64;

pub const LENGTH_TABLE: [usize; 0x20] = [
    0x0A, 0xFE, 0x14, 0x02, 0x28, 0x04, 0x50, 0x06, 0xA0, 0x08, 0x3C, 0x0A, 0x0E, 0x0C, 0x1A, 0x0E,
    0x0C, 0x10, 0x18, 0x12, 0x30, 0x14, 0x60, 0x16, 0xC0, 0x18, 0x48, 0x1A, 0x10, 0x1C, 0x20, 0x1E,
];

const NOISE_TIMER_PERIODS: [u32; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// The APU of the NES.
///
/// Decodes the $4000-$4017 register writes, clocks the five channels every
/// CPU cycle, and mixes their outputs into a queue of `f32` samples at
/// [SAMPLE_RATE], drained with [Apu::sample_queue].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Apu {
    pub pulse_registers: [PulseRegister; 2],
    pub triangle_register: TriangleRegister,
    pub noise_register: NoiseRegister,
    pub dmc_register: DmcRegister,
    frame_sequencer: FrameSequencer,
    cycles: u64,
    // Fractional CPU cycles until the next output sample
    sample_timer: f64,
    queue: Vec<f32>,
}

impl Default for Apu {
    fn default() -> Apu {
        Apu::new()
    }
}

impl Apu {
    pub fn new() -> Apu {
        Apu {
            pulse_registers: [PulseRegister::new(true), PulseRegister::new(false)],
            triangle_register: TriangleRegister::default(),
            noise_register: NoiseRegister::default(),
            dmc_register: DmcRegister::default(),
            frame_sequencer: FrameSequencer::default(),
            cycles: 0,
            sample_timer: 0.0,
            queue: Vec::new(),
        }
    }
    /// Write a byte of data to the APU given its address in CPU memory space
    pub fn write_byte(&mut self, addr: usize, value: u8) {
        let t = &mut self.triangle_register;
        let n = &mut self.noise_register;
        let d = &mut self.dmc_register;
        match addr {
            0x4000..0x4004 => self.set_pulse_byte(0, addr, value),
            0x4004..0x4008 => self.set_pulse_byte(1, addr, value),
            0x4008 => {
                t.length_counter.halt = (value & 0x80) != 0;
                t.linear_counter_reload = (value & 0x7F) as usize;
            }
            0x4009 => {} // Unused
            0x400A => {
                t.timer_reload = (t.timer_reload & 0x700) | value as u32;
            }
            0x400B => {
                t.timer_reload = (t.timer_reload & 0x0FF) | ((value as u32 & 0x07) << 8);
                if t.enabled {
                    t.length_counter.load = LENGTH_TABLE[(value as usize & 0xF8) >> 3];
                }
                t.reload_flag = true;
            }
            0x400C => {
                n.length_counter.halt = (value & 0x20) != 0;
                n.envelope.constant = (value & 0x10) != 0;
                n.envelope.volume = (value & 0x0F) as usize;
            }
            0x400D => {} // Unused
            0x400E => {
                n.mode = (value & 0x80) != 0;
                n.timer_reload = NOISE_TIMER_PERIODS[(value & 0x0F) as usize];
            }
            0x400F => {
                if n.enabled {
                    n.length_counter.load = LENGTH_TABLE[(value as usize & 0xF8) >> 3];
                }
                n.envelope.restart();
            }
            0x4010 => {
                d.irq_enabled = (value & 0x80) != 0;
                if !d.irq_enabled {
                    d.irq_flag = false;
                }
                d.repeat = (value & 0x40) != 0;
                d.rate = DMC_RATES[(value & 0x0F) as usize];
                d.time_reload = d.rate;
                d.silent = false;
            }
            0x4011 => d.output = (value & 0x7F) as u32,
            0x4012 => {
                d.sample_addr = (value as usize * 64) + 0xC000;
                d.sample_index = d.sample_addr;
            }
            0x4013 => {
                d.sample_len = (value as usize) * 16 + 1;
            }
            0x4015 => {
                self.pulse_registers[0].set_enabled((value & 0x01) != 0);
                self.pulse_registers[1].set_enabled((value & 0x02) != 0);
                t.set_enabled((value & 0x04) != 0);
                n.set_enabled((value & 0x08) != 0);
                d.set_enabled((value & 0x10) != 0);
            }
            0x4017 => {
                if self.frame_sequencer.write_control(value) {
                    self.on_half_frame();
                    self.on_quarter_frame();
                }
            }
            _ => warn!("Trying to write {:X} to APU address {:X}", value, addr),
        }
    }
    /// Read a byte from the APU given its address in CPU memory space.
    /// Reading $4015 clears the frame IRQ flag.
    pub fn read_byte(&mut self, addr: usize) -> u8 {
        macro_rules! bit_flag {
            ($flag: expr, $bit: literal) => {
                if $flag {
                    0x01 << $bit
                } else {
                    0x00
                }
            };
        }
        match addr {
            0x4015 => {
                let v = bit_flag!(self.dmc_register.irq_flag, 7)
                    | bit_flag!(self.frame_sequencer.irq_flag, 6)
                    | bit_flag!(self.dmc_register.bytes_remaining > 0, 4)
                    | bit_flag!(self.noise_register.length_counter.load > 0, 3)
                    | bit_flag!(self.triangle_register.length_counter.load > 0, 2)
                    | bit_flag!(self.pulse_registers[1].length_counter.load > 0, 1)
                    | bit_flag!(self.pulse_registers[0].length_counter.load > 0, 0);
                self.frame_sequencer.irq_flag = false;
                v
            }
            _ => 0,
        }
    }
    fn set_pulse_byte(&mut self, pulse_index: usize, addr: usize, value: u8) {
        let reg = &mut self.pulse_registers[pulse_index];
        match addr % 4 {
            0 => {
                reg.duty = ((value & 0xC0) >> 6) as u32;
                reg.length_counter.halt = (value & 0x20) != 0;
                reg.envelope.constant = (value & 0x10) != 0;
                reg.envelope.volume = (value & 0x0F) as usize;
            }
            1 => reg.sweep.write(value),
            2 => {
                reg.timer_reload = (reg.timer_reload & 0x0700) | value as usize;
            }
            3 => {
                reg.timer_reload = (reg.timer_reload & 0x00FF) | ((value as usize & 0x07) << 8);
                if reg.enabled {
                    reg.length_counter.load = LENGTH_TABLE[(value as usize & 0xF8) >> 3];
                }
                reg.envelope.restart();
                reg.sequencer = 0;
            }
            _ => unreachable!(),
        }
    }
    /// Advance the APU by the given number of CPU cycles
    pub fn advance_cpu_cycles(&mut self, cpu_cycles: u32, cartridge: &Cartridge) {
        const MAX_QUEUE_LEN: usize = 2usize.pow(16);
        (0..cpu_cycles).for_each(|_| {
            let (quarter, half) = self.frame_sequencer.advance();
            if quarter {
                self.on_quarter_frame();
            }
            if half {
                self.on_half_frame();
            }
            // Pulse channels are clocked every other CPU cycle
            self.cycles += 1;
            if self.cycles % 2 == 0 {
                self.pulse_registers.iter_mut().for_each(|p| p.clock_timer());
            }
            self.triangle_register.clock_timer();
            self.noise_register.clock_timer();
            self.dmc_register.clock_timer(cartridge);
            // Subsample the mix at a fixed ratio of CPU cycles per sample
            self.sample_timer += 1.0;
            if self.sample_timer >= CYCLES_PER_SAMPLE {
                self.sample_timer -= CYCLES_PER_SAMPLE;
                if self.queue.len() < MAX_QUEUE_LEN {
                    self.queue.push(self.mixer_output());
                } else {
                    warn!("Max sample queue size hit");
                }
            }
        });
    }
    fn on_quarter_frame(&mut self) {
        self.pulse_registers.iter_mut().for_each(|reg| {
            reg.envelope.clock(reg.length_counter.halt);
        });
        self.noise_register
            .envelope
            .clock(self.noise_register.length_counter.halt);
        self.triangle_register.on_quarter_frame();
    }
    fn on_half_frame(&mut self) {
        self.pulse_registers
            .iter_mut()
            .for_each(|reg| reg.on_half_frame());
        self.triangle_register.length_counter.clock();
        self.noise_register.length_counter.clock();
    }
    /// The current output of the mixer, in [0, 1]
    pub fn mixer_output(&self) -> f32 {
        let pulse: u32 = self.pulse_registers.iter().map(|p| p.value()).sum();
        let pulse_out = if pulse == 0 {
            0.0
        } else {
            95.88 / ((8128.0 / pulse as f32) + 100.0)
        };
        let t = self.triangle_register.value();
        let n = self.noise_register.value();
        let d = self.dmc_register.value();
        let tnd_out = if t + n + d == 0 {
            0.0
        } else {
            159.79 / (1.0 / (t as f32 / 8227.0 + n as f32 / 12241.0 + d as f32 / 22638.0) + 100.0)
        };
        pulse_out + tnd_out
    }
    /// Take ownership of the queued audio samples, clearing the queue
    pub fn sample_queue(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.queue)
    }
    /// Whether the APU is currently requesting an interrupt
    pub fn irq(&self) -> bool {
        self.frame_sequencer.irq_flag || self.dmc_register.irq_flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_counter_load() {
        let mut apu = Apu::new();
        apu.write_byte(0x4015, 0x01);
        // Length index 1 loads the longest entry
        apu.write_byte(0x4003, 1 << 3);
        assert_eq!(apu.pulse_registers[0].length_counter.load, 0xFE);
    }
    #[test]
    fn test_length_counter_ignored_when_disabled() {
        let mut apu = Apu::new();
        apu.write_byte(0x4003, 1 << 3);
        assert_eq!(apu.pulse_registers[0].length_counter.load, 0);
    }
    #[test]
    fn test_status_read() {
        let mut apu = Apu::new();
        apu.write_byte(0x4015, 0x0F);
        apu.write_byte(0x4003, 1 << 3);
        apu.write_byte(0x400F, 1 << 3);
        assert_eq!(apu.read_byte(0x4015), 0x09);
    }
    #[test]
    fn test_status_read_clears_frame_irq() {
        let mut apu = Apu::new();
        let cart = Cartridge::default();
        // Enable the frame IRQ and run one full 4-step sequence
        apu.write_byte(0x4017, 0x00);
        apu.advance_cpu_cycles(29828 + 4, &cart);
        assert!(apu.irq());
        assert_eq!(apu.read_byte(0x4015) & 0x40, 0x40);
        assert!(!apu.irq());
    }
    #[test]
    fn test_sweep_mutes_below_minimum_period() {
        let mut apu = Apu::new();
        let cart = Cartridge::default();
        apu.write_byte(0x4015, 0x01);
        apu.write_byte(0x4000, 0x3F);
        apu.write_byte(0x4002, 0x07);
        apu.write_byte(0x4003, 1 << 3);
        apu.advance_cpu_cycles(2, &cart);
        assert!(apu.pulse_registers[0].muted());
    }
    #[test]
    fn test_debug_formatting_covers_the_sequencer() {
        let apu = Apu::new();
        assert!(format!("{:?}", apu).contains("frame_sequencer"));
    }
    #[test]
    fn test_sample_pacing() {
        let mut apu = Apu::new();
        let cart = Cartridge::default();
        apu.advance_cpu_cycles(CPU_CLOCK_SPEED, &cart);
        let n = apu.sample_queue().len() as i64;
        assert!((n - SAMPLE_RATE as i64).abs() <= 1, "got {} samples", n);
        // The queue was drained by the take
        assert!(apu.sample_queue().is_empty());
    }
}
