use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::core::Cartridge;

pub const DMC_RATES: [u32; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

#[derive(Clone, Serialize, Deserialize)]
/// The APU's delta modulation channel.
///
/// Plays 1-bit delta encoded samples fetched over the CPU bus, moving a
/// 7-bit output accumulator up or down by 2 per bit. Can raise a CPU
/// interrupt when the sample ends.
pub struct DmcRegister {
    /// Whether the IRQ is enabled
    pub irq_enabled: bool,
    /// The IRQ flag
    pub irq_flag: bool,
    /// Whether to repeat the sample after playing it
    pub repeat: bool,
    /// The DMC rate, in CPU cycles per output bit
    pub rate: u32,
    pub timer: u32,
    /// The value to reload the timer with when it runs out
    pub time_reload: u32,
    /// Address of the sample, in CPU memory space
    pub sample_addr: usize,
    /// Length of the sample in bytes
    pub sample_len: usize,
    /// Address of the byte currently being read from the sample
    pub sample_index: usize,
    /// Number of bytes remaining in the sample
    pub bytes_remaining: usize,
    /// Byte of the sample currently buffered
    pub sample: u8,
    /// Number of bits left in `sample` to play
    pub bits_left: u32,
    /// The output accumulator, 0-127
    pub output: u32,
    pub silent: bool,
}
impl Default for DmcRegister {
    fn default() -> Self {
        DmcRegister {
            irq_enabled: false,
            irq_flag: false,
            repeat: false,
            rate: DMC_RATES[0],
            timer: 0,
            time_reload: 0,
            sample_addr: 0,
            sample_len: 0,
            sample_index: 0,
            bytes_remaining: 0,
            sample: 0,
            bits_left: 0,
            output: 0,
            silent: true,
        }
    }
}
impl DmcRegister {
    pub fn value(&self) -> u32 {
        self.output
    }
    /// Enable or disable the channel via $4015
    pub fn set_enabled(&mut self, enabled: bool) {
        self.irq_flag = false;
        if enabled {
            if self.bytes_remaining == 0 {
                self.silent = false;
                self.timer = 0;
                self.bits_left = 0;
                self.bytes_remaining = self.sample_len;
                self.sample_index = self.sample_addr;
            }
        } else {
            self.bytes_remaining = 0;
        }
    }
    /// Load the byte at `sample_index` into the shift register and advance
    /// the index past it
    fn load_sample(&mut self, cartridge: &Cartridge) {
        self.sample = cartridge.read_cpu(self.sample_index);
        self.sample_index += 1;
        self.bits_left = 8;
    }
    /// Clock the channel's timer, done every CPU cycle
    pub fn clock_timer(&mut self, cartridge: &Cartridge) {
        self.timer = (self.timer + 1) % self.time_reload.max(1);
        if self.timer != 0 {
            return;
        }
        if !self.silent {
            self.output = (self.output as i32 + if self.sample & 0x01 == 1 { 2 } else { -2 })
                .clamp(0, 127) as u32;
        }
        self.sample >>= 1;
        self.bits_left = self.bits_left.saturating_sub(1);
        if self.bits_left == 0 {
            match self.bytes_remaining {
                0 => {}
                1 => {
                    if self.repeat {
                        self.bytes_remaining = self.sample_len;
                        self.sample_index = self.sample_addr;
                        self.load_sample(cartridge);
                    } else {
                        self.silent = true;
                        self.bytes_remaining = 0;
                        if self.irq_enabled {
                            self.irq_flag = true;
                        }
                    }
                }
                _ => {
                    self.bytes_remaining -= 1;
                    self.load_sample(cartridge);
                    self.silent = false;
                }
            }
        }
    }
}
impl Debug for DmcRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bytes_remaining={:X} silent={} timer={:3X} repeat={} sample_addr={:X} sample_len={:X} IRQ={} output={}",
            self.bytes_remaining,
            self.silent,
            self.time_reload,
            self.repeat,
            self.sample_addr,
            self.sample_len,
            self.irq_enabled,
            self.output
        )
    }
}
