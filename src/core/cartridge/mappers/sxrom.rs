use std::fmt::{Debug, Display};

use log::*;
use serde::{Deserialize, Serialize};

use crate::core::{bank_addr, num_banks, CartridgeMemory, Mapper, Mirroring, OPEN_BUS};

/// MMC1/SxROM (mapper 1): serial-register bank switching.
///
/// Writes to ROM space feed one bit at a time into a 5-bit shift register
/// (a write with the high bit set resets it). The fifth bit dispatches the
/// assembled value to the control, CHR bank, or PRG bank register depending
/// on which $2000-sized address range received it. Only the first write of
/// each CPU cycle takes effect.
#[derive(Serialize, Deserialize)]
pub struct SxRom {
    shift: u8,
    control: u8,
    chr_bank_0: usize,
    chr_bank_1: usize,
    prg_bank: usize,
    // Whether a write has already landed this CPU cycle
    has_written: bool,
}

// Bit 0 of the shift register marks the fifth write once it has shifted down
const SHIFT_RESET: u8 = 0x10;

impl Default for SxRom {
    fn default() -> SxRom {
        SxRom {
            shift: SHIFT_RESET,
            // Power on in PRG mode 3 (fixed last bank at $C000)
            control: 0x0C,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
            has_written: false,
        }
    }
}

impl SxRom {
    // Resolve a CHR address through the current CHR banking mode
    fn chr_addr(&self, ppu_addr: usize) -> usize {
        if self.control & 0x10 == 0 {
            // One switched 8KB bank
            bank_addr(0x2000, (self.chr_bank_0 & 0x1E) >> 1, ppu_addr)
        } else if ppu_addr < 0x1000 {
            bank_addr(0x1000, self.chr_bank_0, ppu_addr)
        } else {
            bank_addr(0x1000, self.chr_bank_1, ppu_addr)
        }
    }
}

#[typetag::serde]
impl Mapper for SxRom {
    fn mapper_num(&self) -> u32 {
        1
    }
    fn read_cpu(&self, cpu_addr: usize, mem: &CartridgeMemory) -> u8 {
        if cpu_addr < 0x6000 {
            return OPEN_BUS;
        }
        if cpu_addr < 0x8000 {
            return mem.read_prg_ram(cpu_addr - 0x6000);
        }
        let addr = match (self.control & 0x0C) >> 2 {
            // One switched 32KB bank
            0 | 1 => bank_addr(0x8000, (self.prg_bank & 0x0E) >> 1, cpu_addr),
            // First bank fixed at $8000, switched 16KB bank at $C000
            2 => {
                if cpu_addr < 0xC000 {
                    bank_addr(0x4000, 0, cpu_addr)
                } else {
                    bank_addr(0x4000, self.prg_bank & 0x0F, cpu_addr)
                }
            }
            // Switched 16KB bank at $8000, last bank fixed at $C000
            _ => {
                if cpu_addr < 0xC000 {
                    bank_addr(0x4000, self.prg_bank & 0x0F, cpu_addr)
                } else {
                    bank_addr(
                        0x4000,
                        num_banks(0x4000, &mem.prg_rom).saturating_sub(1),
                        cpu_addr,
                    )
                }
            }
        };
        mem.read_prg_rom(addr)
    }
    fn write_cpu(&mut self, cpu_addr: usize, mem: &mut CartridgeMemory, value: u8) {
        if self.has_written {
            return;
        }
        self.has_written = true;
        if cpu_addr < 0x8000 {
            if cpu_addr >= 0x6000 {
                mem.write_prg_ram(cpu_addr - 0x6000, value);
            }
            return;
        }
        if value & 0x80 != 0 {
            // Reset, and lock PRG mode back to 3
            self.shift = SHIFT_RESET;
            self.control |= 0x0C;
            return;
        }
        let full = (self.shift & 0x01) != 0;
        let assembled = (self.shift >> 1) | ((value & 0x01) << 4);
        if full {
            match cpu_addr {
                0x8000..=0x9FFF => {
                    self.control = assembled;
                    debug!("MMC1 control set to {:#07b}", assembled);
                }
                0xA000..=0xBFFF => self.chr_bank_0 = assembled as usize,
                0xC000..=0xDFFF => self.chr_bank_1 = assembled as usize,
                _ => self.prg_bank = assembled as usize,
            }
            self.shift = SHIFT_RESET;
        } else {
            self.shift = assembled;
        }
    }
    fn read_ppu(&self, ppu_addr: usize, mem: &CartridgeMemory) -> u8 {
        mem.read_chr(self.chr_addr(ppu_addr))
    }
    fn write_ppu(&mut self, ppu_addr: usize, mem: &mut CartridgeMemory, value: u8) {
        mem.write_chr(self.chr_addr(ppu_addr), value);
    }
    fn mirroring(&self) -> Option<Mirroring> {
        Some(match self.control & 0x03 {
            0 => Mirroring::OneScreenLow,
            1 => Mirroring::OneScreenHigh,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        })
    }
    fn on_cpu_cycles(&mut self, _cycles: u32) {
        self.has_written = false;
    }
}

impl Display for SxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SxROM")
    }
}
impl Debug for SxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SxROM control={:#X} shift={:#X} prg={} chr=({}, {})",
            self.control, self.shift, self.prg_bank, self.chr_bank_0, self.chr_bank_1
        )
    }
}
