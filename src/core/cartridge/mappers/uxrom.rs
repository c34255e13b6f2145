use std::fmt::{Debug, Display};

use log::*;
use serde::{Deserialize, Serialize};

use crate::core::{bank_addr, num_banks, CartridgeMemory, Mapper, OPEN_BUS};

const BANK_SIZE: usize = 0x4000;

/// UxROM (mapper 2): a switchable 16KB PRG window at $8000 and the last
/// bank fixed at $C000. Any write to ROM space selects the bank.
#[derive(Default, Serialize, Deserialize)]
pub struct UxRom {
    bank: usize,
}

#[typetag::serde]
impl Mapper for UxRom {
    fn mapper_num(&self) -> u32 {
        2
    }
    fn read_cpu(&self, cpu_addr: usize, mem: &CartridgeMemory) -> u8 {
        if cpu_addr < 0x8000 {
            warn!("Reading PRG RAM when there is none (addr={:#X})", cpu_addr);
            OPEN_BUS
        } else if cpu_addr >= 0xC000 {
            // Fixed to the last bank
            mem.read_prg_rom(bank_addr(
                BANK_SIZE,
                num_banks(BANK_SIZE, &mem.prg_rom).saturating_sub(1),
                cpu_addr,
            ))
        } else {
            mem.read_prg_rom(bank_addr(BANK_SIZE, self.bank, cpu_addr))
        }
    }
    fn write_cpu(&mut self, cpu_addr: usize, _mem: &mut CartridgeMemory, value: u8) {
        if cpu_addr >= 0x8000 {
            self.bank = value as usize;
        }
    }
    fn read_ppu(&self, ppu_addr: usize, mem: &CartridgeMemory) -> u8 {
        mem.read_chr(ppu_addr)
    }
    fn write_ppu(&mut self, ppu_addr: usize, mem: &mut CartridgeMemory, value: u8) {
        mem.write_chr(ppu_addr, value)
    }
}

impl Display for UxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UxROM")
    }
}
impl Debug for UxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UxROM bank={}", self.bank)
    }
}
