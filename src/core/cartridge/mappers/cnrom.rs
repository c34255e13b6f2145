use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

use crate::core::{bank_addr, CartridgeMemory, Mapper, OPEN_BUS};

/// CNROM (mapper 3): fixed PRG mapping with a switchable 8KB CHR bank.
#[derive(Default, Serialize, Deserialize)]
pub struct CnRom {
    chr_bank: usize,
}

#[typetag::serde]
impl Mapper for CnRom {
    fn mapper_num(&self) -> u32 {
        3
    }
    fn read_cpu(&self, cpu_addr: usize, mem: &CartridgeMemory) -> u8 {
        if cpu_addr < 0x8000 {
            return OPEN_BUS;
        }
        mem.read_prg_rom(cpu_addr - 0x8000)
    }
    fn write_cpu(&mut self, cpu_addr: usize, _mem: &mut CartridgeMemory, value: u8) {
        if cpu_addr >= 0x8000 {
            self.chr_bank = (value & 0x03) as usize;
        }
    }
    fn read_ppu(&self, ppu_addr: usize, mem: &CartridgeMemory) -> u8 {
        mem.read_chr(bank_addr(0x2000, self.chr_bank, ppu_addr))
    }
    fn write_ppu(&mut self, ppu_addr: usize, mem: &mut CartridgeMemory, value: u8) {
        mem.write_chr(bank_addr(0x2000, self.chr_bank, ppu_addr), value)
    }
}

impl Display for CnRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNROM")
    }
}
impl Debug for CnRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNROM bank={}", self.chr_bank)
    }
}
