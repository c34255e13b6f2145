use log::*;

use super::{
    mappers::{CnRom, NRom, SxRom, UxRom},
    CartridgeMemory, Mirroring,
};

/// The bank-switching hardware of a cartridge.
///
/// A mapper decides which PRG/CHR bank serves a given address, usually by
/// latching bank numbers from writes into ROM address space. It can also
/// override the cartridge's nametable mirroring (the CIRAM A10 decision).
///
/// Implementations hold only latches and bank indices, never the ROM/RAM
/// itself; the backing memory is passed in on every access so that bank
/// switching is just reassigning an index.
#[typetag::serde(tag = "mapper")]
pub trait Mapper {
    /// The iNES mapper number this implements.
    fn mapper_num(&self) -> u32;
    /// Read a byte given an address in CPU space ($4020-$FFFF).
    fn read_cpu(&self, cpu_addr: usize, mem: &CartridgeMemory) -> u8;
    /// Write a byte given an address in CPU space ($4020-$FFFF).
    fn write_cpu(&mut self, cpu_addr: usize, mem: &mut CartridgeMemory, value: u8);
    /// Read a byte given an address in PPU space ($0000-$1FFF).
    fn read_ppu(&self, ppu_addr: usize, mem: &CartridgeMemory) -> u8;
    /// Write a byte given an address in PPU space ($0000-$1FFF).
    fn write_ppu(&mut self, ppu_addr: usize, mem: &mut CartridgeMemory, value: u8);
    /// The mirroring the mapper currently imposes, or [None] to use the
    /// arrangement from the cartridge header.
    fn mirroring(&self) -> Option<Mirroring> {
        None
    }
    /// Called once per batch of executed CPU cycles, for mappers with
    /// cycle-coupled latches.
    fn on_cpu_cycles(&mut self, _cycles: u32) {}
}

/// Create the mapper for a given iNES mapper number.
///
/// An unrecognised number is reported and falls back to the fixed NROM
/// mapping so that the cartridge still loads; behaviour will be incorrect
/// but execution will not crash.
pub fn get_mapper(mapper_num: u32) -> Box<dyn Mapper> {
    match mapper_num {
        0 => Box::new(NRom::default()),
        1 => Box::new(SxRom::default()),
        2 => Box::new(UxRom::default()),
        3 => Box::new(CnRom::default()),
        n => {
            warn!("Unsupported mapper {}, falling back to fixed NROM mapping", n);
            Box::new(NRom::default())
        }
    }
}

/// Resolve an address through a bank window: `offset` is reduced to a
/// position within the window, served by bank `bank_num`.
pub fn bank_addr(bank_size: usize, bank_num: usize, offset: usize) -> usize {
    bank_size * bank_num + (offset % bank_size)
}

/// The number of banks of a given size in a ROM.
pub fn num_banks(bank_size: usize, rom: &[u8]) -> usize {
    rom.len() / bank_size
}
