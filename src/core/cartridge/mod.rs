mod mapper;
pub use mapper::{bank_addr, get_mapper, num_banks, Mapper};
pub mod mappers;

use std::fmt::{Debug, Display};

use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::OPEN_BUS;

/// The size of one PRG ROM bank as counted by the cartridge header.
pub const PRG_BANK_SIZE: usize = 0x4000;
/// The size of one CHR ROM bank as counted by the cartridge header.
pub const CHR_BANK_SIZE: usize = 0x2000;
// Offset in PRG RAM where a trainer is placed, i.e. CPU address $7000
const TRAINER_OFFSET: usize = 0x1000;

/// An error encountered while parsing a cartridge file.
///
/// This is the only failure the core ever reports; a failed load leaves the
/// console with an absent cartridge that answers all accesses harmlessly.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("bad file signature {0:02X?}, expected \"NES\\x1A\"")]
    BadSignature([u8; 4]),
    #[error("file truncated: header promises {expected} bytes, file holds {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("savedata is {actual} bytes, cartridge has {expected} bytes of PRG RAM")]
    BadSavedata { expected: usize, actual: usize },
}

/// The nametable mirroring modes a cartridge can select.
///
/// The console has two 1KB nametable RAM banks but addresses four logical
/// nametables; the cartridge's CIRAM A10 wiring decides which physical bank
/// serves which address.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Mirroring {
    /// $2000=$2400 and $2800=$2C00
    Horizontal,
    /// $2000=$2800 and $2400=$2C00
    Vertical,
    /// All four nametables serve the first bank
    OneScreenLow,
    /// All four nametables serve the second bank
    OneScreenHigh,
    /// No mirroring; requires cartridge VRAM this core folds onto the two
    /// internal banks
    FourScreen,
}

impl Mirroring {
    /// Resolve a nametable address ($2000-$2FFF or its mirror) to an offset
    /// into the console's 2KB nametable RAM.
    pub fn nametable_offset(&self, addr: usize) -> usize {
        match self {
            Mirroring::Horizontal => ((addr >> 1) & 0x400) | (addr & 0x3FF),
            Mirroring::Vertical => addr & 0x7FF,
            Mirroring::OneScreenLow => addr & 0x3FF,
            Mirroring::OneScreenHigh => 0x400 | (addr & 0x3FF),
            Mirroring::FourScreen => addr & 0x7FF,
        }
    }
}

/// All memory in the cartridge that isn't mapper-specific.
///
/// Contains PRG/CHR ROM and RAM. Does not contain any latches, banks, or
/// dividers used by mappers.
#[derive(Clone, Serialize, Deserialize)]
pub struct CartridgeMemory {
    /// Program ROM, in 16KB header banks
    pub prg_rom: Vec<u8>,
    /// Program RAM, mapped at $6000-$7FFF
    pub prg_ram: Vec<u8>,
    /// Character ROM, in 8KB header banks
    pub chr_rom: Vec<u8>,
    /// Character RAM, present when the cartridge has no CHR ROM
    pub chr_ram: Vec<u8>,
}

impl CartridgeMemory {
    /// Read a byte of PRG ROM, wrapping the address into the ROM.
    /// Answers open bus if there is no PRG ROM at all.
    pub fn read_prg_rom(&self, addr: usize) -> u8 {
        if self.prg_rom.is_empty() {
            return OPEN_BUS;
        }
        self.prg_rom[addr % self.prg_rom.len()]
    }
    /// Read a byte of PRG RAM, or open bus if there is none.
    pub fn read_prg_ram(&self, addr: usize) -> u8 {
        if self.prg_ram.is_empty() {
            return OPEN_BUS;
        }
        self.prg_ram[addr % self.prg_ram.len()]
    }
    /// Write a byte of PRG RAM, if present.
    pub fn write_prg_ram(&mut self, addr: usize, value: u8) {
        if !self.prg_ram.is_empty() {
            let i = addr % self.prg_ram.len();
            self.prg_ram[i] = value;
        }
    }
    /// Read a byte from CHR ROM or (if CHR ROM is empty) CHR RAM.
    ///
    /// A cartridge has one or the other, so this reads "whatever CHR storage
    /// the cartridge is using".
    pub fn read_chr(&self, addr: usize) -> u8 {
        if self.chr_rom.is_empty() {
            if self.chr_ram.is_empty() {
                return OPEN_BUS;
            }
            return self.chr_ram[addr % self.chr_ram.len()];
        }
        self.chr_rom[addr % self.chr_rom.len()]
    }
    /// Write a byte to CHR RAM, if present. Writes to CHR ROM are ignored.
    pub fn write_chr(&mut self, addr: usize, value: u8) {
        if !self.chr_ram.is_empty() {
            let i = addr % self.chr_ram.len();
            self.chr_ram[i] = value;
        }
    }
}

/// A cartridge, or the absence of one.
///
/// Owns the cartridge's ROM and RAM in a [CartridgeMemory] and the [Mapper]
/// deciding which bank serves each address. Created once per loaded file and
/// replaced wholesale on a new load; never restructured in place.
#[derive(Serialize, Deserialize)]
pub struct Cartridge {
    /// The memory in the cartridge
    pub memory: CartridgeMemory,
    /// The mapper the cartridge is using
    pub mapper: Box<dyn Mapper>,
    // Mirroring from the header; the mapper may override it
    header_mirroring: Mirroring,
    // Whether the cartridge has battery backed RAM that should be persisted
    has_battery_ram: bool,
    // True for the placeholder cartridge used when nothing is loaded
    absent: bool,
}

impl Cartridge {
    /// The placeholder used when no cartridge is loaded (or a load failed).
    /// Answers every read with the open bus byte and ignores every write.
    pub fn absent() -> Cartridge {
        Cartridge {
            memory: CartridgeMemory {
                prg_rom: Vec::new(),
                prg_ram: Vec::new(),
                chr_rom: Vec::new(),
                chr_ram: Vec::new(),
            },
            mapper: get_mapper(0),
            header_mirroring: Mirroring::Horizontal,
            has_battery_ram: false,
            absent: true,
        }
    }
    /// Parse a cartridge from the contents of an iNES (.nes) file.
    ///
    /// * `bytes` - the contents of the file.
    /// * `savedata` - previously persisted battery-backed RAM, used to seed
    ///   PRG RAM if present.
    pub fn parse(bytes: &[u8], savedata: Option<Vec<u8>>) -> Result<Cartridge, CartridgeError> {
        if bytes.len() < 16 || bytes[0..4] != [b'N', b'E', b'S', 0x1A] {
            let mut sig = [0; 4];
            bytes.iter().take(4).enumerate().for_each(|(i, b)| sig[i] = *b);
            return Err(CartridgeError::BadSignature(sig));
        }
        let prg_rom_size = PRG_BANK_SIZE * bytes[4] as usize;
        let chr_rom_size = CHR_BANK_SIZE * bytes[5] as usize;
        let prg_ram_size = (bytes[8] as usize).max(1) * 0x2000;
        // Cartridges without CHR ROM carry 8KB of CHR RAM instead
        let chr_ram_size = if chr_rom_size == 0 { 0x2000 } else { 0 };
        let has_battery_ram = (bytes[6] & 0x02) != 0;
        let has_trainer = (bytes[6] & 0x04) != 0;
        // Four-screen beats vertical beats horizontal
        let header_mirroring = if (bytes[6] & 0x08) != 0 {
            warn!("Four-screen cartridge, folding onto the two internal nametable banks");
            Mirroring::FourScreen
        } else if (bytes[6] & 0x01) != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let mapper_num = ((bytes[6] >> 4) | (bytes[7] & 0xF0)) as u32;
        debug!(
            "Cartridge header: mapper {}, {:#X} bytes PRG ROM, {:#X} bytes CHR ROM, {:?} mirroring{}{}",
            mapper_num,
            prg_rom_size,
            chr_rom_size,
            header_mirroring,
            if has_battery_ram { ", battery" } else { "" },
            if has_trainer { ", trainer" } else { "" },
        );
        let expected = 16 + if has_trainer { 512 } else { 0 } + prg_rom_size + chr_rom_size;
        if bytes.len() < expected {
            return Err(CartridgeError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }
        let mut prg_ram = match savedata {
            Some(data) => {
                if data.len() != prg_ram_size {
                    return Err(CartridgeError::BadSavedata {
                        expected: prg_ram_size,
                        actual: data.len(),
                    });
                }
                data
            }
            None => vec![0; prg_ram_size],
        };
        let mut start = 16;
        if has_trainer {
            prg_ram[TRAINER_OFFSET..TRAINER_OFFSET + 512].copy_from_slice(&bytes[16..528]);
            start += 512;
        }
        let prg_rom = bytes[start..start + prg_rom_size].to_vec();
        start += prg_rom_size;
        let chr_rom = bytes[start..start + chr_rom_size].to_vec();
        Ok(Cartridge {
            memory: CartridgeMemory {
                prg_rom,
                prg_ram,
                chr_rom,
                chr_ram: vec![0; chr_ram_size],
            },
            mapper: get_mapper(mapper_num),
            header_mirroring,
            has_battery_ram,
            absent: false,
        })
    }
    /// Whether this is the absent-cartridge placeholder.
    pub fn is_absent(&self) -> bool {
        self.absent
    }
    /// Read a byte from the cartridge given an address in CPU memory space.
    pub fn read_cpu(&self, addr: usize) -> u8 {
        if self.absent {
            return OPEN_BUS;
        }
        self.mapper.read_cpu(addr, &self.memory)
    }
    /// Write a byte to the cartridge given an address in CPU memory space.
    pub fn write_cpu(&mut self, addr: usize, value: u8) {
        if !self.absent {
            self.mapper.write_cpu(addr, &mut self.memory, value);
        }
    }
    /// Read a byte from the cartridge given an address in PPU memory space.
    pub fn read_ppu(&self, addr: usize) -> u8 {
        if self.absent {
            return OPEN_BUS;
        }
        self.mapper.read_ppu(addr, &self.memory)
    }
    /// Write a byte of CHR RAM given an address in PPU memory space.
    pub fn write_ppu(&mut self, addr: usize, value: u8) {
        if !self.absent {
            self.mapper.write_ppu(addr, &mut self.memory, value);
        }
    }
    /// The mirroring currently in effect: the mapper's override if it has
    /// one, otherwise the arrangement from the header.
    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring().unwrap_or(self.header_mirroring)
    }
    /// Resolve a nametable address to an offset into the console's 2KB
    /// nametable RAM, using the mirroring currently in effect.
    ///
    /// This is the cartridge's CIRAM A10 line: the cartridge, not the PPU,
    /// decides which physical bank serves each logical nametable.
    pub fn nametable_offset(&self, addr: usize) -> usize {
        self.mirroring().nametable_offset(addr)
    }
    /// [true] if the cartridge has battery backed RAM (i.e. save data).
    pub fn has_battery_backed_ram(&self) -> bool {
        self.has_battery_ram
    }
    /// Advance the cartridge by a certain number of CPU cycles.
    pub fn advance_cpu_cycles(&mut self, cycles: u32) {
        self.mapper.on_cpu_cycles(cycles);
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Cartridge::absent()
    }
}

impl Display for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.absent {
            write!(f, "no cartridge")
        } else {
            write!(f, "mapper {}", self.mapper.mapper_num())
        }
    }
}
impl Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self, f)
    }
}
