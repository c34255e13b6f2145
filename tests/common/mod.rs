// Helpers for building test cartridges in memory, shared by the
// integration test suites.
#![allow(dead_code)]

use famicore::core::{Cartridge, Nes, Settings};

/// Initialise logging for a test. Safe to call more than once.
pub fn init_logging() {
    let _ = simplelog::SimpleLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
    );
}

/// Assemble an iNES file from its parts.
pub fn build_ines(flags6: u8, flags7: u8, prg_rom: Vec<u8>, chr_rom: Vec<u8>) -> Vec<u8> {
    assert_eq!(prg_rom.len() % 0x4000, 0);
    assert_eq!(chr_rom.len() % 0x2000, 0);
    let mut bytes = vec![
        b'N',
        b'E',
        b'S',
        0x1A,
        (prg_rom.len() / 0x4000) as u8,
        (chr_rom.len() / 0x2000) as u8,
        flags6,
        flags7,
        0,
        0,
        0,
        0,
        0,
        0,
        0,
        0,
    ];
    bytes.extend(prg_rom);
    bytes.extend(chr_rom);
    bytes
}

/// One 16KB PRG ROM bank of NOPs with `program` at $8000 and the reset
/// vector pointing at it. Interrupt vectors can be patched in afterwards.
pub fn prg_with_program(program: &[u8]) -> Vec<u8> {
    let mut prg = vec![0xEA; 0x4000];
    prg[..program.len()].copy_from_slice(program);
    // Reset vector at $FFFC -> $8000
    prg[0x3FFC] = 0x00;
    prg[0x3FFD] = 0x80;
    prg
}

/// A powered-on NES running `program` from $8000 on an NROM cartridge.
pub fn nes_with_program(program: &[u8]) -> Nes {
    nes_with_prg(prg_with_program(program))
}

/// A powered-on NES running the given 16KB PRG ROM bank.
pub fn nes_with_prg(prg: Vec<u8>) -> Nes {
    let rom = build_ines(0, 0, prg, vec![0; 0x2000]);
    let mut nes = Nes::with_cartridge(Cartridge::parse(&rom, None).unwrap());
    nes.power_on(&Settings::default());
    nes
}
