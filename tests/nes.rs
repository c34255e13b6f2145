mod common;

use assert_hex::assert_eq_hex;
use common::{nes_with_program, prg_with_program};
use famicore::core::{opcodes::*, Nes, Settings, CPU_CYCLES_PER_OAM};

#[test]
fn test_oam_dma_through_program() {
    common::init_logging();
    let mut nes = nes_with_program(&[
        LDA_I, 0x02, // Page to copy from
        STA_ABS, 0x14, 0x40, // OAMDMA
    ]);
    (0..0x100).for_each(|i| nes.mem[0x0200 + i] = i as u8);
    let settings = Settings::default();
    nes.advance_instruction(&settings);
    let cycles = nes.advance_instruction(&settings);
    assert!(cycles >= CPU_CYCLES_PER_OAM);
    (0..0x100).for_each(|i| assert_eq_hex!(nes.ppu.oam[i], i as u8));
}

#[test]
fn test_advance_frame_cycle_count() {
    let mut nes = nes_with_program(&[]);
    let settings = Settings::default();
    // 89342 dots at 3 dots per cycle, plus up to one instruction of overshoot
    let cycles = nes.advance_frame(&settings);
    assert!((29000..31000).contains(&cycles), "cycles = {}", cycles);
}

#[test]
fn test_run_carries_fractional_cycles() {
    let mut nes = nes_with_program(&[]);
    let settings = Settings::default();
    // Budgets that don't divide into whole instructions should still
    // average out over many calls
    let executed: u32 = (0..1000).map(|_| nes.run(10.5, &settings)).sum();
    assert!((10400..10700).contains(&executed), "executed = {}", executed);
}

#[test]
fn test_savestate_round_trip() {
    let mut nes = nes_with_program(&[LDA_I, 0x42, STA_ZP, 0x10]);
    let settings = Settings::default();
    nes.advance_instruction(&settings);
    nes.advance_instruction(&settings);
    nes.write_byte(0x0123, 0x77);
    nes.write_byte(0x2000, 0x80);

    let savestate = nes.to_savestate().unwrap();
    let mut restored = Nes::from_savestate(&savestate).unwrap();

    assert_eq_hex!(restored.cpu.a, 0x42);
    assert_eq_hex!(restored.cpu.p_c, nes.cpu.p_c);
    assert_eq_hex!(restored.mem[0x0010], 0x42);
    assert_eq_hex!(restored.mem[0x0123], 0x77);
    assert!(restored.ppu.get_nmi_enabled());
    // The cartridge comes along too
    assert_eq_hex!(restored.read_byte(0xFFFD), 0x80);
    // And the restored console keeps running
    restored.advance_frame(&settings);
}

#[test]
fn test_savestate_preserves_mapper_state() {
    let mut prg = prg_with_program(&[]);
    prg.extend(vec![0xAB; 0x4000]);
    let rom = common::build_ines(0x20, 0, prg, vec![0; 0x2000]);
    let mut nes = Nes::with_cartridge(famicore::core::Cartridge::parse(&rom, None).unwrap());
    // UxROM: select PRG bank 1 at $8000
    nes.write_byte(0x8000, 0x01);
    assert_eq_hex!(nes.read_byte(0x8000), 0xAB);

    let savestate = nes.to_savestate().unwrap();
    let mut restored = Nes::from_savestate(&savestate).unwrap();
    assert_eq_hex!(restored.read_byte(0x8000), 0xAB);
}

#[test]
fn test_savedata_requires_battery() {
    let nes = nes_with_program(&[]);
    assert!(nes.savedata().is_none());

    let rom = common::build_ines(0x02, 0, prg_with_program(&[]), vec![0; 0x2000]);
    let mut nes = Nes::with_cartridge(famicore::core::Cartridge::parse(&rom, None).unwrap());
    nes.write_byte(0x6000, 0x42);
    let savedata = nes.savedata().unwrap();
    assert_eq_hex!(savedata[0], 0x42);
    assert_eq!(savedata.len(), 0x2000);
}

#[test]
fn test_removed_cartridge_reads_open_bus() {
    let mut nes = nes_with_program(&[]);
    let cartridge = nes.remove_cartridge();
    assert!(!cartridge.is_absent());
    assert!(nes.cartridge.is_absent());
    assert_eq_hex!(nes.read_byte(0x8000), famicore::core::OPEN_BUS);
}
