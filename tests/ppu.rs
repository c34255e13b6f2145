mod common;

use assert_hex::assert_eq_hex;
use common::{nes_with_prg, prg_with_program};
use famicore::core::{opcodes::*, Settings};

// A program that enables the NMI and spins, with an NMI handler at $9000
// that increments $10
fn nmi_counting_prg() -> Vec<u8> {
    let mut prg = prg_with_program(&[
        LDA_I, 0x80, // $8000
        STA_ABS, 0x00, 0x20, // PPUCTRL
        JMP_ABS, 0x05, 0x80, // $8005: spin
    ]);
    prg[0x1000..0x1003].copy_from_slice(&[INC_ZP, 0x10, RTI]);
    prg[0x3FFA] = 0x00;
    prg[0x3FFB] = 0x90;
    prg
}

#[test]
fn test_vblank_after_frame() {
    common::init_logging();
    let mut nes = nes_with_prg(prg_with_program(&[]));
    let settings = Settings::default();
    assert!(!nes.ppu.in_vblank());
    nes.advance_frame(&settings);
    assert!(nes.ppu.in_vblank());
}

#[test]
fn test_nmi_fires_every_frame() {
    let mut nes = nes_with_prg(nmi_counting_prg());
    let settings = Settings::default();
    (0..4).for_each(|_| {
        nes.advance_frame(&settings);
    });
    // The handler has run once per vblank since NMI was enabled
    let count = nes.mem[0x0010];
    assert!((3..=4).contains(&count), "handler ran {} times", count);
}

#[test]
fn test_nmi_disabled_by_default() {
    // Same handler as the counting program, but the NMI is never enabled
    let mut prg = nmi_counting_prg();
    prg[..8].copy_from_slice(&[JMP_ABS, 0x00, 0x80, 0xEA, 0xEA, 0xEA, 0xEA, 0xEA]);
    let mut nes = nes_with_prg(prg);
    let settings = Settings::default();
    (0..3).for_each(|_| {
        nes.advance_frame(&settings);
    });
    assert_eq_hex!(nes.mem[0x0010], 0x00);
}

#[test]
fn test_status_polling_sees_vblank() {
    // Spin until bit 7 of PPUSTATUS reads set, then record a marker
    let prg = prg_with_program(&[
        LDA_ABS, 0x02, 0x20, // $8000: read PPUSTATUS
        BPL, 0xFB, // loop back while bit 7 clear
        LDA_I, 0x01, STA_ZP, 0x20, // $8005: marker
        JMP_ABS, 0x09, 0x80, // spin
    ]);
    let mut nes = nes_with_prg(prg);
    let settings = Settings::default();
    nes.advance_frame(&settings);
    nes.advance_frame(&settings);
    assert_eq_hex!(nes.mem[0x0020], 0x01);
}

#[test]
fn test_nametable_writes_through_registers() {
    let mut nes = nes_with_prg(prg_with_program(&[]));
    // Write $AB to $2123 via PPUADDR/PPUDATA
    nes.write_byte(0x2006, 0x21);
    nes.write_byte(0x2006, 0x23);
    nes.write_byte(0x2007, 0xAB);
    // Read it back, discarding the buffered byte
    nes.write_byte(0x2006, 0x21);
    nes.write_byte(0x2006, 0x23);
    nes.read_byte(0x2007);
    assert_eq_hex!(nes.read_byte(0x2007), 0xAB);
}

#[test]
fn test_horizontal_mirroring_through_registers() {
    // NROM with horizontal mirroring from the header: $2000 and $2400
    // address the same physical nametable
    let mut nes = nes_with_prg(prg_with_program(&[]));
    nes.write_byte(0x2006, 0x20);
    nes.write_byte(0x2006, 0x55);
    nes.write_byte(0x2007, 0x42);
    nes.write_byte(0x2006, 0x24);
    nes.write_byte(0x2006, 0x55);
    nes.read_byte(0x2007);
    assert_eq_hex!(nes.read_byte(0x2007), 0x42);
}

#[test]
fn test_oam_dma_mid_frame() {
    // Trigger the DMA from the NMI handler, as games do
    let mut prg = prg_with_program(&[
        LDA_I, 0x80, // $8000
        STA_ABS, 0x00, 0x20, // PPUCTRL
        JMP_ABS, 0x05, 0x80, // spin
    ]);
    prg[0x1000..0x1008].copy_from_slice(&[
        LDA_I, 0x02, // NMI handler: DMA from page 2
        STA_ABS, 0x14, 0x40, // OAMDMA
        RTI, 0xEA, 0xEA,
    ]);
    prg[0x3FFA] = 0x00;
    prg[0x3FFB] = 0x90;
    let mut nes = nes_with_prg(prg);
    (0..0x100).for_each(|i| nes.mem[0x0200 + i] = 0xC0u8.wrapping_add(i as u8));
    let settings = Settings::default();
    (0..3).for_each(|_| {
        nes.advance_frame(&settings);
    });
    assert_eq_hex!(nes.ppu.oam[0], 0xC0);
    assert_eq_hex!(nes.ppu.oam[0xFF], 0xBF);
}
