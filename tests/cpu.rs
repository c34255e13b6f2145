mod common;

use assert_hex::assert_eq_hex;
use common::{nes_with_prg, nes_with_program, prg_with_program};
use famicore::core::{opcodes::*, Nes};

#[test]
fn test_power_on_state() {
    common::init_logging();
    let nes = nes_with_program(&[]);
    assert_eq!(nes.cpu.a, 0);
    assert_eq!(nes.cpu.x, 0);
    assert_eq!(nes.cpu.y, 0);
    assert_eq_hex!(nes.cpu.s_p, 0xFD);
    assert_eq_hex!(nes.cpu.s_r.to_byte(), 0x34);
    assert_eq_hex!(nes.cpu.p_c, 0x8000);
}

#[test]
fn test_brk_rti_round_trip() {
    let mut prg = prg_with_program(&[
        LDA_I, 0x42, // $8000
        BRK, 0xEA, // $8002, with its padding byte
        LDA_I, 0x55, // $8004, where RTI should return to
    ]);
    // Interrupt handler at $9000
    prg[0x1000..0x1003].copy_from_slice(&[LDA_I, 0x07, RTI]);
    prg[0x3FFE] = 0x00;
    prg[0x3FFF] = 0x90;
    let mut nes = nes_with_prg(prg);

    nes.step();
    assert_eq_hex!(nes.cpu.a, 0x42);
    nes.step();
    assert_eq_hex!(nes.cpu.p_c, 0x9000);
    assert_eq_hex!(nes.cpu.s_p, 0xFA);
    assert!(nes.cpu.s_r.i);
    nes.step();
    assert_eq_hex!(nes.cpu.a, 0x07);
    nes.step();
    assert_eq_hex!(nes.cpu.p_c, 0x8004);
    assert_eq_hex!(nes.cpu.s_p, 0xFD);
    nes.step();
    assert_eq_hex!(nes.cpu.a, 0x55);
}

#[test]
fn test_irq_respects_interrupt_disable() {
    let mut prg = prg_with_program(&[]);
    prg[0x3FFE] = 0x00;
    prg[0x3FFF] = 0x90;
    let mut nes = nes_with_prg(prg);

    // The interrupt disable flag is set at power-on
    nes.irq();
    assert_eq_hex!(nes.cpu.p_c, 0x8000);
    nes.cpu.s_r.i = false;
    nes.irq();
    assert_eq_hex!(nes.cpu.p_c, 0x9000);
    assert!(nes.cpu.s_r.i);
}

#[test]
fn test_nmi_ignores_interrupt_disable() {
    let mut prg = prg_with_program(&[]);
    prg[0x3FFA] = 0x00;
    prg[0x3FFB] = 0xA0;
    let mut nes = nes_with_prg(prg);

    assert!(nes.cpu.s_r.i);
    nes.nmi();
    assert_eq_hex!(nes.cpu.p_c, 0xA000);
}

#[test]
fn test_page_cross_costs_a_cycle() {
    let mut nes = Nes::new();
    nes.cpu.x = 0x01;
    // $00FF + X crosses into page 1
    assert_eq!(nes.decode_and_execute(&[LDA_ABS_X, 0xFF, 0x00]), (3, 5));
    // $0100 + X stays within page 1
    assert_eq!(nes.decode_and_execute(&[LDA_ABS_X, 0x00, 0x01]), (3, 4));
    // Stores always pay the extra cycle
    assert_eq!(nes.decode_and_execute(&[STA_ABS_X, 0x00, 0x01]), (3, 5));
}

#[test]
fn test_jmp_indirect_page_wrap() {
    let mut nes = Nes::new();
    // Pointer straddling a page boundary: the high byte is fetched from the
    // start of the same page, not the next one
    nes.write_byte(0x02FF, 0x34);
    nes.write_byte(0x0200, 0x12);
    nes.write_byte(0x0300, 0x77);
    nes.decode_and_execute(&[JMP_IND, 0xFF, 0x02]);
    assert_eq_hex!(nes.cpu.p_c.wrapping_add(3), 0x1234);
}

#[test]
fn test_jsr_rts_round_trip() {
    let mut nes = nes_with_program(&[
        JSR, 0x00, 0x90, // $8000
        LDA_I, 0x55, // $8003, where RTS should return to
    ]);
    nes.step();
    assert_eq_hex!(nes.cpu.p_c, 0x9000);
    nes.cpu.p_c = 0x9000;
    nes.decode_and_execute(&[RTS]);
    assert_eq_hex!(nes.cpu.p_c.wrapping_add(1), 0x8003);
}

#[test]
fn test_adc_sets_carry_and_overflow() {
    let mut nes = Nes::new();
    nes.cpu.a = 0x7F;
    nes.decode_and_execute(&[ADC_I, 0x01]);
    // 0x7F + 1 overflows signed but not unsigned
    assert_eq_hex!(nes.cpu.a, 0x80);
    assert!(nes.cpu.s_r.v);
    assert!(!nes.cpu.s_r.c);
    assert!(nes.cpu.s_r.n);

    nes.cpu.a = 0xFF;
    nes.cpu.s_r.c = false;
    nes.decode_and_execute(&[ADC_I, 0x01]);
    assert_eq_hex!(nes.cpu.a, 0x00);
    assert!(nes.cpu.s_r.c);
    assert!(nes.cpu.s_r.z);
}

#[test]
fn test_unofficial_lax_loads_both_registers() {
    let mut nes = Nes::new();
    nes.write_byte(0x0010, 0x5A);
    nes.decode_and_execute(&[unofficial::LAX_ZP, 0x10]);
    assert_eq_hex!(nes.cpu.a, 0x5A);
    assert_eq_hex!(nes.cpu.x, 0x5A);
}

#[test]
fn test_instruction_cycles_accumulate() {
    let mut nes = nes_with_program(&[LDA_I, 0x01, STA_ABS, 0x00, 0x02]);
    nes.step();
    assert_eq!(nes.cpu.cycles, 2);
    nes.step();
    assert_eq!(nes.cpu.cycles, 6);
    assert_eq_hex!(nes.mem[0x0200], 0x01);
}
