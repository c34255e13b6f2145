mod common;

use assert_hex::assert_eq_hex;
use common::{nes_with_prg, nes_with_program, prg_with_program};
use famicore::core::{opcodes::*, Settings};

#[test]
fn test_status_reflects_length_counters() {
    common::init_logging();
    let mut nes = nes_with_program(&[]);
    // Enable pulse 1 and load its length counter
    nes.write_byte(0x4015, 0x01);
    nes.write_byte(0x4003, 0x08);
    assert_eq!(nes.read_byte(0x4015) & 0x01, 0x01);
    // Disabling the channel clears the counter
    nes.write_byte(0x4015, 0x00);
    assert_eq!(nes.read_byte(0x4015) & 0x01, 0x00);
}

#[test]
fn test_frame_irq_interrupts_cpu() {
    let mut prg = prg_with_program(&[
        LDA_I, 0x00, // $8000
        STA_ABS, 0x17, 0x40, // 4-step mode with the IRQ enabled
        CLI, // $8005
        JMP_ABS, 0x06, 0x80, // spin
    ]);
    // IRQ handler: acknowledge the interrupt, count it, return
    prg[0x1000..0x1007].copy_from_slice(&[
        LDA_ABS, 0x15, 0x40, // reading $4015 clears the frame IRQ
        INC_ZP, 0x10, RTI, 0xEA,
    ]);
    prg[0x3FFE] = 0x00;
    prg[0x3FFF] = 0x90;
    let mut nes = nes_with_prg(prg);
    let settings = Settings::default();
    (0..3).for_each(|_| {
        nes.advance_frame(&settings);
    });
    // The sequence wraps about once per frame
    assert!(nes.mem[0x0010] >= 1, "no frame IRQ was delivered");
}

#[test]
fn test_samples_accumulate_per_frame() {
    let mut nes = nes_with_program(&[]);
    let settings = Settings::default();
    nes.advance_frame(&settings);
    nes.apu.sample_queue();
    nes.advance_frame(&settings);
    let samples = nes.apu.sample_queue();
    // One frame is roughly a sixtieth of the 44.1kHz output
    assert!(
        (700..800).contains(&samples.len()),
        "{} samples",
        samples.len()
    );
}

#[test]
fn test_dmc_fetches_from_the_sample_start() {
    // The first two PRG bytes are mirrored at $C000, the sample address
    let mut nes = nes_with_program(&[0x12, 0x34]);
    nes.write_byte(0x4010, 0x0F); // fastest rate, 54 cycles per bit
    nes.write_byte(0x4012, 0x00); // sample at $C000
    nes.write_byte(0x4013, 0x01); // 17 byte sample
    nes.write_byte(0x4015, 0x10); // start the DMC
    // One rate period in, the first byte is sitting in the shift register
    nes.apu.advance_cpu_cycles(60, &nes.cartridge);
    assert_eq_hex!(nes.apu.dmc_register.sample, 0x12);
    assert_eq_hex!(nes.apu.dmc_register.sample_index, 0xC001);
}

#[test]
fn test_pulse_channel_produces_sound() {
    let mut nes = nes_with_program(&[]);
    let settings = Settings::default();
    // Enable pulse 1: constant volume, a mid duty cycle and an audible pitch
    nes.write_byte(0x4015, 0x01);
    nes.write_byte(0x4000, 0xBF);
    nes.write_byte(0x4002, 0xFD);
    nes.write_byte(0x4003, 0x08);
    nes.advance_frame(&settings);
    let samples = nes.apu.sample_queue();
    assert!(samples.iter().any(|s| *s > 0.0));
    // The mixer output is normalized
    assert!(samples.iter().all(|s| (0.0..=1.0).contains(s)));
}
