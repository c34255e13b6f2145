use serde::{Deserialize, Serialize};

use crate::core::StatusRegister;

/// The CPU of the console.
///
/// Contains the register file and the ALU semantics. Every ALU method wraps
/// its result to an unsigned byte and updates the status register: Zero is
/// set iff the wrapped byte is 0, Negative mirrors bit 7, and Carry reflects
/// whether the pre-wrap value left the [0, 255] range.
///
/// Memory access and instruction dispatch live on [Nes][crate::core::Nes],
/// since almost every instruction touches the shared bus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cpu {
    /// Accumulator
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Program counter
    pub p_c: u16,
    /// Stack pointer, an offset into the fixed stack page at $0100
    pub s_p: u8,
    /// Status register
    pub s_r: StatusRegister,
    /// Total cycles executed since power-on
    pub cycles: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            p_c: 0,
            s_p: 0xFD,
            s_r: StatusRegister::new(),
            cycles: 0,
        }
    }
    /// Reset the register file to its power-on state: A = X = Y = 0,
    /// P = $34, SP = $FD. The PC is set separately from the reset vector.
    pub fn power_on(&mut self) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.s_p = 0xFD;
        self.s_r = StatusRegister::new();
        self.s_r.b = true;
        self.cycles = 0;
    }
    /// Load a value into A.
    /// ```
    /// let mut cpu = famicore::core::Cpu::new();
    /// cpu.lda(0x18);
    /// assert_eq!(cpu.a, 0x18);
    /// ```
    pub fn lda(&mut self, value: u8) {
        self.a = value;
        self.set_zn(self.a);
    }
    /// Load a value into X.
    pub fn ldx(&mut self, value: u8) {
        self.x = value;
        self.set_zn(self.x);
    }
    /// Load a value into Y.
    pub fn ldy(&mut self, value: u8) {
        self.y = value;
        self.set_zn(self.y);
    }
    /// Load a value into both A and X (the unofficial LAX instruction).
    pub fn lax(&mut self, value: u8) {
        self.a = value;
        self.x = value;
        self.set_zn(value);
    }
    /// Add a value and the carry bit to A.
    ///
    /// Carry is set iff the pre-wrap sum exceeds 255. Overflow is set iff
    /// two same-signed operands produce a differently-signed result.
    pub fn adc(&mut self, value: u8) {
        let sum = self.a as u16 + value as u16 + self.s_r.c as u16;
        let result = sum as u8;
        self.s_r.c = sum > 0xFF;
        self.s_r.v = (self.a ^ result) & (value ^ result) & 0x80 != 0;
        self.a = result;
        self.set_zn(self.a);
    }
    /// Subtract a value and the borrow (inverted carry) from A.
    ///
    /// Carry is cleared iff the pre-wrap difference is negative.
    pub fn sbc(&mut self, value: u8) {
        // A - M - (1 - C) is A + !M + C
        self.adc(!value);
    }
    /// AND a value into A.
    pub fn and(&mut self, value: u8) {
        self.a &= value;
        self.set_zn(self.a);
    }
    /// OR a value into A.
    pub fn ora(&mut self, value: u8) {
        self.a |= value;
        self.set_zn(self.a);
    }
    /// XOR a value into A.
    pub fn eor(&mut self, value: u8) {
        self.a ^= value;
        self.set_zn(self.a);
    }
    /// Shift left one bit. Carry receives the old bit 7.
    pub fn asl(&mut self, value: u8) -> u8 {
        self.s_r.c = value & 0x80 != 0;
        let result = value << 1;
        self.set_zn(result);
        result
    }
    /// Shift right one bit. Carry receives the old bit 0.
    pub fn lsr(&mut self, value: u8) -> u8 {
        self.s_r.c = value & 0x01 != 0;
        let result = value >> 1;
        self.set_zn(result);
        result
    }
    /// Rotate left one bit through the carry.
    pub fn rol(&mut self, value: u8) -> u8 {
        let result = (value << 1) | self.s_r.c as u8;
        self.s_r.c = value & 0x80 != 0;
        self.set_zn(result);
        result
    }
    /// Rotate right one bit through the carry.
    pub fn ror(&mut self, value: u8) -> u8 {
        let result = (value >> 1) | ((self.s_r.c as u8) << 7);
        self.s_r.c = value & 0x01 != 0;
        self.set_zn(result);
        result
    }
    /// Increment a value by one, wrapping.
    pub fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_zn(result);
        result
    }
    /// Decrement a value by one, wrapping.
    pub fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_zn(result);
        result
    }
    /// Compare A with a value. Carry is set iff A >= value.
    pub fn cmp(&mut self, value: u8) {
        self.compare(self.a, value);
    }
    /// Compare X with a value.
    pub fn cpx(&mut self, value: u8) {
        self.compare(self.x, value);
    }
    /// Compare Y with a value.
    pub fn cpy(&mut self, value: u8) {
        self.compare(self.y, value);
    }
    /// Test bits: Z from A & value, N and V copied from bits 7 and 6 of the
    /// value itself.
    pub fn bit(&mut self, value: u8) {
        self.s_r.z = self.a & value == 0;
        self.s_r.n = value & 0x80 != 0;
        self.s_r.v = value & 0x40 != 0;
    }
    /// Decrement then compare with A (the unofficial DCP instruction).
    pub fn dcp(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.compare(self.a, result);
        result
    }
    /// Increment then subtract from A (the unofficial ISC instruction).
    pub fn isc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.sbc(result);
        result
    }
    /// Rotate left then AND into A (the unofficial RLA instruction).
    pub fn rla(&mut self, value: u8) -> u8 {
        let result = self.rol(value);
        self.and(result);
        result
    }
    /// Rotate right then add to A (the unofficial RRA instruction).
    pub fn rra(&mut self, value: u8) -> u8 {
        let result = self.ror(value);
        self.adc(result);
        result
    }
    /// Shift left then OR into A (the unofficial SLO instruction).
    pub fn slo(&mut self, value: u8) -> u8 {
        let result = self.asl(value);
        self.ora(result);
        result
    }
    /// Shift right then XOR into A (the unofficial SRE instruction).
    pub fn sre(&mut self, value: u8) -> u8 {
        let result = self.lsr(value);
        self.eor(result);
        result
    }
    /// Take a branch if `condition` holds, returning the cycle cost of the
    /// branch instruction: 2 if not taken, 3 if taken, 4 if the destination
    /// is in a different 256-byte page than the following instruction.
    ///
    /// The PC is moved relative to the instruction after the branch; the
    /// caller advances the PC past the 2-byte instruction afterwards.
    pub fn branch_if(&mut self, condition: bool, offset: u8) -> i64 {
        if !condition {
            return 2;
        }
        let base = self.p_c.wrapping_add(2);
        let target = base.wrapping_add(offset as i8 as u16);
        // PC is advanced by 2 after dispatch
        self.p_c = target.wrapping_sub(2);
        if target & 0xFF00 == base & 0xFF00 {
            3
        } else {
            4
        }
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.s_r.c = register >= value;
        self.set_zn(register.wrapping_sub(value));
    }
    // Set the zero and negative flags from a result byte
    fn set_zn(&mut self, value: u8) {
        self.s_r.z = value == 0;
        self.s_r.n = value & 0x80 != 0;
    }
}

#[cfg(test)]
mod tests {
    use super::Cpu;
    use assert_hex::assert_eq_hex;

    #[derive(PartialEq)]
    enum Flag {
        Carry,
        Zero,
        Overflow,
        Negative,
    }

    fn check_flags(cpu: &Cpu, flags: Vec<Flag>) {
        macro_rules! check_flag {
            ($flag:ident, $flag_enum:ident, $flag_str:literal) => {
                assert_eq!(
                    cpu.s_r.$flag,
                    flags.contains(&Flag::$flag_enum),
                    "Expected {} flag to be {}",
                    $flag_str,
                    flags.contains(&Flag::$flag_enum)
                );
            };
        }
        check_flag!(c, Carry, "carry");
        check_flag!(z, Zero, "zero");
        check_flag!(v, Overflow, "overflow");
        check_flag!(n, Negative, "negative");
    }

    macro_rules! ld_test {
        ($ld:ident, $reg:ident) => {
            let mut cpu = Cpu::new();
            cpu.$ld(0x18);
            assert_eq_hex!(cpu.$reg, 0x18);
            check_flags(&cpu, Vec::new());
            cpu.$ld(0x00);
            check_flags(&cpu, vec![Flag::Zero]);
            cpu.$ld(0x80);
            // Loading a fresh value clears stale flags
            check_flags(&cpu, vec![Flag::Negative]);
        };
    }

    #[test]
    fn test_lda() {
        ld_test!(lda, a);
    }
    #[test]
    fn test_ldx() {
        ld_test!(ldx, x);
    }
    #[test]
    fn test_ldy() {
        ld_test!(ldy, y);
    }
    #[test]
    fn test_adc() {
        let mut cpu = Cpu::new();
        cpu.adc(0x14);
        cpu.adc(0x45);
        assert_eq_hex!(cpu.a, 0x14 + 0x45);
        check_flags(&cpu, Vec::new());
    }
    #[test]
    fn test_adc_wraps_to_byte() {
        let mut cpu = Cpu::new();
        // Every pre-wrap sum above 255 wraps and sets carry
        for value in 0..=0xFFu8 {
            cpu.a = 0xF0;
            cpu.s_r.c = false;
            cpu.adc(value);
            if 0xF0u16 + value as u16 > 0xFF {
                assert!(cpu.s_r.c, "carry should be set for {:#X}", value);
                assert_eq_hex!(cpu.a, (0xF0u16 + value as u16) as u8);
            } else {
                assert!(!cpu.s_r.c);
            }
            assert_eq!(cpu.s_r.z, cpu.a == 0);
            assert_eq!(cpu.s_r.n, cpu.a & 0x80 != 0);
        }
    }
    #[test]
    fn test_adc_signed_overflow() {
        let mut cpu = Cpu::new();
        cpu.adc(0x40);
        cpu.adc(0x41);
        check_flags(&cpu, vec![Flag::Overflow, Flag::Negative]);
    }
    #[test]
    fn test_adc_with_carry() {
        let mut cpu = Cpu::new();
        cpu.a = 0x18;
        cpu.s_r.c = true;
        cpu.adc(0x45);
        assert_eq_hex!(cpu.a, 0x18 + 0x45 + 0x01);
        check_flags(&cpu, vec![]);
    }
    #[test]
    fn test_sbc_borrow_clears_carry() {
        let mut cpu = Cpu::new();
        cpu.a = 0x10;
        cpu.s_r.c = true;
        cpu.sbc(0x20);
        assert_eq_hex!(cpu.a, 0xF0);
        check_flags(&cpu, vec![Flag::Negative]);
        cpu.s_r.c = true;
        cpu.a = 0x20;
        cpu.sbc(0x10);
        assert_eq_hex!(cpu.a, 0x10);
        check_flags(&cpu, vec![Flag::Carry]);
    }
    #[test]
    fn test_and() {
        let mut cpu = Cpu::new();
        cpu.a = 0x67;
        cpu.and(0x60);
        assert_eq_hex!(cpu.a, 0x60);
        check_flags(&cpu, vec![]);
        cpu.and(0x00);
        check_flags(&cpu, vec![Flag::Zero]);
        cpu.a = 0xFF;
        cpu.and(0x85);
        check_flags(&cpu, vec![Flag::Negative]);
    }
    #[test]
    fn test_shifts() {
        let mut cpu = Cpu::new();
        assert_eq_hex!(cpu.asl(0x81), 0x02);
        check_flags(&cpu, vec![Flag::Carry]);
        assert_eq_hex!(cpu.lsr(0x01), 0x00);
        check_flags(&cpu, vec![Flag::Carry, Flag::Zero]);
        // Carry rotates in
        assert_eq_hex!(cpu.rol(0x80), 0x01);
        check_flags(&cpu, vec![Flag::Carry]);
        assert_eq_hex!(cpu.ror(0x00), 0x80);
        check_flags(&cpu, vec![Flag::Negative]);
    }
    #[test]
    fn test_compare() {
        let mut cpu = Cpu::new();
        cpu.a = 0x40;
        cpu.cmp(0x40);
        check_flags(&cpu, vec![Flag::Carry, Flag::Zero]);
        cpu.cmp(0x41);
        check_flags(&cpu, vec![Flag::Negative]);
        cpu.cmp(0x3F);
        check_flags(&cpu, vec![Flag::Carry]);
    }
    #[test]
    fn test_bit() {
        let mut cpu = Cpu::new();
        cpu.a = 0x0F;
        cpu.bit(0xC0);
        check_flags(&cpu, vec![Flag::Zero, Flag::Overflow, Flag::Negative]);
        cpu.bit(0x01);
        check_flags(&cpu, vec![]);
    }
    #[test]
    fn test_branch_cycles() {
        let mut cpu = Cpu::new();
        cpu.p_c = 0x8010;
        assert_eq!(cpu.branch_if(false, 0x10), 2);
        assert_eq!(cpu.p_c, 0x8010);
        // Taken, same page
        assert_eq!(cpu.branch_if(true, 0x10), 3);
        assert_eq!(cpu.p_c.wrapping_add(2), 0x8022);
        // Taken, crossing into the next page
        cpu.p_c = 0x80F0;
        assert_eq!(cpu.branch_if(true, 0x7F), 4);
    }
    #[test]
    fn test_power_on_state() {
        let mut cpu = Cpu::new();
        cpu.a = 0x12;
        cpu.s_p = 0x80;
        cpu.power_on();
        assert_eq_hex!(cpu.a, 0);
        assert_eq_hex!(cpu.x, 0);
        assert_eq_hex!(cpu.y, 0);
        assert_eq_hex!(cpu.s_p, 0xFD);
        assert_eq_hex!(cpu.s_r.to_byte(), 0x34);
    }
}
