//! Constants for every opcode in the CPU's instruction table.
//!
//! Naming follows `MNEMONIC_MODE`, where the mode suffix is one of
//! `I` (immediate), `ZP` (zero page), `ZP_X`/`ZP_Y` (zero page indexed),
//! `ABS` (absolute), `ABS_X`/`ABS_Y` (absolute indexed), `IND` (indirect),
//! `IND_X` (indexed indirect), or `IND_Y` (indirect indexed).

// LDA
pub const LDA_I: u8 = 0xA9;
pub const LDA_ZP: u8 = 0xA5;
pub const LDA_ZP_X: u8 = 0xB5;
pub const LDA_ABS: u8 = 0xAD;
pub const LDA_ABS_X: u8 = 0xBD;
pub const LDA_ABS_Y: u8 = 0xB9;
pub const LDA_IND_X: u8 = 0xA1;
pub const LDA_IND_Y: u8 = 0xB1;
// LDX
pub const LDX_I: u8 = 0xA2;
pub const LDX_ZP: u8 = 0xA6;
pub const LDX_ZP_Y: u8 = 0xB6;
pub const LDX_ABS: u8 = 0xAE;
pub const LDX_ABS_Y: u8 = 0xBE;
// LDY
pub const LDY_I: u8 = 0xA0;
pub const LDY_ZP: u8 = 0xA4;
pub const LDY_ZP_X: u8 = 0xB4;
pub const LDY_ABS: u8 = 0xAC;
pub const LDY_ABS_X: u8 = 0xBC;
// ADC
pub const ADC_I: u8 = 0x69;
pub const ADC_ZP: u8 = 0x65;
pub const ADC_ZP_X: u8 = 0x75;
pub const ADC_ABS: u8 = 0x6D;
pub const ADC_ABS_X: u8 = 0x7D;
pub const ADC_ABS_Y: u8 = 0x79;
pub const ADC_IND_X: u8 = 0x61;
pub const ADC_IND_Y: u8 = 0x71;
// AND
pub const AND_I: u8 = 0x29;
pub const AND_ZP: u8 = 0x25;
pub const AND_ZP_X: u8 = 0x35;
pub const AND_ABS: u8 = 0x2D;
pub const AND_ABS_X: u8 = 0x3D;
pub const AND_ABS_Y: u8 = 0x39;
pub const AND_IND_X: u8 = 0x21;
pub const AND_IND_Y: u8 = 0x31;
// ASL
pub const ASL_A: u8 = 0x0A;
pub const ASL_ZP: u8 = 0x06;
pub const ASL_ZP_X: u8 = 0x16;
pub const ASL_ABS: u8 = 0x0E;
pub const ASL_ABS_X: u8 = 0x1E;
// Branches
pub const BCC: u8 = 0x90;
pub const BCS: u8 = 0xB0;
pub const BEQ: u8 = 0xF0;
pub const BMI: u8 = 0x30;
pub const BNE: u8 = 0xD0;
pub const BPL: u8 = 0x10;
pub const BVC: u8 = 0x50;
pub const BVS: u8 = 0x70;
// BIT
pub const BIT_ZP: u8 = 0x24;
pub const BIT_ABS: u8 = 0x2C;
// BRK
pub const BRK: u8 = 0x00;
// Flag clears
pub const CLC: u8 = 0x18;
pub const CLD: u8 = 0xD8;
pub const CLI: u8 = 0x58;
pub const CLV: u8 = 0xB8;
// CMP
pub const CMP_I: u8 = 0xC9;
pub const CMP_ZP: u8 = 0xC5;
pub const CMP_ZP_X: u8 = 0xD5;
pub const CMP_ABS: u8 = 0xCD;
pub const CMP_ABS_X: u8 = 0xDD;
pub const CMP_ABS_Y: u8 = 0xD9;
pub const CMP_IND_X: u8 = 0xC1;
pub const CMP_IND_Y: u8 = 0xD1;
// CPX
pub const CPX_I: u8 = 0xE0;
pub const CPX_ZP: u8 = 0xE4;
pub const CPX_ABS: u8 = 0xEC;
// CPY
pub const CPY_I: u8 = 0xC0;
pub const CPY_ZP: u8 = 0xC4;
pub const CPY_ABS: u8 = 0xCC;
// DEC
pub const DEC_ZP: u8 = 0xC6;
pub const DEC_ZP_X: u8 = 0xD6;
pub const DEC_ABS: u8 = 0xCE;
pub const DEC_ABS_X: u8 = 0xDE;
pub const DEX: u8 = 0xCA;
pub const DEY: u8 = 0x88;
// EOR
pub const EOR_I: u8 = 0x49;
pub const EOR_ZP: u8 = 0x45;
pub const EOR_ZP_X: u8 = 0x55;
pub const EOR_ABS: u8 = 0x4D;
pub const EOR_ABS_X: u8 = 0x5D;
pub const EOR_ABS_Y: u8 = 0x59;
pub const EOR_IND_X: u8 = 0x41;
pub const EOR_IND_Y: u8 = 0x51;
// INC
pub const INC_ZP: u8 = 0xE6;
pub const INC_ZP_X: u8 = 0xF6;
pub const INC_ABS: u8 = 0xEE;
pub const INC_ABS_X: u8 = 0xFE;
pub const INX: u8 = 0xE8;
pub const INY: u8 = 0xC8;
// Jumps
pub const JMP_ABS: u8 = 0x4C;
pub const JMP_IND: u8 = 0x6C;
pub const JSR: u8 = 0x20;
// LSR
pub const LSR_A: u8 = 0x4A;
pub const LSR_ZP: u8 = 0x46;
pub const LSR_ZP_X: u8 = 0x56;
pub const LSR_ABS: u8 = 0x4E;
pub const LSR_ABS_X: u8 = 0x5E;
// NOP
pub const NOP: u8 = 0xEA;
// ORA
pub const ORA_I: u8 = 0x09;
pub const ORA_ZP: u8 = 0x05;
pub const ORA_ZP_X: u8 = 0x15;
pub const ORA_ABS: u8 = 0x0D;
pub const ORA_ABS_X: u8 = 0x1D;
pub const ORA_ABS_Y: u8 = 0x19;
pub const ORA_IND_X: u8 = 0x01;
pub const ORA_IND_Y: u8 = 0x11;
// Stack
pub const PHA: u8 = 0x48;
pub const PHP: u8 = 0x08;
pub const PLA: u8 = 0x68;
pub const PLP: u8 = 0x28;
// ROL
pub const ROL_A: u8 = 0x2A;
pub const ROL_ZP: u8 = 0x26;
pub const ROL_ZP_X: u8 = 0x36;
pub const ROL_ABS: u8 = 0x2E;
pub const ROL_ABS_X: u8 = 0x3E;
// ROR
pub const ROR_A: u8 = 0x6A;
pub const ROR_ZP: u8 = 0x66;
pub const ROR_ZP_X: u8 = 0x76;
pub const ROR_ABS: u8 = 0x6E;
pub const ROR_ABS_X: u8 = 0x7E;
// Returns
pub const RTI: u8 = 0x40;
pub const RTS: u8 = 0x60;
// SBC
pub const SBC_I: u8 = 0xE9;
pub const SBC_ZP: u8 = 0xE5;
pub const SBC_ZP_X: u8 = 0xF5;
pub const SBC_ABS: u8 = 0xED;
pub const SBC_ABS_X: u8 = 0xFD;
pub const SBC_ABS_Y: u8 = 0xF9;
pub const SBC_IND_X: u8 = 0xE1;
pub const SBC_IND_Y: u8 = 0xF1;
// Flag sets
pub const SEC: u8 = 0x38;
pub const SED: u8 = 0xF8;
pub const SEI: u8 = 0x78;
// STA
pub const STA_ZP: u8 = 0x85;
pub const STA_ZP_X: u8 = 0x95;
pub const STA_ABS: u8 = 0x8D;
pub const STA_ABS_X: u8 = 0x9D;
pub const STA_ABS_Y: u8 = 0x99;
pub const STA_IND_X: u8 = 0x81;
pub const STA_IND_Y: u8 = 0x91;
// STX
pub const STX_ZP: u8 = 0x86;
pub const STX_ZP_Y: u8 = 0x96;
pub const STX_ABS: u8 = 0x8E;
// STY
pub const STY_ZP: u8 = 0x84;
pub const STY_ZP_X: u8 = 0x94;
pub const STY_ABS: u8 = 0x8C;
// Transfers
pub const TAX: u8 = 0xAA;
pub const TAY: u8 = 0xA8;
pub const TSX: u8 = 0xBA;
pub const TXA: u8 = 0x8A;
pub const TXS: u8 = 0x9A;
pub const TYA: u8 = 0x98;

/// Unofficial opcodes with stable, widely-relied-upon behaviour.
/// Anything not listed here or in the official table executes as a 2-cycle
/// NOP with a logged warning.
pub mod unofficial {
    /// 1-byte NOPs
    pub const NOPS: [u8; 6] = [0x1A, 0x3A, 0x5A, 0x7A, 0xDA, 0xFA];
    /// 2-byte NOPs that skip their immediate operand
    pub const SKBS: [u8; 5] = [0x80, 0x82, 0x89, 0xC2, 0xE2];
    /// NOPs that perform (and ignore) a zero page read
    pub const IGN_ZP: [u8; 3] = [0x04, 0x44, 0x64];
    /// NOPs that perform (and ignore) a zero page X read
    pub const IGN_ZP_X: [u8; 6] = [0x14, 0x34, 0x54, 0x74, 0xD4, 0xF4];
    /// NOP that performs (and ignores) an absolute read
    pub const IGN_ABS: u8 = 0x0C;
    /// NOPs that perform (and ignore) an absolute X read
    pub const IGN_ABS_X: [u8; 6] = [0x1C, 0x3C, 0x5C, 0x7C, 0xDC, 0xFC];
    /// SBC with the same behaviour as the official immediate encoding
    pub const SBC: u8 = 0xEB;
    // LAX (load A and X)
    pub const LAX_ZP: u8 = 0xA7;
    pub const LAX_ZP_Y: u8 = 0xB7;
    pub const LAX_ABS: u8 = 0xAF;
    pub const LAX_ABS_Y: u8 = 0xBF;
    pub const LAX_IND_X: u8 = 0xA3;
    pub const LAX_IND_Y: u8 = 0xB3;
    // SAX (store A & X)
    pub const SAX_ZP: u8 = 0x87;
    pub const SAX_ZP_Y: u8 = 0x97;
    pub const SAX_ABS: u8 = 0x8F;
    pub const SAX_IND_X: u8 = 0x83;
    // DCP (DEC then CMP)
    pub const DCP_ZP: u8 = 0xC7;
    pub const DCP_ZP_X: u8 = 0xD7;
    pub const DCP_ABS: u8 = 0xCF;
    pub const DCP_ABS_X: u8 = 0xDF;
    pub const DCP_ABS_Y: u8 = 0xDB;
    pub const DCP_IND_X: u8 = 0xC3;
    pub const DCP_IND_Y: u8 = 0xD3;
    // ISC (INC then SBC)
    pub const ISC_ZP: u8 = 0xE7;
    pub const ISC_ZP_X: u8 = 0xF7;
    pub const ISC_ABS: u8 = 0xEF;
    pub const ISC_ABS_X: u8 = 0xFF;
    pub const ISC_ABS_Y: u8 = 0xFB;
    pub const ISC_IND_X: u8 = 0xE3;
    pub const ISC_IND_Y: u8 = 0xF3;
    // RLA (ROL then AND)
    pub const RLA_ZP: u8 = 0x27;
    pub const RLA_ZP_X: u8 = 0x37;
    pub const RLA_ABS: u8 = 0x2F;
    pub const RLA_ABS_X: u8 = 0x3F;
    pub const RLA_ABS_Y: u8 = 0x3B;
    pub const RLA_IND_X: u8 = 0x23;
    pub const RLA_IND_Y: u8 = 0x33;
    // RRA (ROR then ADC)
    pub const RRA_ZP: u8 = 0x67;
    pub const RRA_ZP_X: u8 = 0x77;
    pub const RRA_ABS: u8 = 0x6F;
    pub const RRA_ABS_X: u8 = 0x7F;
    pub const RRA_ABS_Y: u8 = 0x7B;
    pub const RRA_IND_X: u8 = 0x63;
    pub const RRA_IND_Y: u8 = 0x73;
    // SLO (ASL then ORA)
    pub const SLO_ZP: u8 = 0x07;
    pub const SLO_ZP_X: u8 = 0x17;
    pub const SLO_ABS: u8 = 0x0F;
    pub const SLO_ABS_X: u8 = 0x1F;
    pub const SLO_ABS_Y: u8 = 0x1B;
    pub const SLO_IND_X: u8 = 0x03;
    pub const SLO_IND_Y: u8 = 0x13;
    // SRE (LSR then EOR)
    pub const SRE_ZP: u8 = 0x47;
    pub const SRE_ZP_X: u8 = 0x57;
    pub const SRE_ABS: u8 = 0x4F;
    pub const SRE_ABS_X: u8 = 0x5F;
    pub const SRE_ABS_Y: u8 = 0x5B;
    pub const SRE_IND_X: u8 = 0x43;
    pub const SRE_IND_Y: u8 = 0x53;
}
