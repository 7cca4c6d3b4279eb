//! Static instruction table for the documented NMOS 6502 instruction set.
//!
//! Illegal and undocumented opcodes are absent; [`lookup`] returns `None` for
//! them and it is the caller's job to decide what that means. The per-opcode
//! lookup table is precomputed once at compile time and never changes.

/// How an instruction's operand bytes form an effective address or literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// `JMP ($hhll)`
    Indirect,
    /// `($ll, X)`
    IndirectX,
    /// `($ll), Y`
    IndirectY,
    Relative,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    pub fn operand_size(self) -> usize {
        use AddressingMode::*;

        match self {
            Implied | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY | Relative => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

/// Static per-opcode descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    /// Lowercase mnemonic text as it appears in the listing.
    pub name: &'static str,
    pub opcode: u8,
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    flags: u8,
}

impl OpInfo {
    /// Control-transfer instruction (branches, jumps, calls, returns).
    pub const JUMP: u8 = 1 << 0;
    /// Unconditional transfer that ends fall-through (JMP, RTI, RTS).
    pub const END: u8 = 1 << 1;
    /// Subroutine call.
    pub const CALL: u8 = 1 << 2;
    /// The memory operand is a write target.
    pub const WRITE: u8 = 1 << 3;

    pub fn is_jump(&self) -> bool {
        self.flags & Self::JUMP != 0
    }

    pub fn is_end(&self) -> bool {
        self.flags & Self::END != 0
    }

    pub fn is_call(&self) -> bool {
        self.flags & Self::CALL != 0
    }

    pub fn is_write(&self) -> bool {
        self.flags & Self::WRITE != 0
    }
}

const fn op(name: &'static str, opcode: u8, mnemonic: Mnemonic, mode: AddressingMode, flags: u8) -> OpInfo {
    OpInfo { name, opcode, mnemonic, mode, flags }
}

use AddressingMode as Am;
use Mnemonic as Mn;

const JUMP: u8 = OpInfo::JUMP;
const END: u8 = OpInfo::END;
const CALL: u8 = OpInfo::CALL;
const WRITE: u8 = OpInfo::WRITE;

/// Every documented opcode/addressing-mode combination.
pub const OPCODES: &[OpInfo] = &[
    // adc
    op("adc", 0x69, Mn::Adc, Am::Immediate, 0),
    op("adc", 0x65, Mn::Adc, Am::ZeroPage, 0),
    op("adc", 0x75, Mn::Adc, Am::ZeroPageX, 0),
    op("adc", 0x6D, Mn::Adc, Am::Absolute, 0),
    op("adc", 0x7D, Mn::Adc, Am::AbsoluteX, 0),
    op("adc", 0x79, Mn::Adc, Am::AbsoluteY, 0),
    op("adc", 0x61, Mn::Adc, Am::IndirectX, 0),
    op("adc", 0x71, Mn::Adc, Am::IndirectY, 0),
    // and
    op("and", 0x29, Mn::And, Am::Immediate, 0),
    op("and", 0x25, Mn::And, Am::ZeroPage, 0),
    op("and", 0x35, Mn::And, Am::ZeroPageX, 0),
    op("and", 0x2D, Mn::And, Am::Absolute, 0),
    op("and", 0x3D, Mn::And, Am::AbsoluteX, 0),
    op("and", 0x39, Mn::And, Am::AbsoluteY, 0),
    op("and", 0x21, Mn::And, Am::IndirectX, 0),
    op("and", 0x31, Mn::And, Am::IndirectY, 0),
    // asl
    op("asl", 0x0A, Mn::Asl, Am::Accumulator, 0),
    op("asl", 0x06, Mn::Asl, Am::ZeroPage, WRITE),
    op("asl", 0x16, Mn::Asl, Am::ZeroPageX, WRITE),
    op("asl", 0x0E, Mn::Asl, Am::Absolute, WRITE),
    op("asl", 0x1E, Mn::Asl, Am::AbsoluteX, WRITE),
    // branches
    op("bcc", 0x90, Mn::Bcc, Am::Relative, JUMP),
    op("bcs", 0xB0, Mn::Bcs, Am::Relative, JUMP),
    op("beq", 0xF0, Mn::Beq, Am::Relative, JUMP),
    // bit
    op("bit", 0x24, Mn::Bit, Am::ZeroPage, 0),
    op("bit", 0x2C, Mn::Bit, Am::Absolute, 0),
    op("bmi", 0x30, Mn::Bmi, Am::Relative, JUMP),
    op("bne", 0xD0, Mn::Bne, Am::Relative, JUMP),
    op("bpl", 0x10, Mn::Bpl, Am::Relative, JUMP),
    // brk
    op("brk", 0x00, Mn::Brk, Am::Implied, JUMP),
    op("bvc", 0x50, Mn::Bvc, Am::Relative, JUMP),
    op("bvs", 0x70, Mn::Bvs, Am::Relative, JUMP),
    // flag ops
    op("clc", 0x18, Mn::Clc, Am::Implied, 0),
    op("cld", 0xD8, Mn::Cld, Am::Implied, 0),
    op("cli", 0x58, Mn::Cli, Am::Implied, 0),
    op("clv", 0xB8, Mn::Clv, Am::Implied, 0),
    // cmp
    op("cmp", 0xC9, Mn::Cmp, Am::Immediate, 0),
    op("cmp", 0xC5, Mn::Cmp, Am::ZeroPage, 0),
    op("cmp", 0xD5, Mn::Cmp, Am::ZeroPageX, 0),
    op("cmp", 0xCD, Mn::Cmp, Am::Absolute, 0),
    op("cmp", 0xDD, Mn::Cmp, Am::AbsoluteX, 0),
    op("cmp", 0xD9, Mn::Cmp, Am::AbsoluteY, 0),
    op("cmp", 0xC1, Mn::Cmp, Am::IndirectX, 0),
    op("cmp", 0xD1, Mn::Cmp, Am::IndirectY, 0),
    // cpx
    op("cpx", 0xE0, Mn::Cpx, Am::Immediate, 0),
    op("cpx", 0xE4, Mn::Cpx, Am::ZeroPage, 0),
    op("cpx", 0xEC, Mn::Cpx, Am::Absolute, 0),
    // cpy
    op("cpy", 0xC0, Mn::Cpy, Am::Immediate, 0),
    op("cpy", 0xC4, Mn::Cpy, Am::ZeroPage, 0),
    op("cpy", 0xCC, Mn::Cpy, Am::Absolute, 0),
    // dec
    op("dec", 0xC6, Mn::Dec, Am::ZeroPage, WRITE),
    op("dec", 0xD6, Mn::Dec, Am::ZeroPageX, WRITE),
    op("dec", 0xCE, Mn::Dec, Am::Absolute, WRITE),
    op("dec", 0xDE, Mn::Dec, Am::AbsoluteX, WRITE),
    op("dex", 0xCA, Mn::Dex, Am::Implied, 0),
    op("dey", 0x88, Mn::Dey, Am::Implied, 0),
    // eor
    op("eor", 0x49, Mn::Eor, Am::Immediate, 0),
    op("eor", 0x45, Mn::Eor, Am::ZeroPage, 0),
    op("eor", 0x55, Mn::Eor, Am::ZeroPageX, 0),
    op("eor", 0x4D, Mn::Eor, Am::Absolute, 0),
    op("eor", 0x5D, Mn::Eor, Am::AbsoluteX, 0),
    op("eor", 0x59, Mn::Eor, Am::AbsoluteY, 0),
    op("eor", 0x41, Mn::Eor, Am::IndirectX, 0),
    op("eor", 0x51, Mn::Eor, Am::IndirectY, 0),
    // inc
    op("inc", 0xE6, Mn::Inc, Am::ZeroPage, WRITE),
    op("inc", 0xF6, Mn::Inc, Am::ZeroPageX, WRITE),
    op("inc", 0xEE, Mn::Inc, Am::Absolute, WRITE),
    op("inc", 0xFE, Mn::Inc, Am::AbsoluteX, WRITE),
    op("inx", 0xE8, Mn::Inx, Am::Implied, 0),
    op("iny", 0xC8, Mn::Iny, Am::Implied, 0),
    // jmp
    op("jmp", 0x4C, Mn::Jmp, Am::Absolute, JUMP | END),
    op("jmp", 0x6C, Mn::Jmp, Am::Indirect, JUMP | END),
    // jsr
    op("jsr", 0x20, Mn::Jsr, Am::Absolute, JUMP | CALL),
    // lda
    op("lda", 0xA9, Mn::Lda, Am::Immediate, 0),
    op("lda", 0xA5, Mn::Lda, Am::ZeroPage, 0),
    op("lda", 0xB5, Mn::Lda, Am::ZeroPageX, 0),
    op("lda", 0xAD, Mn::Lda, Am::Absolute, 0),
    op("lda", 0xBD, Mn::Lda, Am::AbsoluteX, 0),
    op("lda", 0xB9, Mn::Lda, Am::AbsoluteY, 0),
    op("lda", 0xA1, Mn::Lda, Am::IndirectX, 0),
    op("lda", 0xB1, Mn::Lda, Am::IndirectY, 0),
    // ldx
    op("ldx", 0xA2, Mn::Ldx, Am::Immediate, 0),
    op("ldx", 0xA6, Mn::Ldx, Am::ZeroPage, 0),
    op("ldx", 0xB6, Mn::Ldx, Am::ZeroPageY, 0),
    op("ldx", 0xAE, Mn::Ldx, Am::Absolute, 0),
    op("ldx", 0xBE, Mn::Ldx, Am::AbsoluteY, 0),
    // ldy
    op("ldy", 0xA0, Mn::Ldy, Am::Immediate, 0),
    op("ldy", 0xA4, Mn::Ldy, Am::ZeroPage, 0),
    op("ldy", 0xB4, Mn::Ldy, Am::ZeroPageX, 0),
    op("ldy", 0xAC, Mn::Ldy, Am::Absolute, 0),
    op("ldy", 0xBC, Mn::Ldy, Am::AbsoluteX, 0),
    // lsr
    op("lsr", 0x4A, Mn::Lsr, Am::Accumulator, 0),
    op("lsr", 0x46, Mn::Lsr, Am::ZeroPage, WRITE),
    op("lsr", 0x56, Mn::Lsr, Am::ZeroPageX, WRITE),
    op("lsr", 0x4E, Mn::Lsr, Am::Absolute, WRITE),
    op("lsr", 0x5E, Mn::Lsr, Am::AbsoluteX, WRITE),
    // nop
    op("nop", 0xEA, Mn::Nop, Am::Implied, 0),
    // ora
    op("ora", 0x09, Mn::Ora, Am::Immediate, 0),
    op("ora", 0x05, Mn::Ora, Am::ZeroPage, 0),
    op("ora", 0x15, Mn::Ora, Am::ZeroPageX, 0),
    op("ora", 0x0D, Mn::Ora, Am::Absolute, 0),
    op("ora", 0x1D, Mn::Ora, Am::AbsoluteX, 0),
    op("ora", 0x19, Mn::Ora, Am::AbsoluteY, 0),
    op("ora", 0x01, Mn::Ora, Am::IndirectX, 0),
    op("ora", 0x11, Mn::Ora, Am::IndirectY, 0),
    // stack ops
    op("pha", 0x48, Mn::Pha, Am::Implied, 0),
    op("php", 0x08, Mn::Php, Am::Implied, 0),
    op("pla", 0x68, Mn::Pla, Am::Implied, 0),
    op("plp", 0x28, Mn::Plp, Am::Implied, 0),
    // rol
    op("rol", 0x2A, Mn::Rol, Am::Accumulator, 0),
    op("rol", 0x26, Mn::Rol, Am::ZeroPage, WRITE),
    op("rol", 0x36, Mn::Rol, Am::ZeroPageX, WRITE),
    op("rol", 0x2E, Mn::Rol, Am::Absolute, WRITE),
    op("rol", 0x3E, Mn::Rol, Am::AbsoluteX, WRITE),
    // ror
    op("ror", 0x6A, Mn::Ror, Am::Accumulator, 0),
    op("ror", 0x66, Mn::Ror, Am::ZeroPage, WRITE),
    op("ror", 0x76, Mn::Ror, Am::ZeroPageX, WRITE),
    op("ror", 0x6E, Mn::Ror, Am::Absolute, WRITE),
    op("ror", 0x7E, Mn::Ror, Am::AbsoluteX, WRITE),
    // returns
    op("rti", 0x40, Mn::Rti, Am::Implied, JUMP | END),
    op("rts", 0x60, Mn::Rts, Am::Implied, JUMP | END),
    // sbc
    op("sbc", 0xE9, Mn::Sbc, Am::Immediate, 0),
    op("sbc", 0xE5, Mn::Sbc, Am::ZeroPage, 0),
    op("sbc", 0xF5, Mn::Sbc, Am::ZeroPageX, 0),
    op("sbc", 0xED, Mn::Sbc, Am::Absolute, 0),
    op("sbc", 0xFD, Mn::Sbc, Am::AbsoluteX, 0),
    op("sbc", 0xF9, Mn::Sbc, Am::AbsoluteY, 0),
    op("sbc", 0xE1, Mn::Sbc, Am::IndirectX, 0),
    op("sbc", 0xF1, Mn::Sbc, Am::IndirectY, 0),
    // set flag ops
    op("sec", 0x38, Mn::Sec, Am::Implied, 0),
    op("sed", 0xF8, Mn::Sed, Am::Implied, 0),
    op("sei", 0x78, Mn::Sei, Am::Implied, 0),
    // sta
    op("sta", 0x85, Mn::Sta, Am::ZeroPage, WRITE),
    op("sta", 0x95, Mn::Sta, Am::ZeroPageX, WRITE),
    op("sta", 0x8D, Mn::Sta, Am::Absolute, WRITE),
    op("sta", 0x9D, Mn::Sta, Am::AbsoluteX, WRITE),
    op("sta", 0x99, Mn::Sta, Am::AbsoluteY, WRITE),
    op("sta", 0x81, Mn::Sta, Am::IndirectX, WRITE),
    op("sta", 0x91, Mn::Sta, Am::IndirectY, WRITE),
    // stx
    op("stx", 0x86, Mn::Stx, Am::ZeroPage, WRITE),
    op("stx", 0x96, Mn::Stx, Am::ZeroPageY, WRITE),
    op("stx", 0x8E, Mn::Stx, Am::Absolute, WRITE),
    // sty
    op("sty", 0x84, Mn::Sty, Am::ZeroPage, WRITE),
    op("sty", 0x94, Mn::Sty, Am::ZeroPageX, WRITE),
    op("sty", 0x8C, Mn::Sty, Am::Absolute, WRITE),
    // transfers
    op("tax", 0xAA, Mn::Tax, Am::Implied, 0),
    op("tay", 0xA8, Mn::Tay, Am::Implied, 0),
    op("tsx", 0xBA, Mn::Tsx, Am::Implied, 0),
    op("txa", 0x8A, Mn::Txa, Am::Implied, 0),
    op("txs", 0x9A, Mn::Txs, Am::Implied, 0),
    op("tya", 0x98, Mn::Tya, Am::Implied, 0),
];

const fn build_lookup() -> [Option<OpInfo>; 256] {
    let mut table = [None; 256];

    let mut i = 0;
    while i < OPCODES.len() {
        table[OPCODES[i].opcode as usize] = Some(OPCODES[i]);
        i += 1;
    }

    table
}

static LOOKUP: [Option<OpInfo>; 256] = build_lookup();

/// Descriptor for `opcode`, or `None` for illegal/undocumented opcodes.
pub fn lookup(opcode: u8) -> Option<&'static OpInfo> {
    LOOKUP[opcode as usize].as_ref()
}

/// Encoded size of the instruction starting with `opcode`.
///
/// Unknown opcodes advance by one byte, matching how the repair pass walks
/// blocks.
pub fn instr_size(opcode: u8) -> usize {
    match lookup(opcode) {
        Some(info) => 1 + info.mode.operand_size(),
        None => 1,
    }
}
