//! The fixed 256-entry decode table.
//!
//! Every entry is either illegal (`None`) or carries the instruction, its
//! addressing mode, the base cycle count and the penalty class. The table
//! covers the official instruction set plus the unofficial NOP family the
//! nestest ROM exercises on its official path; all other unofficial
//! opcodes stay illegal and surface as [`crate::CpuError::UnknownOpcode`].

use crate::addressing::AddrMode;

/// Instruction selectors for the execute stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)] // the 6502 mnemonics are their own documentation
pub enum Instr {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
}

/// Cycle penalty class of a decode entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Penalty {
    /// Fixed cycle count.
    None,
    /// +1 when the indexed address crosses a 256-byte page.
    PageCross,
    /// +1 when the branch is taken, +1 more when the target crosses.
    Branch,
}

/// One decode table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    /// Instruction selector.
    pub instr: Instr,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Base cycle count.
    pub cycles: u8,
    /// Penalty class.
    pub penalty: Penalty,
}

const fn entry(instr: Instr, mode: AddrMode, cycles: u8, penalty: Penalty) -> Option<Opcode> {
    Some(Opcode {
        instr,
        mode,
        cycles,
        penalty,
    })
}

/// Decode a single opcode byte. `None` marks an illegal opcode.
#[allow(clippy::too_many_lines)]
#[must_use]
pub const fn decode(opcode: u8) -> Option<Opcode> {
    use AddrMode::{
        Absolute, AbsoluteX, AbsoluteY, Accumulator, Immediate, Implied, Indirect, IndirectX,
        IndirectY, Relative, ZeroPage, ZeroPageX, ZeroPageY,
    };
    use Instr::*;
    use Penalty::{Branch, PageCross};

    match opcode {
        0x00 => entry(Brk, Implied, 7, Penalty::None),
        0x01 => entry(Ora, IndirectX, 6, Penalty::None),
        0x05 => entry(Ora, ZeroPage, 3, Penalty::None),
        0x06 => entry(Asl, ZeroPage, 5, Penalty::None),
        0x08 => entry(Php, Implied, 3, Penalty::None),
        0x09 => entry(Ora, Immediate, 2, Penalty::None),
        0x0A => entry(Asl, Accumulator, 2, Penalty::None),
        0x0D => entry(Ora, Absolute, 4, Penalty::None),
        0x0E => entry(Asl, Absolute, 6, Penalty::None),
        0x10 => entry(Bpl, Relative, 2, Branch),
        0x11 => entry(Ora, IndirectY, 5, PageCross),
        0x15 => entry(Ora, ZeroPageX, 4, Penalty::None),
        0x16 => entry(Asl, ZeroPageX, 6, Penalty::None),
        0x18 => entry(Clc, Implied, 2, Penalty::None),
        0x19 => entry(Ora, AbsoluteY, 4, PageCross),
        0x1D => entry(Ora, AbsoluteX, 4, PageCross),
        0x1E => entry(Asl, AbsoluteX, 7, Penalty::None),
        0x20 => entry(Jsr, Absolute, 6, Penalty::None),
        0x21 => entry(And, IndirectX, 6, Penalty::None),
        0x24 => entry(Bit, ZeroPage, 3, Penalty::None),
        0x25 => entry(And, ZeroPage, 3, Penalty::None),
        0x26 => entry(Rol, ZeroPage, 5, Penalty::None),
        0x28 => entry(Plp, Implied, 4, Penalty::None),
        0x29 => entry(And, Immediate, 2, Penalty::None),
        0x2A => entry(Rol, Accumulator, 2, Penalty::None),
        0x2C => entry(Bit, Absolute, 4, Penalty::None),
        0x2D => entry(And, Absolute, 4, Penalty::None),
        0x2E => entry(Rol, Absolute, 6, Penalty::None),
        0x30 => entry(Bmi, Relative, 2, Branch),
        0x31 => entry(And, IndirectY, 5, PageCross),
        0x35 => entry(And, ZeroPageX, 4, Penalty::None),
        0x36 => entry(Rol, ZeroPageX, 6, Penalty::None),
        0x38 => entry(Sec, Implied, 2, Penalty::None),
        0x39 => entry(And, AbsoluteY, 4, PageCross),
        0x3D => entry(And, AbsoluteX, 4, PageCross),
        0x3E => entry(Rol, AbsoluteX, 7, Penalty::None),
        0x40 => entry(Rti, Implied, 6, Penalty::None),
        0x41 => entry(Eor, IndirectX, 6, Penalty::None),
        0x45 => entry(Eor, ZeroPage, 3, Penalty::None),
        0x46 => entry(Lsr, ZeroPage, 5, Penalty::None),
        0x48 => entry(Pha, Implied, 3, Penalty::None),
        0x49 => entry(Eor, Immediate, 2, Penalty::None),
        0x4A => entry(Lsr, Accumulator, 2, Penalty::None),
        0x4C => entry(Jmp, Absolute, 3, Penalty::None),
        0x4D => entry(Eor, Absolute, 4, Penalty::None),
        0x4E => entry(Lsr, Absolute, 6, Penalty::None),
        0x50 => entry(Bvc, Relative, 2, Branch),
        0x51 => entry(Eor, IndirectY, 5, PageCross),
        0x55 => entry(Eor, ZeroPageX, 4, Penalty::None),
        0x56 => entry(Lsr, ZeroPageX, 6, Penalty::None),
        0x58 => entry(Cli, Implied, 2, Penalty::None),
        0x59 => entry(Eor, AbsoluteY, 4, PageCross),
        0x5D => entry(Eor, AbsoluteX, 4, PageCross),
        0x5E => entry(Lsr, AbsoluteX, 7, Penalty::None),
        0x60 => entry(Rts, Implied, 6, Penalty::None),
        0x61 => entry(Adc, IndirectX, 6, Penalty::None),
        0x65 => entry(Adc, ZeroPage, 3, Penalty::None),
        0x66 => entry(Ror, ZeroPage, 5, Penalty::None),
        0x68 => entry(Pla, Implied, 4, Penalty::None),
        0x69 => entry(Adc, Immediate, 2, Penalty::None),
        0x6A => entry(Ror, Accumulator, 2, Penalty::None),
        0x6C => entry(Jmp, Indirect, 5, Penalty::None),
        0x6D => entry(Adc, Absolute, 4, Penalty::None),
        0x6E => entry(Ror, Absolute, 6, Penalty::None),
        0x70 => entry(Bvs, Relative, 2, Branch),
        0x71 => entry(Adc, IndirectY, 5, PageCross),
        0x75 => entry(Adc, ZeroPageX, 4, Penalty::None),
        0x76 => entry(Ror, ZeroPageX, 6, Penalty::None),
        0x78 => entry(Sei, Implied, 2, Penalty::None),
        0x79 => entry(Adc, AbsoluteY, 4, PageCross),
        0x7D => entry(Adc, AbsoluteX, 4, PageCross),
        0x7E => entry(Ror, AbsoluteX, 7, Penalty::None),
        0x81 => entry(Sta, IndirectX, 6, Penalty::None),
        0x84 => entry(Sty, ZeroPage, 3, Penalty::None),
        0x85 => entry(Sta, ZeroPage, 3, Penalty::None),
        0x86 => entry(Stx, ZeroPage, 3, Penalty::None),
        0x88 => entry(Dey, Implied, 2, Penalty::None),
        0x8A => entry(Txa, Implied, 2, Penalty::None),
        0x8C => entry(Sty, Absolute, 4, Penalty::None),
        0x8D => entry(Sta, Absolute, 4, Penalty::None),
        0x8E => entry(Stx, Absolute, 4, Penalty::None),
        0x90 => entry(Bcc, Relative, 2, Branch),
        0x91 => entry(Sta, IndirectY, 6, Penalty::None),
        0x94 => entry(Sty, ZeroPageX, 4, Penalty::None),
        0x95 => entry(Sta, ZeroPageX, 4, Penalty::None),
        0x96 => entry(Stx, ZeroPageY, 4, Penalty::None),
        0x98 => entry(Tya, Implied, 2, Penalty::None),
        0x99 => entry(Sta, AbsoluteY, 5, Penalty::None),
        0x9A => entry(Txs, Implied, 2, Penalty::None),
        0x9D => entry(Sta, AbsoluteX, 5, Penalty::None),
        0xA0 => entry(Ldy, Immediate, 2, Penalty::None),
        0xA1 => entry(Lda, IndirectX, 6, Penalty::None),
        0xA2 => entry(Ldx, Immediate, 2, Penalty::None),
        0xA4 => entry(Ldy, ZeroPage, 3, Penalty::None),
        0xA5 => entry(Lda, ZeroPage, 3, Penalty::None),
        0xA6 => entry(Ldx, ZeroPage, 3, Penalty::None),
        0xA8 => entry(Tay, Implied, 2, Penalty::None),
        0xA9 => entry(Lda, Immediate, 2, Penalty::None),
        0xAA => entry(Tax, Implied, 2, Penalty::None),
        0xAC => entry(Ldy, Absolute, 4, Penalty::None),
        0xAD => entry(Lda, Absolute, 4, Penalty::None),
        0xAE => entry(Ldx, Absolute, 4, Penalty::None),
        0xB0 => entry(Bcs, Relative, 2, Branch),
        0xB1 => entry(Lda, IndirectY, 5, PageCross),
        0xB4 => entry(Ldy, ZeroPageX, 4, Penalty::None),
        0xB5 => entry(Lda, ZeroPageX, 4, Penalty::None),
        0xB6 => entry(Ldx, ZeroPageY, 4, Penalty::None),
        0xB8 => entry(Clv, Implied, 2, Penalty::None),
        0xB9 => entry(Lda, AbsoluteY, 4, PageCross),
        0xBA => entry(Tsx, Implied, 2, Penalty::None),
        0xBC => entry(Ldy, AbsoluteX, 4, PageCross),
        0xBD => entry(Lda, AbsoluteX, 4, PageCross),
        0xBE => entry(Ldx, AbsoluteY, 4, PageCross),
        0xC0 => entry(Cpy, Immediate, 2, Penalty::None),
        0xC1 => entry(Cmp, IndirectX, 6, Penalty::None),
        0xC4 => entry(Cpy, ZeroPage, 3, Penalty::None),
        0xC5 => entry(Cmp, ZeroPage, 3, Penalty::None),
        0xC6 => entry(Dec, ZeroPage, 5, Penalty::None),
        0xC8 => entry(Iny, Implied, 2, Penalty::None),
        0xC9 => entry(Cmp, Immediate, 2, Penalty::None),
        0xCA => entry(Dex, Implied, 2, Penalty::None),
        0xCC => entry(Cpy, Absolute, 4, Penalty::None),
        0xCD => entry(Cmp, Absolute, 4, Penalty::None),
        0xCE => entry(Dec, Absolute, 6, Penalty::None),
        0xD0 => entry(Bne, Relative, 2, Branch),
        0xD1 => entry(Cmp, IndirectY, 5, PageCross),
        0xD5 => entry(Cmp, ZeroPageX, 4, Penalty::None),
        0xD6 => entry(Dec, ZeroPageX, 6, Penalty::None),
        0xD8 => entry(Cld, Implied, 2, Penalty::None),
        0xD9 => entry(Cmp, AbsoluteY, 4, PageCross),
        0xDD => entry(Cmp, AbsoluteX, 4, PageCross),
        0xDE => entry(Dec, AbsoluteX, 7, Penalty::None),
        0xE0 => entry(Cpx, Immediate, 2, Penalty::None),
        0xE1 => entry(Sbc, IndirectX, 6, Penalty::None),
        0xE4 => entry(Cpx, ZeroPage, 3, Penalty::None),
        0xE5 => entry(Sbc, ZeroPage, 3, Penalty::None),
        0xE6 => entry(Inc, ZeroPage, 5, Penalty::None),
        0xE8 => entry(Inx, Implied, 2, Penalty::None),
        0xE9 => entry(Sbc, Immediate, 2, Penalty::None),
        0xEA => entry(Nop, Implied, 2, Penalty::None),
        0xEC => entry(Cpx, Absolute, 4, Penalty::None),
        0xED => entry(Sbc, Absolute, 4, Penalty::None),
        0xEE => entry(Inc, Absolute, 6, Penalty::None),
        0xF0 => entry(Beq, Relative, 2, Branch),
        0xF1 => entry(Sbc, IndirectY, 5, PageCross),
        0xF5 => entry(Sbc, ZeroPageX, 4, Penalty::None),
        0xF6 => entry(Inc, ZeroPageX, 6, Penalty::None),
        0xF8 => entry(Sed, Implied, 2, Penalty::None),
        0xF9 => entry(Sbc, AbsoluteY, 4, PageCross),
        0xFD => entry(Sbc, AbsoluteX, 4, PageCross),
        0xFE => entry(Inc, AbsoluteX, 7, Penalty::None),

        // Unofficial NOP family exercised by nestest.
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => entry(Nop, Implied, 2, Penalty::None),
        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => entry(Nop, Immediate, 2, Penalty::None),
        0x04 | 0x44 | 0x64 => entry(Nop, ZeroPage, 3, Penalty::None),
        0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => entry(Nop, ZeroPageX, 4, Penalty::None),
        0x0C => entry(Nop, Absolute, 4, Penalty::None),
        0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => entry(Nop, AbsoluteX, 4, PageCross),

        _ => None,
    }
}

/// The decode table, indexed by opcode byte.
pub static DECODE: [Option<Opcode>; 256] = {
    let mut table = [None; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
};
