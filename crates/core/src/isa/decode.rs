//! Instruction word decoding.
//!
//! For a 16-bit word `w`: `opcode = w >> 10`, `reg1 = (w >> 5) & 31`,
//! `reg2 = w & 31`. The opcode space is a closed set; encodings outside the
//! documented table decode to [`Opcode::Unknown`] carrying the raw code, so
//! nothing is ever silently dropped and a decode always round-trips.

use crate::common::constants::{INSTRUCTION_SIZE, MOVEI_SIZE, OPCODE_SHIFT, REG1_SHIFT, REG_MASK};

/// The closed opcode set of the Tom/Jerry RISC.
///
/// Variant order groups the families (arithmetic, logic, bit, multiply,
/// shift, compare, saturate, moves, load/store, flow); the numeric encoding
/// is defined by [`Opcode::from_code`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)] // the mnemonics are the documentation
pub enum Opcode {
    Add,
    Addc,
    Addq,
    Addqt,
    Sub,
    Subc,
    Subq,
    Subqt,
    Neg,
    And,
    Or,
    Xor,
    Not,
    Btst,
    Bset,
    Bclr,
    Mult,
    Imult,
    Div,
    Abs,
    Sh,
    Shlq,
    Shrq,
    Sha,
    Sharq,
    Ror,
    Rorq,
    Cmp,
    Cmpq,
    Sat8,
    Sat16,
    Sat24,
    Move,
    Moveq,
    Moveta,
    Movefa,
    Movei,
    MovePc,
    Loadb,
    Loadw,
    Load,
    Loadp,
    LoadR14Ind,
    LoadR15Ind,
    LoadR14Reg,
    LoadR15Reg,
    Storeb,
    Storew,
    Store,
    Storep,
    StoreR14Ind,
    StoreR15Ind,
    StoreR14Reg,
    StoreR15Reg,
    Jump,
    Jr,
    PackUnpack,
    /// An encoding outside the documented table; carries the raw 6-bit code.
    Unknown(u8),
}

impl Opcode {
    /// Maps a raw 6-bit code to its opcode.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Opcode::Add,
            1 => Opcode::Addc,
            2 => Opcode::Addq,
            3 => Opcode::Addqt,
            4 => Opcode::Sub,
            5 => Opcode::Subc,
            6 => Opcode::Subq,
            7 => Opcode::Subqt,
            8 => Opcode::Neg,
            9 => Opcode::And,
            10 => Opcode::Or,
            11 => Opcode::Xor,
            12 => Opcode::Not,
            13 => Opcode::Btst,
            14 => Opcode::Bset,
            15 => Opcode::Bclr,
            16 => Opcode::Mult,
            17 => Opcode::Imult,
            21 => Opcode::Div,
            22 => Opcode::Abs,
            23 => Opcode::Sh,
            24 => Opcode::Shlq,
            25 => Opcode::Shrq,
            26 => Opcode::Sha,
            27 => Opcode::Sharq,
            28 => Opcode::Ror,
            29 => Opcode::Rorq,
            30 => Opcode::Cmp,
            31 => Opcode::Cmpq,
            32 => Opcode::Sat8,
            33 => Opcode::Sat16,
            34 => Opcode::Move,
            35 => Opcode::Moveq,
            36 => Opcode::Moveta,
            37 => Opcode::Movefa,
            38 => Opcode::Movei,
            39 => Opcode::Loadb,
            40 => Opcode::Loadw,
            41 => Opcode::Load,
            42 => Opcode::Loadp,
            43 => Opcode::LoadR14Ind,
            44 => Opcode::LoadR15Ind,
            45 => Opcode::Storeb,
            46 => Opcode::Storew,
            47 => Opcode::Store,
            48 => Opcode::Storep,
            49 => Opcode::StoreR14Ind,
            50 => Opcode::StoreR15Ind,
            51 => Opcode::MovePc,
            52 => Opcode::Jump,
            53 => Opcode::Jr,
            58 => Opcode::LoadR14Reg,
            59 => Opcode::LoadR15Reg,
            60 => Opcode::StoreR14Reg,
            61 => Opcode::StoreR15Reg,
            62 => Opcode::Sat24,
            63 => Opcode::PackUnpack,
            other => Opcode::Unknown(other & 0x3F),
        }
    }

    /// The inverse of [`Opcode::from_code`].
    pub fn code(self) -> u8 {
        match self {
            Opcode::Add => 0,
            Opcode::Addc => 1,
            Opcode::Addq => 2,
            Opcode::Addqt => 3,
            Opcode::Sub => 4,
            Opcode::Subc => 5,
            Opcode::Subq => 6,
            Opcode::Subqt => 7,
            Opcode::Neg => 8,
            Opcode::And => 9,
            Opcode::Or => 10,
            Opcode::Xor => 11,
            Opcode::Not => 12,
            Opcode::Btst => 13,
            Opcode::Bset => 14,
            Opcode::Bclr => 15,
            Opcode::Mult => 16,
            Opcode::Imult => 17,
            Opcode::Div => 21,
            Opcode::Abs => 22,
            Opcode::Sh => 23,
            Opcode::Shlq => 24,
            Opcode::Shrq => 25,
            Opcode::Sha => 26,
            Opcode::Sharq => 27,
            Opcode::Ror => 28,
            Opcode::Rorq => 29,
            Opcode::Cmp => 30,
            Opcode::Cmpq => 31,
            Opcode::Sat8 => 32,
            Opcode::Sat16 => 33,
            Opcode::Move => 34,
            Opcode::Moveq => 35,
            Opcode::Moveta => 36,
            Opcode::Movefa => 37,
            Opcode::Movei => 38,
            Opcode::Loadb => 39,
            Opcode::Loadw => 40,
            Opcode::Load => 41,
            Opcode::Loadp => 42,
            Opcode::LoadR14Ind => 43,
            Opcode::LoadR15Ind => 44,
            Opcode::Storeb => 45,
            Opcode::Storew => 46,
            Opcode::Store => 47,
            Opcode::Storep => 48,
            Opcode::StoreR14Ind => 49,
            Opcode::StoreR15Ind => 50,
            Opcode::MovePc => 51,
            Opcode::Jump => 52,
            Opcode::Jr => 53,
            Opcode::LoadR14Reg => 58,
            Opcode::LoadR15Reg => 59,
            Opcode::StoreR14Reg => 60,
            Opcode::StoreR15Reg => 61,
            Opcode::Sat24 => 62,
            Opcode::PackUnpack => 63,
            Opcode::Unknown(code) => code & 0x3F,
        }
    }

    /// Instruction width in bytes: 6 for `movei`, 2 for everything else.
    /// Step-size accounting uses this everywhere (interpreter, skip,
    /// disassembly walk).
    #[inline]
    pub fn size(self) -> i32 {
        if self == Opcode::Movei {
            MOVEI_SIZE
        } else {
            INSTRUCTION_SIZE
        }
    }

    /// Whether this is one of the two delayed-branch opcodes. A pending
    /// delay-slot target is only committed after a non-branch instruction.
    #[inline]
    pub fn is_branch(self) -> bool {
        matches!(self, Opcode::Jump | Opcode::Jr)
    }
}

/// A decoded instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// The decoded opcode.
    pub opcode: Opcode,
    /// First 5-bit operand field (source register, quick value, or
    /// displacement depending on the opcode).
    pub reg1: u8,
    /// Second 5-bit operand field (destination register or condition code).
    pub reg2: u8,
}

impl Instruction {
    /// Re-encodes the instruction into its 16-bit word. Exact inverse of
    /// [`decode`] for every 16-bit value.
    pub fn encode(self) -> u16 {
        (u16::from(self.opcode.code()) << OPCODE_SHIFT)
            | (u16::from(self.reg1) << REG1_SHIFT)
            | u16::from(self.reg2)
    }
}

/// Decodes a 16-bit instruction word into its opcode and operand fields.
#[inline]
pub fn decode(word: u16) -> Instruction {
    Instruction {
        opcode: Opcode::from_code((word >> OPCODE_SHIFT) as u8),
        reg1: ((word >> REG1_SHIFT) & REG_MASK) as u8,
        reg2: (word & REG_MASK) as u8,
    }
}
