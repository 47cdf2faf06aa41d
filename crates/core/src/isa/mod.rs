//! Instruction set: decoding, condition codes, disassembly.
//!
//! The encoding is a fixed 16-bit word: a 6-bit opcode in the top bits and
//! two 5-bit operand fields. One opcode (`movei`) extends the instruction
//! with a 32-bit immediate carried in the next two words. The same closed
//! [`Opcode`] enumeration feeds both the interpreter and the disassembler,
//! so the two can never drift apart.

/// Condition-code table for `jump`/`jr`.
pub mod condition;
/// Instruction word decoding.
pub mod decode;
/// Listing generation.
pub mod disasm;

pub use decode::{Instruction, Opcode, decode};
pub use disasm::{ListingEntry, disassemble_range};
