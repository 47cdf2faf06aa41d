//! Listing generation for loaded images.
//!
//! Walks a byte range with the shared decoder, producing one entry per
//! instruction with the classic Madmacs-style mnemonic column. Because a
//! listing can cover a large image, the walk reports percentage progress
//! through a caller-supplied observer instead of blocking until done.
//!
//! # Usage
//!
//! ```ignore
//! use jagrisc_core::isa::disasm::disassemble_range;
//! let listing = disassemble_range(&mem, 0x4000, 8, &mut |_pct| {});
//! assert_eq!(listing[0].to_string(), "$00004000: add    r1,r2");
//! ```

use std::fmt;

use crate::isa::condition;
use crate::isa::decode::{Opcode, decode};
use crate::mem::AddressSpace;

/// One line of the disassembly listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingEntry {
    /// Address of the instruction.
    pub addr: i32,
    /// Mnemonic text, without the address column.
    pub text: String,
}

impl fmt::Display for ListingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:08X}: {}", self.addr, self.text)
    }
}

/// Disassembles `[load_address, load_address + program_size)`.
///
/// `progress` is called with a 0–100 percentage after each decoded
/// instruction, and once more with 100 when the walk finishes. The walk
/// stops early if it runs off the end of the address space.
pub fn disassemble_range(
    mem: &AddressSpace,
    load_address: i32,
    program_size: i32,
    progress: &mut dyn FnMut(u8),
) -> Vec<ListingEntry> {
    let mut listing = Vec::new();
    let mut addr = load_address;
    let mut remaining = program_size;

    while remaining > 1 {
        let Some(bytes) = mem.slice(addr, 2) else {
            break;
        };
        let word = u16::from_be_bytes([bytes[0], bytes[1]]);
        let inst = decode(word);
        let mut width = 2;

        let text = match inst.opcode {
            Opcode::Movei => {
                let Some(ext) = mem.slice(addr + 2, 4) else {
                    break;
                };
                // Low word first, then high word; each word big-endian.
                let value = (u32::from(ext[0]) << 8)
                    | u32::from(ext[1])
                    | (u32::from(ext[2]) << 24)
                    | (u32::from(ext[3]) << 16);
                width = 6;
                line("movei", format!("#${value:08X},r{}", inst.reg2))
            }
            other => render(other, inst.reg1, inst.reg2, addr),
        };

        listing.push(ListingEntry { addr, text });
        addr += width;
        remaining -= width;
        if program_size > 0 {
            let pct = 100 - (i64::from(remaining.max(0)) * 100 / i64::from(program_size));
            progress(pct.clamp(0, 100) as u8);
        }
    }
    progress(100);
    listing
}

/// Formats a mnemonic into the fixed 7-character column plus operands.
fn line(mnemonic: &str, operands: String) -> String {
    if operands.is_empty() {
        mnemonic.to_string()
    } else {
        format!("{mnemonic:<7}{operands}")
    }
}

/// Renders every fixed-width instruction (everything but `movei`).
fn render(opcode: Opcode, reg1: u8, reg2: u8, addr: i32) -> String {
    // Quick fields of the add/sub quick forms display 0 as 32.
    let quick = if reg1 == 0 { 32 } else { i32::from(reg1) };

    match opcode {
        Opcode::Add => line("add", format!("r{reg1},r{reg2}")),
        Opcode::Addc => line("addc", format!("r{reg1},r{reg2}")),
        Opcode::Addq => line("addq", format!("#{quick},r{reg2}")),
        Opcode::Addqt => line("addqt", format!("#{quick},r{reg2}")),
        Opcode::Sub => line("sub", format!("r{reg1},r{reg2}")),
        Opcode::Subc => line("subc", format!("r{reg1},r{reg2}")),
        Opcode::Subq => line("subq", format!("#{quick},r{reg2}")),
        Opcode::Subqt => line("subqt", format!("#{quick},r{reg2}")),
        Opcode::Neg => line("neg", format!("r{reg2}")),
        Opcode::And => line("and", format!("r{reg1},r{reg2}")),
        Opcode::Or => line("or", format!("r{reg1},r{reg2}")),
        Opcode::Xor => line("xor", format!("r{reg1},r{reg2}")),
        Opcode::Not => line("not", format!("r{reg2}")),
        Opcode::Btst => line("btst", format!("#{reg1},r{reg2}")),
        Opcode::Bset => line("bset", format!("#{reg1},r{reg2}")),
        Opcode::Bclr => line("bclr", format!("#{reg1},r{reg2}")),
        Opcode::Mult => line("mult", format!("r{reg1},r{reg2}")),
        Opcode::Imult => line("imult", format!("r{reg1},r{reg2}")),
        Opcode::Div => line("div", format!("r{reg1},r{reg2}")),
        Opcode::Abs => line("abs", format!("r{reg2}")),
        Opcode::Sh => line("sh", format!("r{reg1},r{reg2}")),
        Opcode::Shlq => line("shlq", format!("#{},r{reg2}", 32 - i32::from(reg1))),
        Opcode::Shrq => line("shrq", format!("#{reg1},r{reg2}")),
        Opcode::Sha => line("sha", format!("r{reg1},r{reg2}")),
        Opcode::Sharq => line("sharq", format!("#{reg1},r{reg2}")),
        Opcode::Ror => line("ror", format!("r{reg1},r{reg2}")),
        Opcode::Rorq => line("rorq", format!("#{reg1},r{reg2}")),
        Opcode::Cmp => line("cmp", format!("r{reg1},r{reg2}")),
        Opcode::Cmpq => line("cmpq", format!("#{reg1},r{reg2}")),
        Opcode::Sat8 => line("sat8", format!("r{reg2}")),
        Opcode::Sat16 => line("sat16", format!("r{reg2}")),
        Opcode::Sat24 => line("sat24", format!("r{reg2}")),
        Opcode::Move => line("move", format!("r{reg1},r{reg2}")),
        Opcode::Moveq => line("moveq", format!("#{reg1},r{reg2}")),
        Opcode::Moveta => line("moveta", format!("r{reg1},r{reg2}")),
        Opcode::Movefa => line("movefa", format!("r{reg1},r{reg2}")),
        Opcode::MovePc => line("move", format!("PC,r{reg2}")),
        Opcode::Loadb => line("loadb", format!("(r{reg1}),r{reg2}")),
        Opcode::Loadw => line("loadw", format!("(r{reg1}),r{reg2}")),
        Opcode::Load => line("load", format!("(r{reg1}),r{reg2}")),
        Opcode::Loadp => line("loadp", format!("(r{reg1}),r{reg2}")),
        Opcode::LoadR14Ind => line("load", format!("(r14+{reg1}),r{reg2}")),
        Opcode::LoadR15Ind => line("load", format!("(r15+{reg1}),r{reg2}")),
        Opcode::LoadR14Reg => line("load", format!("(r14+r{reg1}),r{reg2}")),
        Opcode::LoadR15Reg => line("load", format!("(r15+r{reg1}),r{reg2}")),
        Opcode::Storeb => line("storeb", format!("r{reg2},(r{reg1})")),
        Opcode::Storew => line("storew", format!("r{reg2},(r{reg1})")),
        Opcode::Store => line("store", format!("r{reg2},(r{reg1})")),
        Opcode::Storep => line("storep", format!("r{reg2},(r{reg1})")),
        Opcode::StoreR14Ind => line("store", format!("r{reg2},(r14+{reg1})")),
        Opcode::StoreR15Ind => line("store", format!("r{reg2},(r15+{reg1})")),
        Opcode::StoreR14Reg => line("store", format!("r{reg2},(r14+r{reg1})")),
        Opcode::StoreR15Reg => line("store", format!("r{reg2},(r15+r{reg1})")),
        Opcode::Jr => {
            // Render the resolved absolute target of the word displacement.
            let target = if reg1 > 15 {
                addr - (31 - i32::from(reg1)) * 2
            } else {
                addr + i32::from(reg1) * 2
            };
            let cc = condition::mnemonic(reg2);
            if cc.is_empty() {
                line("jr", format!("${target:08X}"))
            } else {
                line("jr", format!("{cc},${target:08X}"))
            }
        }
        Opcode::Jump => {
            let cc = condition::mnemonic(reg2);
            if cc.is_empty() {
                line("jump", format!("(r{reg1})"))
            } else {
                line("jump", format!("{cc},(r{reg1})"))
            }
        }
        Opcode::PackUnpack => {
            if reg1 == 0 {
                line("pack", format!("r{reg2}"))
            } else {
                line("unpack", format!("r{reg2}"))
            }
        }
        Opcode::Movei | Opcode::Unknown(_) => line("unknown", String::new()),
    }
}
