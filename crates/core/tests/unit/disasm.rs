//! Disassembler golden tests: mnemonic column, operand rendering, and the
//! progress observer.

use jagrisc_core::config::Config;
use jagrisc_core::isa::decode::Opcode;
use jagrisc_core::isa::disasm::disassemble_range;
use jagrisc_core::mem::AddressSpace;
use pretty_assertions::assert_eq;

use crate::common::{LOAD, assemble, movei, op};

fn listing_for(words: &[u16]) -> Vec<String> {
    let mut mem = AddressSpace::new(&Config::default());
    assert!(mem.copy_in(LOAD, &assemble(words)));
    let size = (words.len() * 2) as i32;
    disassemble_range(&mem, LOAD, size, &mut |_| {})
        .into_iter()
        .map(|entry| entry.text)
        .collect()
}

#[test]
fn alu_and_quick_forms() {
    let words = [
        op(Opcode::Add, 1, 2),
        op(Opcode::Addq, 0, 3),
        op(Opcode::Subq, 5, 4),
        op(Opcode::Shlq, 28, 6),
        op(Opcode::Cmpq, 0, 7),
        op(Opcode::Neg, 0, 8),
    ];
    assert_eq!(
        listing_for(&words),
        vec![
            "add    r1,r2",
            "addq   #32,r3",
            "subq   #5,r4",
            "shlq   #4,r6",
            "cmpq   #0,r7",
            "neg    r8",
        ]
    );
}

#[test]
fn movei_renders_the_immediate_low_word_first() {
    let words = movei(17, 0xDEAD_BEEFu32 as i32);
    assert_eq!(listing_for(&words), vec!["movei  #$DEADBEEF,r17"]);
}

#[test]
fn loads_and_stores() {
    let words = [
        op(Opcode::Load, 2, 3),
        op(Opcode::LoadR14Ind, 4, 5),
        op(Opcode::StoreR15Reg, 6, 7),
        op(Opcode::Storeb, 8, 9),
    ];
    assert_eq!(
        listing_for(&words),
        vec![
            "load   (r2),r3",
            "load   (r14+4),r5",
            "store  r7,(r15+r6)",
            "storeb r9,(r8)",
        ]
    );
}

#[test]
fn flow_control_resolves_targets() {
    // jr at LOAD+0 forward 3 words, jump always, jr backward to itself.
    let words = [
        op(Opcode::Jr, 3, 0x02),
        op(Opcode::Jump, 11, 0x00),
        op(Opcode::Jr, 31, 0x01),
        op(Opcode::MovePc, 0, 9),
    ];
    assert_eq!(
        listing_for(&words),
        vec![
            format!("jr     EQ,${:08X}", LOAD + 6),
            "jump   (r11)".to_string(),
            format!("jr     NE,${:08X}", LOAD + 4),
            "move   PC,r9".to_string(),
        ]
    );
}

#[test]
fn pack_and_unpack_share_an_opcode() {
    let words = [op(Opcode::PackUnpack, 0, 2), op(Opcode::PackUnpack, 1, 2)];
    assert_eq!(listing_for(&words), vec!["pack   r2", "unpack r2"]);
}

#[test]
fn undocumented_encodings_render_as_unknown() {
    let words = [op(Opcode::Unknown(19), 4, 5)];
    assert_eq!(listing_for(&words), vec!["unknown"]);
}

#[test]
fn entries_carry_their_address() {
    let mut mem = AddressSpace::new(&Config::default());
    let mut words = movei(1, 0x1234).to_vec();
    words.push(op(Opcode::Add, 1, 2));
    assert!(mem.copy_in(LOAD, &assemble(&words)));
    let listing = disassemble_range(&mem, LOAD, 8, &mut |_| {});

    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].addr, LOAD);
    assert_eq!(listing[1].addr, LOAD + 6);
    assert_eq!(listing[0].to_string(), format!("${LOAD:08X}: movei  #$00001234,r1"));
}

#[test]
fn progress_is_monotonic_and_finishes_at_100() {
    let mut mem = AddressSpace::new(&Config::default());
    let words: Vec<u16> = (0..64).map(|i| op(Opcode::Addq, 1, i % 32)).collect();
    assert!(mem.copy_in(LOAD, &assemble(&words)));

    let mut seen = Vec::new();
    disassemble_range(&mem, LOAD, 128, &mut |pct| seen.push(pct));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&100));
}

#[test]
fn trailing_odd_byte_is_ignored() {
    let mut mem = AddressSpace::new(&Config::default());
    assert!(mem.copy_in(LOAD, &assemble(&[op(Opcode::Not, 0, 1)])));
    let listing = disassemble_range(&mem, LOAD, 3, &mut |_| {});
    assert_eq!(listing.len(), 1);
}
