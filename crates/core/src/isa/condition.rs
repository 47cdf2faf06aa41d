//! Condition codes for `jump` and `jr`.
//!
//! The 5-bit condition field selects an exact flag combination; there is no
//! "closest match" fallback. Codes absent from the table never match, and
//! the mnemonic table renders them as an explicit error token rather than
//! dropping them.

use crate::common::reg::Flags;

/// Evaluates a condition code against the current flags.
///
/// Fifteen codes are defined (0 is "always"); every other encoding never
/// matches, including `0x1F` which assemblers spell `NOT` (never).
pub fn matches(condition: u8, flags: &Flags) -> bool {
    let Flags { z, n, c } = *flags;
    match condition {
        0x00 => true,
        0x01 => !z,
        0x02 => z,
        0x04 => !c,
        0x05 => !c && !z,
        0x06 => !c && z,
        0x08 => c,
        0x09 => c && !z,
        0x0A => c && z,
        0x14 => !n,
        0x15 => !n && !z,
        0x16 => !n && z,
        0x18 => n,
        0x19 => n && !z,
        0x1A => n && z,
        _ => false,
    }
}

/// Mnemonic suffix for a condition code.
///
/// Code 0 (always) renders as the empty string; encodings outside the
/// 16-entry table render as `"ERR"`.
pub fn mnemonic(condition: u8) -> &'static str {
    match condition {
        0x00 => "",
        0x01 => "NE",
        0x02 => "EQ",
        0x04 => "CC",
        0x05 => "HI",
        0x06 => "NC Z",
        0x08 => "CS",
        0x09 => "C NZ",
        0x0A => "C Z",
        0x14 => "GE",
        0x15 => "GT",
        0x16 => "NN Z",
        0x18 => "LE",
        0x19 => "LT",
        0x1A => "N Z",
        0x1F => "NOT",
        _ => "ERR",
    }
}
