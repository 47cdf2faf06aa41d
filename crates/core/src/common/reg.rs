//! Register banks, arithmetic flags, and the delayed-branch slot.
//!
//! The coprocessor has two independent banks of 32 signed 32-bit registers.
//! Exactly one bank is current at any time; the selection is not freely
//! settable but re-derived from bit 14 of the mode's flags register after
//! every memory write (see the execution engine).

/// Dual 32-register file with a current-bank selector.
#[derive(Clone, Debug)]
pub struct RegisterBanks {
    banks: [[i32; 32]; 2],
    /// Index of the active bank (0 or 1). Recomputed from the flags
    /// register after every memory write, never set directly by programs.
    pub current: usize,
}

impl RegisterBanks {
    /// Creates both banks zeroed with bank 0 current.
    pub fn new() -> Self {
        Self {
            banks: [[0; 32]; 2],
            current: 0,
        }
    }

    /// Reads a register from the current bank.
    #[inline]
    pub fn get(&self, idx: u8) -> i32 {
        self.banks[self.current][idx as usize]
    }

    /// Writes a register in the current bank.
    #[inline]
    pub fn set(&mut self, idx: u8, val: i32) {
        self.banks[self.current][idx as usize] = val;
    }

    /// Reads a register from the other bank (`movefa`).
    #[inline]
    pub fn get_alt(&self, idx: u8) -> i32 {
        self.banks[self.current ^ 1][idx as usize]
    }

    /// Writes a register in the other bank (`moveta`).
    #[inline]
    pub fn set_alt(&mut self, idx: u8, val: i32) {
        self.banks[self.current ^ 1][idx as usize] = val;
    }

    /// Returns a whole bank for display.
    pub fn bank(&self, bank: usize) -> &[i32; 32] {
        &self.banks[bank]
    }

    /// Writes a register in an explicit bank (debugger register edit).
    pub fn set_in_bank(&mut self, bank: usize, idx: usize, val: i32) {
        self.banks[bank][idx] = val;
    }

    /// Zeroes both banks and selects bank 0.
    pub fn clear(&mut self) {
        self.banks = [[0; 32]; 2];
        self.current = 0;
    }
}

impl Default for RegisterBanks {
    fn default() -> Self {
        Self::new()
    }
}

/// The three arithmetic flags: Zero, Negative, Carry.
///
/// Flags are recomputed deterministically by arithmetic, logic, and shift
/// instructions and are never user-settable directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    /// Result was zero.
    pub z: bool,
    /// Result was negative (sign bit set).
    pub n: bool,
    /// Unsigned carry/borrow out of the last add/sub/shift.
    pub c: bool,
}

impl Flags {
    /// Sets Z and N from a signed result.
    #[inline]
    pub fn update_zn(&mut self, result: i32) {
        self.n = result < 0;
        self.z = result == 0;
    }

    /// Sets C for an addition `a + b` from the unsigned bit patterns.
    #[inline]
    pub fn carry_add(&mut self, a: i32, b: i32) {
        self.c = (b as u32) > !(a as u32);
    }

    /// Sets C for a subtraction `b - a` from the unsigned bit patterns.
    #[inline]
    pub fn carry_sub(&mut self, a: i32, b: i32) {
        self.c = (a as u32) > (b as u32);
    }

    /// Clears all three flags.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The single delayed-branch slot.
///
/// A taken jump/branch records its target here; the following instruction
/// still executes, after which the target is committed to the program
/// counter. A second taken branch while one is pending overwrites the first
/// (the hardware has exactly one slot; last write wins).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DelaySlot {
    /// Address committed to the program counter after the next instruction.
    pub target: i32,
    /// Whether a commit is pending.
    pub pending: bool,
}

impl DelaySlot {
    /// Schedules a branch target, replacing any pending one.
    #[inline]
    pub fn schedule(&mut self, target: i32) {
        self.target = target;
        self.pending = true;
    }

    /// Clears any pending target.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
