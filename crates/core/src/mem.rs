//! The simulated address space.
//!
//! One flat, big-endian byte buffer covers the whole coprocessor memory map
//! (see [`crate::common::constants`]). This module provides:
//! 1. **Accessors:** Byte/word/long reads and writes with explicit bounds
//!    checks; no raw pointer arithmetic anywhere.
//! 2. **Alignment normalization:** Word/long addresses are masked down to
//!    natural alignment; a mismatch is an advisory, not an error.
//! 3. **Classification:** Byte/word access inside the mode's internal RAM
//!    window is flagged (the hardware only services it with 32-bit
//!    transfers) but still proceeds.
//! 4. **Event queue:** Advisories and faults accumulate here and are
//!    drained by the host; reads that fault return the `-1` sentinel.

use tracing::warn;

use crate::common::constants::MEMORY_SIZE;
use crate::common::events::{AccessKind, CoreEvent};
use crate::config::{Config, CoreMode};

/// The flat byte buffer plus its reporting state.
///
/// Addresses are signed 32-bit values, as seen by the modeled hardware;
/// negative addresses are out of bounds.
#[derive(Debug)]
pub struct AddressSpace {
    bytes: Vec<u8>,
    events: Vec<CoreEvent>,
    warnings: bool,
    mode: CoreMode,
}

impl AddressSpace {
    /// Allocates a zeroed address space of [`MEMORY_SIZE`] bytes.
    pub fn new(config: &Config) -> Self {
        Self {
            bytes: vec![0; MEMORY_SIZE],
            events: Vec::new(),
            warnings: config.memory_warnings,
            mode: config.mode,
        }
    }

    /// Switches the internal-RAM window classification to the given mode.
    pub fn set_mode(&mut self, mode: CoreMode) {
        self.mode = mode;
    }

    /// Enables or disables advisory reporting.
    pub fn set_warnings(&mut self, enabled: bool) {
        self.warnings = enabled;
    }

    /// Drains all accumulated events.
    pub fn take_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: CoreEvent) {
        warn!("{event}");
        self.events.push(event);
    }

    fn advisory(&mut self, event: CoreEvent) {
        if self.warnings {
            self.push_event(event);
        }
    }

    fn in_internal_ram(&self, addr: i32) -> bool {
        let (start, end) = self.mode.ram_window();
        addr >= start && addr < end
    }

    fn check_align(&mut self, kind: AccessKind, addr: i32, mask: i32) -> i32 {
        let aligned = addr & mask;
        if aligned != addr {
            self.advisory(CoreEvent::MisalignedAccess {
                kind,
                addr,
                aligned,
            });
        }
        aligned
    }

    /// Bounds check: the access must fit entirely inside the buffer.
    fn in_bounds(addr: i32, width: i32) -> bool {
        addr >= 0 && (addr as usize) + (width as usize) <= MEMORY_SIZE
    }

    /// Reads a 32-bit big-endian value. Misalignment is normalized (with an
    /// advisory); an out-of-bounds access reports a fault and returns `-1`.
    pub fn read_long(&mut self, addr: i32) -> i32 {
        let addr = self.check_align(AccessKind::ReadLong, addr, !3);
        if Self::in_bounds(addr, 4) {
            let b = &self.bytes[addr as usize..addr as usize + 4];
            i32::from_be_bytes([b[0], b[1], b[2], b[3]])
        } else {
            self.push_event(CoreEvent::OutOfBounds {
                kind: AccessKind::ReadLong,
                addr,
            });
            -1
        }
    }

    /// Reads a 16-bit big-endian value as a non-negative `i32`, or `-1` on
    /// an out-of-bounds access. Flags byte/word-granularity access inside
    /// the internal RAM window.
    pub fn read_word(&mut self, addr: i32) -> i32 {
        self.read_word_inner(addr, false)
    }

    /// Privileged 16-bit read used for instruction fetch and the `movei`
    /// extension words: identical to [`Self::read_word`] but exempt from the
    /// internal-RAM advisory.
    pub fn fetch_word(&mut self, addr: i32) -> i32 {
        self.read_word_inner(addr, true)
    }

    fn read_word_inner(&mut self, addr: i32, privileged: bool) -> i32 {
        let orig = addr;
        let addr = self.check_align(AccessKind::ReadWord, addr, !1);
        if !privileged && self.in_internal_ram(orig) {
            self.advisory(CoreEvent::InternalRamAccess {
                kind: AccessKind::ReadWord,
                addr: orig,
            });
        }
        if Self::in_bounds(addr, 2) {
            let b = &self.bytes[addr as usize..addr as usize + 2];
            i32::from(u16::from_be_bytes([b[0], b[1]]))
        } else {
            self.push_event(CoreEvent::OutOfBounds {
                kind: AccessKind::ReadWord,
                addr,
            });
            -1
        }
    }

    /// Reads one byte as a non-negative `i32`, or `-1` on an out-of-bounds
    /// access. Flags byte-granularity access inside the internal RAM window.
    pub fn read_byte(&mut self, addr: i32) -> i32 {
        if self.in_internal_ram(addr) {
            self.advisory(CoreEvent::InternalRamAccess {
                kind: AccessKind::ReadByte,
                addr,
            });
        }
        if Self::in_bounds(addr, 1) {
            i32::from(self.bytes[addr as usize])
        } else {
            self.push_event(CoreEvent::OutOfBounds {
                kind: AccessKind::ReadByte,
                addr,
            });
            -1
        }
    }

    /// Writes a 32-bit big-endian value. Misalignment is normalized;
    /// an out-of-bounds write reports a fault and mutates nothing.
    pub fn write_long(&mut self, addr: i32, data: i32) {
        let addr = self.check_align(AccessKind::WriteLong, addr, !3);
        if Self::in_bounds(addr, 4) {
            self.bytes[addr as usize..addr as usize + 4].copy_from_slice(&data.to_be_bytes());
        } else {
            self.push_event(CoreEvent::OutOfBounds {
                kind: AccessKind::WriteLong,
                addr,
            });
        }
    }

    /// Writes the low 16 bits of `data` big-endian. Flags byte/word access
    /// inside the internal RAM window; faults on out-of-bounds.
    pub fn write_word(&mut self, addr: i32, data: i32) {
        let orig = addr;
        let addr = self.check_align(AccessKind::WriteWord, addr, !1);
        if self.in_internal_ram(orig) {
            self.advisory(CoreEvent::InternalRamAccess {
                kind: AccessKind::WriteWord,
                addr: orig,
            });
        }
        if Self::in_bounds(addr, 2) {
            self.bytes[addr as usize..addr as usize + 2]
                .copy_from_slice(&(data as u16).to_be_bytes());
        } else {
            self.push_event(CoreEvent::OutOfBounds {
                kind: AccessKind::WriteWord,
                addr,
            });
        }
    }

    /// Writes the low 8 bits of `data`. Flags byte access inside the
    /// internal RAM window; faults on out-of-bounds.
    pub fn write_byte(&mut self, addr: i32, data: i32) {
        if self.in_internal_ram(addr) {
            self.advisory(CoreEvent::InternalRamAccess {
                kind: AccessKind::WriteByte,
                addr,
            });
        }
        if Self::in_bounds(addr, 1) {
            self.bytes[addr as usize] = data as u8;
        } else {
            self.push_event(CoreEvent::OutOfBounds {
                kind: AccessKind::WriteByte,
                addr,
            });
        }
    }

    /// Non-reporting 32-bit read for display accessors and internal
    /// bookkeeping. `None` if the range is out of bounds.
    pub fn peek_long(&self, addr: i32) -> Option<i32> {
        let addr = addr & !3;
        if Self::in_bounds(addr, 4) {
            let b = &self.bytes[addr as usize..addr as usize + 4];
            Some(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        } else {
            None
        }
    }

    /// Borrows `len` raw bytes starting at `addr`, for the disassembler and
    /// loader. `None` if the range is out of bounds.
    pub fn slice(&self, addr: i32, len: usize) -> Option<&[u8]> {
        if addr >= 0 && (addr as usize) + len <= MEMORY_SIZE {
            Some(&self.bytes[addr as usize..addr as usize + len])
        } else {
            None
        }
    }

    /// Copies a binary blob into the buffer. Returns `false` (mutating
    /// nothing) if the blob does not fit.
    pub fn copy_in(&mut self, addr: i32, data: &[u8]) -> bool {
        if addr >= 0 && (addr as usize) + data.len() <= MEMORY_SIZE {
            self.bytes[addr as usize..addr as usize + data.len()].copy_from_slice(data);
            true
        } else {
            false
        }
    }
}
