//! Event channel and error definitions.
//!
//! The simulator never aborts the process: everything the modeled hardware
//! would merely complain about is reported on a side channel and execution
//! continues. This module defines:
//! 1. **Events:** Advisories and recoverable faults, drained by the host.
//! 2. **Stop reasons:** Why a continuous run returned to its caller.
//! 3. **Errors:** Input-validation failures for the loader and controller.

use std::fmt;

use thiserror::Error;

use crate::config::CoreMode;

/// The kind of memory access that produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// 8-bit read.
    ReadByte,
    /// 16-bit read.
    ReadWord,
    /// 32-bit read.
    ReadLong,
    /// 8-bit write.
    WriteByte,
    /// 16-bit write.
    WriteWord,
    /// 32-bit write.
    WriteLong,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessKind::ReadByte => "ReadByte",
            AccessKind::ReadWord => "ReadWord",
            AccessKind::ReadLong => "ReadLong",
            AccessKind::WriteByte => "WriteByte",
            AccessKind::WriteWord => "WriteWord",
            AccessKind::WriteLong => "WriteLong",
        };
        f.write_str(name)
    }
}

/// An advisory or recoverable fault reported by the simulator.
///
/// Events accumulate on an internal queue and are drained with
/// [`crate::sim::Debugger::drain_events`]. None of them stop the process;
/// `PcOutOfBounds` additionally triggers an automatic full reset because the
/// session cannot continue from the faulting state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreEvent {
    /// A word/long access was not naturally aligned; the access proceeded at
    /// the masked-down address.
    MisalignedAccess {
        /// The access that was misaligned.
        kind: AccessKind,
        /// The address the program asked for.
        addr: i32,
        /// The aligned address actually used.
        aligned: i32,
    },

    /// An access fell outside the allocated address space. Reads returned the
    /// `-1` sentinel; writes were dropped.
    OutOfBounds {
        /// The access that went out of bounds.
        kind: AccessKind,
        /// The (aligned) faulting address.
        addr: i32,
    },

    /// A byte or word access landed inside the mode's internal RAM window,
    /// which the hardware only services with 32-bit transfers. The access
    /// still proceeded.
    InternalRamAccess {
        /// The offending access.
        kind: AccessKind,
        /// The target address.
        addr: i32,
    },

    /// The program cleared its own control-register go bit while a
    /// continuous run was active.
    SelfStop {
        /// Which coprocessor mode stopped itself.
        mode: CoreMode,
    },

    /// The program counter left the address space after a delay-slot commit.
    /// The engine performed a full reset.
    PcOutOfBounds {
        /// The faulting program counter value.
        pc: i32,
    },
}

impl fmt::Display for CoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreEvent::MisalignedAccess {
                kind,
                addr,
                aligned,
            } => write!(
                f,
                "{kind} not on an aligned address: ${addr:08X} (should be ${aligned:08X})"
            ),
            CoreEvent::OutOfBounds { kind, addr } => {
                write!(f, "{kind} outside allocated buffer: ${addr:08X}")
            }
            CoreEvent::InternalRamAccess { kind, addr } => {
                write!(f, "{kind} not allowed in internal RAM: ${addr:08X}")
            }
            CoreEvent::SelfStop { mode } => write!(f, "{mode} self-stopped"),
            CoreEvent::PcOutOfBounds { pc } => {
                write!(f, "PC outside allocated buffer: ${pc:08X} (resetting)")
            }
        }
    }
}

/// Why a continuous run returned control to its caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// An external stop was requested through a [`crate::sim::StopHandle`].
    Requested,
    /// The program counter reached a breakpoint; the instruction at that
    /// address was not executed.
    Breakpoint(i32),
    /// The program counter passed the end of the loaded image.
    ProgramEnd(i32),
    /// The program cleared its own control-register go bit.
    SelfStop,
    /// The instruction fetch itself faulted (out-of-bounds sentinel).
    FetchFault(i32),
    /// The program counter left the address space after a delay-slot commit;
    /// the engine was reset.
    PcFault(i32),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => write!(f, "stop requested"),
            StopReason::Breakpoint(addr) => write!(f, "breakpoint at ${addr:08X}"),
            StopReason::ProgramEnd(pc) => write!(f, "reached program end at ${pc:08X}"),
            StopReason::SelfStop => write!(f, "self-stopped"),
            StopReason::FetchFault(pc) => write!(f, "instruction fetch fault at ${pc:08X}"),
            StopReason::PcFault(pc) => write!(f, "PC fault at ${pc:08X}, engine reset"),
        }
    }
}

/// Errors from loading a binary image. On error the prior loaded state is
/// left unchanged.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image file could not be read.
    #[error("error while loading file: {0}")]
    Io(#[from] std::io::Error),

    /// The load address is not inside the address space.
    #[error("load address ${0:08X} outside the address space")]
    BadAddress(i32),

    /// The image does not fit between the load address and the end of the
    /// address space.
    #[error("file too large: {size} bytes at ${addr:08X}")]
    TooLarge {
        /// Resolved load address.
        addr: i32,
        /// Program body size in bytes.
        size: usize,
    },

    /// A load was attempted while a run is active.
    #[error("load rejected while a run is active")]
    Busy,
}

/// Errors from debug-controller operations. The requested mutation is
/// rejected; prior state is unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    /// No image has been loaded yet.
    #[error("no image loaded")]
    NoImage,

    /// The operation was attempted while a run is active.
    #[error("rejected while a run is active")]
    Busy,

    /// The register bank is not 0 or 1.
    #[error("register bank {0} does not exist")]
    BadBank(usize),

    /// The register index is not in 0..=31.
    #[error("register index {0} out of range")]
    BadRegister(usize),

    /// The instruction fetch at the current program counter faulted.
    #[error("instruction fetch fault at ${0:08X}")]
    FetchFault(i32),
}
