//! Tom/Jerry RISC coprocessor simulator library.
//!
//! This crate implements an instruction-set simulator and debugger core for the
//! Atari Jaguar's two RISC coprocessors (the "Tom" GPU and the "Jerry" DSP):
//! 1. **Memory:** A flat big-endian address space covering the coprocessor
//!    memory map, with bounds checks, alignment normalization, and the
//!    memory-mapped flags/control/high-data/remainder registers.
//! 2. **ISA:** Decoding, condition codes, and disassembly for the 16-bit
//!    (plus 6-byte `movei`) instruction encoding.
//! 3. **Execution:** Two switchable 32-register banks, Z/N/C flags, the
//!    single delayed-branch slot, and the full opcode semantics.
//! 4. **Debugging:** Load/reset/step/skip/run control, breakpoints, and a
//!    drainable event channel for advisories and faults.

/// Common types and constants (memory map, register banks, flags, events).
pub mod common;
/// Simulator configuration (operating mode, memory-warning policy).
pub mod config;
/// Execution engine (register banks, flags, delay slot, opcode dispatch).
pub mod exec;
/// Instruction set (decode, condition codes, disassembler).
pub mod isa;
/// Address space: the flat byte buffer and its memory-mapped registers.
pub mod mem;
/// Binary image loader and the debug controller.
pub mod sim;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The debug controller; the only type a front end needs to drive.
pub use crate::sim::Debugger;
