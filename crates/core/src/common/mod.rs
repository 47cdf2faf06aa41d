//! Common types shared across the simulator.
//!
//! This module provides the building blocks used by every other component:
//! 1. **Constants:** The coprocessor memory map and instruction field layout.
//! 2. **Events:** The advisory/fault event channel and run-stop reasons.
//! 3. **Registers:** The dual register banks, flag state, and delay slot.

/// Memory map and instruction encoding constants.
pub mod constants;
/// Event channel types: advisories, faults, and run-stop reasons.
pub mod events;
/// Register banks, arithmetic flags, and the delayed-branch slot.
pub mod reg;

pub use constants::MEMORY_SIZE;
pub use events::{AccessKind, ControlError, CoreEvent, LoadError, StopReason};
pub use reg::{DelaySlot, Flags, RegisterBanks};
