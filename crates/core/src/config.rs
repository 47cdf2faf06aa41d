//! Configuration for the simulator.
//!
//! A [`Config`] parameterizes one simulator instance. It provides:
//! 1. **Operating mode:** GPU-like (Tom) or DSP-like (Jerry), which selects
//!    distinct memory-mapped register offsets and internal RAM windows.
//! 2. **Warning policy:** Whether alignment advisories are reported (the
//!    original debugger's "MemWarn" checkbox).
//!
//! Configuration is supplied as JSON by a host, or use `Config::default()`.

use std::fmt;

use serde::Deserialize;

use crate::common::constants::{
    D_CTRL, D_FLAGS, D_RAM, D_RAM_SIZE, G_CTRL, G_FLAGS, G_RAM, G_RAM_SIZE,
};

/// Which coprocessor personality the simulator presents.
///
/// The mode selects the flags/control register offsets and the internal RAM
/// window. Only GPU mode has functional high-data and remainder registers;
/// the DSP leaves those side effects pointed at the GPU block, matching the
/// modeled hardware's observed behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoreMode {
    /// GPU-like (Tom) mode: 4 KiB internal RAM at `G_RAM`.
    #[default]
    Gpu,
    /// DSP-like (Jerry) mode: 8 KiB internal RAM at `D_RAM`.
    Dsp,
}

impl CoreMode {
    /// Address of the mode's flags register.
    pub fn flags_addr(self) -> i32 {
        match self {
            CoreMode::Gpu => G_FLAGS,
            CoreMode::Dsp => D_FLAGS,
        }
    }

    /// Address of the mode's control register.
    pub fn ctrl_addr(self) -> i32 {
        match self {
            CoreMode::Gpu => G_CTRL,
            CoreMode::Dsp => D_CTRL,
        }
    }

    /// Half-open address range of the mode's internal RAM window.
    pub fn ram_window(self) -> (i32, i32) {
        match self {
            CoreMode::Gpu => (G_RAM, G_RAM + G_RAM_SIZE),
            CoreMode::Dsp => (D_RAM, D_RAM + D_RAM_SIZE),
        }
    }
}

impl fmt::Display for CoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreMode::Gpu => f.write_str("GPU"),
            CoreMode::Dsp => f.write_str("DSP"),
        }
    }
}

/// Top-level simulator configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Operating mode at construction; switchable later through the
    /// debug controller.
    pub mode: CoreMode,
    /// Report alignment and internal-RAM advisories. Out-of-bounds faults
    /// are always reported regardless of this setting.
    pub memory_warnings: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: CoreMode::Gpu,
            memory_warnings: true,
        }
    }
}
