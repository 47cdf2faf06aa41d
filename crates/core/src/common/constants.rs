//! Coprocessor memory map and instruction encoding constants.
//!
//! The address layout mirrors the Jaguar's Tom (GPU) and Jerry (DSP)
//! register blocks. Both coprocessors share one flat, big-endian address
//! space; each has a flags word, a control word, and an internal RAM
//! window that only tolerates 32-bit access.

/// GPU flags/control word; bit 14 selects the active register bank.
pub const G_FLAGS: i32 = 0x00F0_2100;

/// GPU control register; bit 0 is the "go" bit.
pub const G_CTRL: i32 = 0x00F0_2114;

/// GPU high-data register, coupled to `loadp`/`storep`.
pub const G_HIDATA: i32 = 0x00F0_2118;

/// GPU division remainder register, written as a side effect of `div`.
pub const G_REMAIN: i32 = 0x00F0_211C;

/// Base address of the GPU internal RAM window.
pub const G_RAM: i32 = 0x00F0_3000;

/// Size of the GPU internal RAM window (4 KiB).
pub const G_RAM_SIZE: i32 = 4 * 1024;

/// DSP flags/control word; bit 14 selects the active register bank.
pub const D_FLAGS: i32 = 0x00F1_A100;

/// DSP control register; bit 0 is the "go" bit.
pub const D_CTRL: i32 = 0x00F1_A114;

/// Base address of the DSP internal RAM window.
pub const D_RAM: i32 = 0x00F1_B000;

/// Size of the DSP internal RAM window (8 KiB).
pub const D_RAM_SIZE: i32 = 8 * 1024;

/// Size of the simulated address space: the upper bound of the combined
/// coprocessor/RAM map (end of the DSP internal RAM).
pub const MEMORY_SIZE: usize = (D_RAM + D_RAM_SIZE) as usize;

/// Bit of the flags word that selects the active register bank.
pub const BANK_SELECT_BIT: i32 = 14;

/// Bit of the control word that keeps the coprocessor running.
pub const CTRL_GO_BIT: i32 = 0x1;

/// Size in bytes of a normal instruction word.
pub const INSTRUCTION_SIZE: i32 = 2;

/// Size in bytes of the `movei` form (opcode word + 32-bit immediate).
pub const MOVEI_SIZE: i32 = 6;

/// Shift extracting the 6-bit opcode from an instruction word.
pub const OPCODE_SHIFT: u16 = 10;

/// Shift extracting the first operand field from an instruction word.
pub const REG1_SHIFT: u16 = 5;

/// Mask for the 5-bit operand fields.
pub const REG_MASK: u16 = 0x1F;
