//! The debugger session.
//!
//! [`Debugger`] owns one execution engine and layers the interactive
//! surface on top of it:
//! 1. **Image lifecycle:** load (headered or plain), reset, mode switch.
//! 2. **Execution control:** single-step, step-over, and a blocking run
//!    loop with a cooperative [`StopHandle`] for cancellation from another
//!    thread.
//! 3. **Inspection:** disassembly listing, register/flag formatting, the
//!    pending branch target, and the drainable event queue.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::common::constants::{CTRL_GO_BIT, G_HIDATA, G_REMAIN};
use crate::common::events::{ControlError, CoreEvent, LoadError, StopReason};
use crate::config::{Config, CoreMode};
use crate::exec::Engine;
use crate::isa::disasm::{ListingEntry, disassemble_range};
use crate::sim::loader::{self, LoadedImage};

/// Cloneable handle that requests a running session to stop at the next
/// instruction boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Asks the run loop to stop.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// An interactive debugging session over one coprocessor instance.
#[derive(Debug)]
pub struct Debugger {
    engine: Engine,
    image: Option<LoadedImage>,
    breakpoints: BTreeSet<i32>,
    primary: Option<i32>,
    listing: Vec<ListingEntry>,
    progress: u8,
    stop: StopHandle,
    running: bool,
}

impl Debugger {
    /// Creates an empty session; no image is loaded yet.
    pub fn new(config: &Config) -> Self {
        Self {
            engine: Engine::new(config),
            image: None,
            breakpoints: BTreeSet::new(),
            primary: None,
            listing: Vec::new(),
            progress: 0,
            stop: StopHandle::default(),
            running: false,
        }
    }

    /// The currently loaded image, if any.
    pub fn image(&self) -> Option<LoadedImage> {
        self.image
    }

    /// The current operating mode.
    pub fn mode(&self) -> CoreMode {
        self.engine.mode()
    }

    /// Switches between GPU and DSP register maps.
    pub fn set_mode(&mut self, mode: CoreMode) -> Result<(), ControlError> {
        if self.running {
            return Err(ControlError::Busy);
        }
        self.engine.set_mode(mode);
        Ok(())
    }

    /// Loads an image file, resets the session, and rebuilds the listing.
    pub fn load_bin(&mut self, path: &Path, default_address: i32) -> Result<LoadedImage, LoadError> {
        if self.running {
            return Err(LoadError::Busy);
        }
        let image = loader::load_file(&mut self.engine.mem, path, default_address)?;
        self.install(image);
        Ok(image)
    }

    /// Loads an in-memory image; same lifecycle as [`Self::load_bin`].
    pub fn load_bytes(&mut self, bytes: &[u8], default_address: i32) -> Result<LoadedImage, LoadError> {
        if self.running {
            return Err(LoadError::Busy);
        }
        let image = loader::load_bytes(&mut self.engine.mem, bytes, default_address)?;
        self.install(image);
        Ok(image)
    }

    fn install(&mut self, image: LoadedImage) {
        self.image = Some(image);
        self.engine.set_base_pc(image.load_address);
        self.engine.reset();
        self.progress = 0;
        self.listing = disassemble_range(
            &self.engine.mem,
            image.load_address,
            image.program_size,
            &mut |pct| self.progress = pct,
        );
    }

    /// Restores the post-load state: zeroed banks and flags, program
    /// counter back at the load address. Loaded memory is untouched.
    pub fn reset(&mut self) -> Result<(), ControlError> {
        if self.running {
            return Err(ControlError::Busy);
        }
        self.engine.reset();
        Ok(())
    }

    /// Toggles the breakpoint at `addr`. A newly inserted address becomes
    /// the primary one; removing the primary clears the indicator without
    /// touching the rest of the set.
    pub fn set_breakpoint(&mut self, addr: i32) {
        if self.breakpoints.insert(addr) {
            self.primary = Some(addr);
        } else {
            self.breakpoints.remove(&addr);
            if self.primary == Some(addr) {
                self.primary = None;
            }
        }
    }

    /// The primary breakpoint address, if any.
    pub fn breakpoint(&self) -> Option<i32> {
        self.primary
    }

    /// Whether a breakpoint is set at `addr`.
    pub fn has_breakpoint(&self, addr: i32) -> bool {
        self.breakpoints.contains(&addr)
    }

    /// Executes exactly one instruction.
    ///
    /// An unreadable fetch address is rejected with
    /// [`ControlError::FetchFault`] and leaves the program counter alone.
    pub fn step(&mut self) -> Result<(), ControlError> {
        self.advance(true)
    }

    /// Steps over one instruction without executing it. The delay slot
    /// still commits, and `movei` skips its immediate.
    pub fn skip(&mut self) -> Result<(), ControlError> {
        self.advance(false)
    }

    fn advance(&mut self, execute: bool) -> Result<(), ControlError> {
        if self.image.is_none() {
            return Err(ControlError::NoImage);
        }
        if self.running {
            return Err(ControlError::Busy);
        }
        let word = self.engine.mem.fetch_word(self.engine.pc);
        if word == -1 {
            return Err(ControlError::FetchFault(self.engine.pc));
        }
        self.engine.step(word as u16, execute);
        Ok(())
    }

    /// A handle other threads can use to interrupt [`Self::run`].
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Requests the active run to stop at the next instruction boundary.
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    /// Runs until a breakpoint, the end of the program, a stop request, a
    /// fetch fault, or the program halting itself.
    ///
    /// Entering the loop sets the go bit of the mode's control register;
    /// the breakpoint is checked before the instruction at it executes.
    pub fn run(&mut self) -> Result<StopReason, ControlError> {
        let Some(image) = self.image else {
            return Err(ControlError::NoImage);
        };
        if self.running {
            return Err(ControlError::Busy);
        }
        let end = image.load_address.wrapping_add(image.program_size);

        // Discard any halt latched by a manual step before this run.
        self.engine.take_halt();
        self.stop.clear();
        self.running = true;
        let ctrl_addr = self.engine.mode().ctrl_addr();
        let ctrl = self.engine.mem.peek_long(ctrl_addr).unwrap_or(0);
        self.engine.mem.write_long(ctrl_addr, ctrl | CTRL_GO_BIT);
        self.engine.set_run_active(true);

        let reason = loop {
            if self.stop.is_requested() {
                break StopReason::Requested;
            }
            if self.breakpoints.contains(&self.engine.pc) {
                break StopReason::Breakpoint(self.engine.pc);
            }
            if self.engine.pc >= end {
                break StopReason::ProgramEnd(self.engine.pc);
            }
            let word = self.engine.mem.fetch_word(self.engine.pc);
            if word == -1 {
                break StopReason::FetchFault(self.engine.pc);
            }
            self.engine.step(word as u16, true);
            if let Some(halt) = self.engine.take_halt() {
                break halt;
            }
        };

        self.engine.set_run_active(false);
        self.running = false;
        info!(%reason, pc = format_args!("${:08X}", self.engine.pc), "run stopped");
        Ok(reason)
    }

    /// The current fetch address.
    pub fn pc(&self) -> i32 {
        self.engine.pc
    }

    /// The pending delayed-branch target, if a branch was just taken.
    pub fn jump_target(&self) -> Option<i32> {
        self.engine.delay.pending.then_some(self.engine.delay.target)
    }

    /// Disassembly progress from the last load, 0 to 100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// The disassembly listing built at load time.
    pub fn listing(&self) -> &[ListingEntry] {
        &self.listing
    }

    /// Reads a register from a specific bank.
    pub fn register(&self, bank: usize, index: usize) -> Result<i32, ControlError> {
        Self::check_slot(bank, index)?;
        Ok(self.engine.regs.bank(bank)[index])
    }

    /// Writes a register in a specific bank.
    pub fn edit_register(&mut self, bank: usize, index: usize, value: i32) -> Result<(), ControlError> {
        if self.running {
            return Err(ControlError::Busy);
        }
        Self::check_slot(bank, index)?;
        self.engine.regs.set_in_bank(bank, index, value);
        Ok(())
    }

    fn check_slot(bank: usize, index: usize) -> Result<(), ControlError> {
        if bank > 1 {
            return Err(ControlError::BadBank(bank));
        }
        if index > 31 {
            return Err(ControlError::BadRegister(index));
        }
        Ok(())
    }

    /// The bank index the program currently executes against.
    pub fn current_bank(&self) -> usize {
        self.engine.regs.current
    }

    /// Formats a full bank as `rN:  $XXXXXXXX` lines.
    pub fn bank_lines(&self, bank: usize) -> Result<Vec<String>, ControlError> {
        Self::check_slot(bank, 0)?;
        let values = self.engine.regs.bank(bank);
        Ok((0..32)
            .map(|i| {
                let pad = if i < 10 { "  " } else { " " };
                format!("r{i}:{pad}${:08X}", values[i])
            })
            .collect())
    }

    /// Formats the flags as `Flags: Z:0 N:0 C:0`.
    pub fn flags_line(&self) -> String {
        let f = &self.engine.flags;
        format!(
            "Flags: Z:{} N:{} C:{}",
            u8::from(f.z),
            u8::from(f.n),
            u8::from(f.c)
        )
    }

    /// The phrase-transfer high word register.
    pub fn hidata(&self) -> i32 {
        self.engine.mem.peek_long(G_HIDATA).unwrap_or(0)
    }

    /// The divide-remainder register.
    pub fn remainder(&self) -> i32 {
        self.engine.mem.peek_long(G_REMAIN).unwrap_or(0)
    }

    /// Direct read access to memory without event reporting.
    pub fn peek_long(&self, addr: i32) -> Option<i32> {
        self.engine.mem.peek_long(addr)
    }

    /// Enables or disables the out-of-window access advisories.
    pub fn set_memory_warnings(&mut self, enabled: bool) {
        self.engine.mem.set_warnings(enabled);
    }

    /// Drains accumulated advisory and fault events.
    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        self.engine.mem.take_events()
    }
}
