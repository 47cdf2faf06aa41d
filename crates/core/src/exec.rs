//! The execution engine.
//!
//! Interprets decoded instructions against the register banks, flags,
//! delayed-branch slot, and address space. It performs:
//! 1. **Dispatch:** Exhaustive opcode semantics over the closed [`Opcode`]
//!    set; unrecognized encodings are an explicit no-op, never undefined.
//! 2. **Delay slot:** A taken branch arms the slot; the target is committed
//!    after the next non-branch instruction, then the program counter is
//!    re-validated (an out-of-bounds commit forces a full reset).
//! 3. **Write side effects:** Every memory write re-derives the current
//!    register bank from bit 14 of the mode's flags register and detects
//!    the program clearing its own control-register go bit ("self-stop").
//!
//! The engine exclusively owns its address space; independent engines are
//! fully isolated from one another.

use tracing::debug;

use crate::common::constants::{BANK_SELECT_BIT, CTRL_GO_BIT, G_HIDATA, G_REMAIN, MEMORY_SIZE};
use crate::common::events::{CoreEvent, StopReason};
use crate::common::reg::{DelaySlot, Flags, RegisterBanks};
use crate::config::{Config, CoreMode};
use crate::isa::condition;
use crate::isa::decode::{Opcode, decode};
use crate::mem::AddressSpace;

/// Logical right shift treating out-of-range amounts as the hardware does.
#[inline]
fn lsr(value: i32, amount: u32) -> i32 {
    if amount >= 32 {
        0
    } else {
        ((value as u32) >> amount) as i32
    }
}

/// Arithmetic (sign-extending) right shift.
#[inline]
fn asr(value: i32, amount: u32) -> i32 {
    if amount >= 32 { value >> 31 } else { value >> amount }
}

/// Left shift; amounts of 32 or more produce 0.
#[inline]
fn lsl(value: i32, amount: u32) -> i32 {
    if amount >= 32 {
        0
    } else {
        ((value as u32) << amount) as i32
    }
}

/// Register banks, flags, program counter, delay slot, and memory for one
/// coprocessor instance.
#[derive(Debug)]
pub struct Engine {
    /// The address space this engine exclusively owns.
    pub mem: AddressSpace,
    /// The dual register banks.
    pub regs: RegisterBanks,
    /// Zero/Negative/Carry flags.
    pub flags: Flags,
    /// Current fetch address; always even.
    pub pc: i32,
    /// The single delayed-branch slot.
    pub delay: DelaySlot,
    mode: CoreMode,
    /// Program counter restored by `reset` (the resolved load address).
    base_pc: i32,
    /// Whether a continuous run is active; gates self-stop detection.
    run_active: bool,
    /// Latched halt cause for the run loop to pick up.
    halt: Option<StopReason>,
}

impl Engine {
    /// Creates an engine with a fresh address space and zeroed state.
    pub fn new(config: &Config) -> Self {
        Self {
            mem: AddressSpace::new(config),
            regs: RegisterBanks::new(),
            flags: Flags::default(),
            pc: 0,
            delay: DelaySlot::default(),
            mode: config.mode,
            base_pc: 0,
            run_active: false,
            halt: None,
        }
    }

    /// The current operating mode.
    pub fn mode(&self) -> CoreMode {
        self.mode
    }

    /// Switches operating mode (flags/control offsets and RAM window).
    pub fn set_mode(&mut self, mode: CoreMode) {
        self.mode = mode;
        self.mem.set_mode(mode);
    }

    /// Records the resolved load address that `reset` restores the program
    /// counter to, and applies it immediately.
    pub fn set_base_pc(&mut self, addr: i32) {
        self.base_pc = addr;
        self.pc = addr;
    }

    /// Marks a continuous run as active or inactive. Self-stop detection
    /// only fires while a run is active.
    pub fn set_run_active(&mut self, active: bool) {
        self.run_active = active;
    }

    /// Takes the latched halt cause, if any.
    pub fn take_halt(&mut self) -> Option<StopReason> {
        self.halt.take()
    }

    /// Full reset: zeroes both banks and the flags, clears the delay slot,
    /// and restores the program counter to the load address.
    pub fn reset(&mut self) {
        self.run_active = false;
        self.regs.clear();
        self.flags.clear();
        self.delay.clear();
        self.pc = self.base_pc;
        self.halt = None;
    }

    /// Executes (or, with `execute == false`, merely steps over) one
    /// instruction word.
    ///
    /// The program counter advances by the instruction's width before
    /// dispatch: 2 bytes, plus 4 more for the `movei` immediate in both
    /// the execute and skip paths. Afterwards a pending delay-slot target
    /// is committed unless this instruction was itself a branch.
    pub fn step(&mut self, word: u16, execute: bool) {
        let inst = decode(word);
        let (r1, r2) = (inst.reg1, inst.reg2);

        self.pc = self.pc.wrapping_add(2);

        if execute {
            self.dispatch(inst.opcode, r1, r2);
        } else if inst.opcode == Opcode::Movei {
            self.pc = self.pc.wrapping_add(4);
        }

        if !inst.opcode.is_branch() && self.delay.pending {
            self.pc = self.delay.target;
            self.delay.pending = false;
            debug!(pc = format_args!("${:08X}", self.pc), "delay slot committed");
            self.check_pc();
        }
    }

    /// Opcode semantics. `r1`/`r2` are the raw 5-bit operand fields.
    fn dispatch(&mut self, opcode: Opcode, r1: u8, r2: u8) {
        // Quick immediate of the add/sub quick forms: 0 means 32.
        let quick = if r1 == 0 { 32 } else { i32::from(r1) };

        match opcode {
            Opcode::Add => {
                let (a, b) = (self.regs.get(r1), self.regs.get(r2));
                self.flags.carry_add(a, b);
                let res = a.wrapping_add(b);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Addc => {
                let carry = i32::from(self.flags.c);
                let (a, b) = (self.regs.get(r1), self.regs.get(r2));
                self.flags.carry_add(a.wrapping_add(carry), b);
                let res = a.wrapping_add(carry).wrapping_add(b);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Addq => {
                let b = self.regs.get(r2);
                self.flags.carry_add(quick, b);
                let res = quick.wrapping_add(b);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Addqt => {
                // Transparent form: no flag update.
                self.regs.set(r2, quick.wrapping_add(self.regs.get(r2)));
            }
            Opcode::Sub => {
                let (a, b) = (self.regs.get(r1), self.regs.get(r2));
                self.flags.carry_sub(a, b);
                let res = b.wrapping_sub(a);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Subc => {
                let carry = i32::from(self.flags.c);
                let (a, b) = (self.regs.get(r1), self.regs.get(r2));
                self.flags.carry_sub(a, b.wrapping_add(carry));
                let res = b.wrapping_sub(a).wrapping_sub(carry);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Subq => {
                let b = self.regs.get(r2);
                self.flags.carry_sub(quick, b);
                let res = b.wrapping_sub(quick);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Subqt => {
                self.regs.set(r2, self.regs.get(r2).wrapping_sub(quick));
            }
            Opcode::Neg => {
                let res = self.regs.get(r2).wrapping_neg();
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Abs => {
                let v = self.regs.get(r2);
                self.flags.n = false;
                self.flags.c = v < 0;
                let res = v.wrapping_abs();
                self.regs.set(r2, res);
                self.flags.z = res == 0;
            }
            Opcode::And => {
                let res = self.regs.get(r1) & self.regs.get(r2);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Or => {
                let res = self.regs.get(r1) | self.regs.get(r2);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Xor => {
                let res = self.regs.get(r1) ^ self.regs.get(r2);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Not => {
                let res = !self.regs.get(r2);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Btst => {
                let bit = 1u32 << r1;
                self.flags.z = (self.regs.get(r2) as u32) & bit == 0;
            }
            Opcode::Bset => {
                let res = ((self.regs.get(r2) as u32) | (1u32 << r1)) as i32;
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Bclr => {
                let res = ((self.regs.get(r2) as u32) & !(1u32 << r1)) as i32;
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Mult => {
                // Unsigned 16-bit operand interpretation.
                let a = u32::from(self.regs.get(r1) as u16);
                let b = u32::from(self.regs.get(r2) as u16);
                let res = a.wrapping_mul(b) as i32;
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Imult => {
                // Signed 16-bit operand interpretation.
                let a = i32::from(self.regs.get(r1) as i16);
                let b = i32::from(self.regs.get(r2) as i16);
                let res = a.wrapping_mul(b);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Div => {
                // Unsigned divide; divide-by-zero yields 0/0 instead of
                // trapping. The remainder register gets `rem` when the
                // quotient is odd and `rem - divisor` when even, a
                // documented hardware quirk preserved as-is.
                let divisor = self.regs.get(r1) as u32;
                let dividend = self.regs.get(r2) as u32;
                let quotient = if divisor == 0 { 0 } else { dividend / divisor };
                let rem = if divisor == 0 { 0 } else { dividend % divisor } as i32;
                self.regs.set(r2, quotient as i32);
                if quotient & 1 == 0 {
                    self.write_long(G_REMAIN, rem.wrapping_sub(divisor as i32));
                } else {
                    self.write_long(G_REMAIN, rem);
                }
            }
            Opcode::Sh => {
                // Amounts outside +/-32 shift by nothing; positive shifts
                // right (logical), negative shifts left.
                let mut amount = self.regs.get(r1);
                if !(-32..=32).contains(&amount) {
                    amount = 0;
                }
                let v = self.regs.get(r2);
                let res = if amount >= 0 {
                    self.flags.c = v & 1 != 0;
                    lsr(v, amount as u32)
                } else {
                    self.flags.c = v < 0;
                    lsl(v, amount.unsigned_abs())
                };
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Sha => {
                let mut amount = self.regs.get(r1);
                if !(-32..=32).contains(&amount) {
                    amount = 0;
                }
                let v = self.regs.get(r2);
                let res = if amount >= 0 {
                    self.flags.c = v & 1 != 0;
                    asr(v, amount as u32)
                } else {
                    self.flags.c = v < 0;
                    lsl(v, amount.unsigned_abs())
                };
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Shlq => {
                // Encoded amount is 32 - n.
                let v = self.regs.get(r2);
                self.flags.c = v < 0;
                let res = lsl(v, (32 - i32::from(r1)) as u32);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Shrq => {
                let v = self.regs.get(r2);
                self.flags.c = v & 1 != 0;
                let res = lsr(v, u32::from(r1));
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Sharq => {
                let v = self.regs.get(r2);
                self.flags.c = v & 1 != 0;
                let res = asr(v, u32::from(r1));
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Ror => {
                let v = self.regs.get(r2);
                self.flags.c = v < 0;
                let amount = (self.regs.get(r1) & 31) as u32;
                let res = (v as u32).rotate_right(amount) as i32;
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Rorq => {
                let v = self.regs.get(r2);
                self.flags.c = v < 0;
                let res = (v as u32).rotate_right(u32::from(r1)) as i32;
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Cmp => {
                let (a, b) = (self.regs.get(r1), self.regs.get(r2));
                self.flags.carry_sub(a, b);
                self.flags.update_zn(b.wrapping_sub(a));
            }
            Opcode::Cmpq => {
                // Unlike addq/subq, cmpq uses the raw quick field (no
                // zero-means-32).
                let q = i32::from(r1);
                let b = self.regs.get(r2);
                self.flags.carry_sub(q, b);
                self.flags.update_zn(b.wrapping_sub(q));
            }
            Opcode::Sat8 => {
                let res = self.regs.get(r2).clamp(0, 0xFF);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Sat16 => {
                let res = self.regs.get(r2).clamp(0, 0xFFFF);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Sat24 => {
                let res = self.regs.get(r2).clamp(0, 0x00FF_FFFF);
                self.regs.set(r2, res);
                self.flags.update_zn(res);
            }
            Opcode::Move => {
                self.regs.set(r2, self.regs.get(r1));
            }
            Opcode::Moveq => {
                self.regs.set(r2, i32::from(r1));
            }
            Opcode::MovePc => {
                // The instruction's own address (the PC already advanced).
                self.regs.set(r2, self.pc.wrapping_sub(2));
            }
            Opcode::Moveta => {
                let v = self.regs.get(r1);
                self.regs.set_alt(r2, v);
            }
            Opcode::Movefa => {
                let v = self.regs.get_alt(r1);
                self.regs.set(r2, v);
            }
            Opcode::Movei => {
                // Low word first, then high word; privileged fetches skip
                // the internal-RAM advisory.
                let lo = self.mem.fetch_word(self.pc);
                let hi = self.mem.fetch_word(self.pc.wrapping_add(2));
                self.regs.set(r2, (lo & 0xFFFF) | (hi << 16));
                self.pc = self.pc.wrapping_add(4);
            }
            Opcode::Loadb => {
                let v = self.mem.read_byte(self.regs.get(r1));
                self.regs.set(r2, v);
            }
            Opcode::Loadw => {
                let v = self.mem.read_word(self.regs.get(r1));
                self.regs.set(r2, v);
            }
            Opcode::Load => {
                let v = self.mem.read_long(self.regs.get(r1));
                self.regs.set(r2, v);
            }
            Opcode::Loadp => {
                let addr = self.regs.get(r1);
                let phrase_hi = self.mem.read_long(addr);
                self.write_long(G_HIDATA, phrase_hi);
                let v = self.mem.read_long(addr.wrapping_add(4));
                self.regs.set(r2, v);
            }
            Opcode::LoadR14Ind => {
                let addr = self.regs.get(14).wrapping_add(i32::from(r1) * 4);
                let v = self.mem.read_long(addr);
                self.regs.set(r2, v);
            }
            Opcode::LoadR15Ind => {
                let addr = self.regs.get(15).wrapping_add(i32::from(r1) * 4);
                let v = self.mem.read_long(addr);
                self.regs.set(r2, v);
            }
            Opcode::LoadR14Reg => {
                let addr = self.regs.get(14).wrapping_add(self.regs.get(r1));
                let v = self.mem.read_long(addr);
                self.regs.set(r2, v);
            }
            Opcode::LoadR15Reg => {
                let addr = self.regs.get(15).wrapping_add(self.regs.get(r1));
                let v = self.mem.read_long(addr);
                self.regs.set(r2, v);
            }
            Opcode::Storeb => {
                self.write_byte(self.regs.get(r1), self.regs.get(r2));
            }
            Opcode::Storew => {
                self.write_word(self.regs.get(r1), self.regs.get(r2));
            }
            Opcode::Store => {
                self.write_long(self.regs.get(r1), self.regs.get(r2));
            }
            Opcode::Storep => {
                let addr = self.regs.get(r1);
                let phrase_hi = self.mem.read_long(G_HIDATA);
                self.write_long(addr, phrase_hi);
                self.write_long(addr.wrapping_add(4), self.regs.get(r2));
            }
            Opcode::StoreR14Ind => {
                let addr = self.regs.get(14).wrapping_add(i32::from(r1) * 4);
                self.write_long(addr, self.regs.get(r2));
            }
            Opcode::StoreR15Ind => {
                let addr = self.regs.get(15).wrapping_add(i32::from(r1) * 4);
                self.write_long(addr, self.regs.get(r2));
            }
            Opcode::StoreR14Reg => {
                let addr = self.regs.get(14).wrapping_add(self.regs.get(r1));
                self.write_long(addr, self.regs.get(r2));
            }
            Opcode::StoreR15Reg => {
                let addr = self.regs.get(15).wrapping_add(self.regs.get(r1));
                self.write_long(addr, self.regs.get(r2));
            }
            Opcode::Jump => {
                if condition::matches(r2, &self.flags) {
                    self.delay.schedule(self.regs.get(r1));
                }
            }
            Opcode::Jr => {
                if condition::matches(r2, &self.flags) {
                    // Signed 5-bit word displacement relative to the next
                    // instruction.
                    let target = if r1 > 15 {
                        self.pc.wrapping_sub((32 - i32::from(r1)) * 2)
                    } else {
                        self.pc.wrapping_add(i32::from(r1) * 2)
                    };
                    self.delay.schedule(target);
                }
            }
            Opcode::PackUnpack => {
                let v = self.regs.get(r2);
                let res = if r1 == 0 {
                    ((v & 0x03C0_0000) >> 10) | ((v & 0x0001_E000) >> 5) | (v & 0x0000_00FF)
                } else {
                    ((v << 10) & 0x03C0_0000) | ((v << 5) & 0x0001_E000) | (v & 0x0000_00FF)
                };
                self.regs.set(r2, res);
            }
            Opcode::Unknown(_) => {
                // Closed opcode set: anything else is an explicit no-op.
            }
        }
    }

    /// Memory-write wrappers: the write itself, then the side-effect check.
    fn write_long(&mut self, addr: i32, data: i32) {
        self.mem.write_long(addr, data);
        self.after_write();
    }

    fn write_word(&mut self, addr: i32, data: i32) {
        self.mem.write_word(addr, data);
        self.after_write();
    }

    fn write_byte(&mut self, addr: i32, data: i32) {
        self.mem.write_byte(addr, data);
        self.after_write();
    }

    /// After every write: re-derive the current register bank from the
    /// mode's flags register, and detect the program clearing its own
    /// control-register go bit while a run is active.
    fn after_write(&mut self) {
        let ctrl = self.mem.peek_long(self.mode.ctrl_addr()).unwrap_or(0);
        if ctrl & CTRL_GO_BIT == 0 && self.run_active {
            self.run_active = false;
            self.halt = Some(StopReason::SelfStop);
            self.mem.push_event(CoreEvent::SelfStop { mode: self.mode });
        }
        let flags_word = self.mem.peek_long(self.mode.flags_addr()).unwrap_or(0);
        self.regs.current = ((flags_word >> BANK_SELECT_BIT) & 1) as usize;
    }

    /// Validates the program counter after a delay-slot commit. Leaving the
    /// address space is fatal to the session: report, full reset.
    fn check_pc(&mut self) {
        if self.pc < 0 || self.pc > MEMORY_SIZE as i32 {
            let faulting = self.pc;
            self.mem.push_event(CoreEvent::PcOutOfBounds { pc: faulting });
            self.reset();
            self.halt = Some(StopReason::PcFault(faulting));
        }
    }
}
