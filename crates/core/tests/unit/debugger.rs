//! Debugger session tests: lifecycle, stepping, breakpoints, the run loop,
//! and the inspection surface.

use std::thread;
use std::time::Duration;

use jagrisc_core::common::constants::{G_CTRL, MEMORY_SIZE};
use jagrisc_core::common::events::{ControlError, CoreEvent, StopReason};
use jagrisc_core::config::{Config, CoreMode};
use jagrisc_core::isa::decode::Opcode;
use jagrisc_core::sim::Debugger;
use pretty_assertions::assert_eq;

use crate::common::{LOAD, assemble, debugger_with, movei, op};

#[test]
fn fresh_session_rejects_execution() {
    let mut dbg = Debugger::new(&Config::default());
    assert_eq!(dbg.step(), Err(ControlError::NoImage));
    assert_eq!(dbg.skip(), Err(ControlError::NoImage));
    assert!(matches!(dbg.run(), Err(ControlError::NoImage)));
}

#[test]
fn load_builds_the_listing_and_parks_the_pc() {
    let dbg = debugger_with(&[op(Opcode::Moveq, 1, 2), op(Opcode::Add, 2, 3)]);
    assert_eq!(dbg.pc(), LOAD);
    assert_eq!(dbg.progress(), 100);
    let texts: Vec<&str> = dbg.listing().iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["moveq  #1,r2", "add    r2,r3"]);
}

#[test]
fn step_executes_and_advances() {
    let mut words = vec![op(Opcode::Moveq, 9, 4)];
    words.extend(movei(5, 0x0102_0304));
    let mut dbg = debugger_with(&words);

    dbg.step().expect("step");
    assert_eq!(dbg.pc(), LOAD + 2);
    assert_eq!(dbg.register(0, 4), Ok(9));

    dbg.step().expect("step");
    assert_eq!(dbg.pc(), LOAD + 8, "movei is three words wide");
    assert_eq!(dbg.register(0, 5), Ok(0x0102_0304));
}

#[test]
fn skip_advances_without_executing() {
    let mut dbg = debugger_with(&[op(Opcode::Moveq, 9, 4)]);
    dbg.skip().expect("skip");
    assert_eq!(dbg.pc(), LOAD + 2);
    assert_eq!(dbg.register(0, 4), Ok(0));
}

#[test]
fn breakpoints_toggle_and_track_a_primary() {
    let mut dbg = debugger_with(&[op(Opcode::Moveq, 1, 2)]);
    dbg.set_breakpoint(LOAD + 4);
    assert!(dbg.has_breakpoint(LOAD + 4));
    assert_eq!(dbg.breakpoint(), Some(LOAD + 4));

    dbg.set_breakpoint(LOAD + 8);
    assert!(dbg.has_breakpoint(LOAD + 4), "both stay set");
    assert_eq!(dbg.breakpoint(), Some(LOAD + 8), "latest insert is primary");

    dbg.set_breakpoint(LOAD + 8);
    assert!(!dbg.has_breakpoint(LOAD + 8), "re-toggling removes");
    assert!(dbg.has_breakpoint(LOAD + 4));
    assert_eq!(dbg.breakpoint(), None, "removing the primary clears the indicator");

    dbg.set_breakpoint(LOAD + 4);
    assert!(!dbg.has_breakpoint(LOAD + 4));
}

#[test]
fn run_stops_at_the_breakpoint_before_executing_it() {
    let mut dbg = debugger_with(&[
        op(Opcode::Moveq, 1, 2),
        op(Opcode::Moveq, 2, 3),
        op(Opcode::Moveq, 3, 4),
    ]);
    dbg.set_breakpoint(LOAD + 4);

    assert_eq!(dbg.run(), Ok(StopReason::Breakpoint(LOAD + 4)));
    assert_eq!(dbg.pc(), LOAD + 4);
    assert_eq!(dbg.register(0, 3), Ok(2));
    assert_eq!(dbg.register(0, 4), Ok(0), "instruction at the breakpoint did not run");
}

#[test]
fn run_reaches_the_end_of_the_program() {
    let mut dbg = debugger_with(&[op(Opcode::Moveq, 1, 2), op(Opcode::Moveq, 5, 3)]);
    assert_eq!(dbg.run(), Ok(StopReason::ProgramEnd(LOAD + 4)));
    assert_eq!(dbg.register(0, 2), Ok(1));
    assert_eq!(dbg.register(0, 3), Ok(5));
}

#[test]
fn run_sets_the_go_bit_and_honors_self_stop() {
    // The program clears its own go bit: movei G_CTRL,r1; moveq 0,r2; store.
    let mut words = movei(1, G_CTRL).to_vec();
    words.push(op(Opcode::Moveq, 0, 2));
    words.push(op(Opcode::Store, 1, 2));
    words.push(op(Opcode::Moveq, 31, 3)); // never reached
    let mut dbg = debugger_with(&words);

    assert_eq!(dbg.run(), Ok(StopReason::SelfStop));
    assert_eq!(dbg.register(0, 3), Ok(0));
    assert!(
        dbg.drain_events()
            .contains(&CoreEvent::SelfStop { mode: CoreMode::Gpu })
    );

    // A second run raises the go bit again and still makes progress.
    assert!(dbg.reset().is_ok());
    assert_eq!(dbg.run(), Ok(StopReason::SelfStop));
}

#[test]
fn run_stops_once_the_pc_passes_the_image() {
    // Jump far past the image (still inside the address space).
    let mut words = movei(1, MEMORY_SIZE as i32).to_vec();
    words.push(op(Opcode::Jump, 1, 0x00));
    words.push(op(Opcode::Moveq, 0, 2)); // delay slot
    let mut dbg = debugger_with(&words);

    assert_eq!(dbg.run(), Ok(StopReason::ProgramEnd(MEMORY_SIZE as i32)));
}

#[test]
fn run_survives_a_pc_fault_by_resetting() {
    let mut words = movei(1, -32).to_vec();
    words.push(op(Opcode::Jump, 1, 0x00));
    words.push(op(Opcode::Moveq, 0, 2)); // delay slot
    let mut dbg = debugger_with(&words);

    assert_eq!(dbg.run(), Ok(StopReason::PcFault(-32)));
    assert_eq!(dbg.pc(), LOAD, "engine reset back to the load address");
    assert!(
        dbg.drain_events()
            .contains(&CoreEvent::PcOutOfBounds { pc: -32 })
    );
}

#[test]
fn run_is_not_poisoned_by_a_stepped_pc_fault() {
    let mut words = movei(1, -32).to_vec();
    words.push(op(Opcode::Jump, 1, 0x00));
    words.push(op(Opcode::Moveq, 0, 2)); // delay slot
    let mut dbg = debugger_with(&words);

    // Stepping through the jump and its slot faults and resets the engine.
    for _ in 0..3 {
        dbg.step().expect("step");
    }
    assert_eq!(dbg.pc(), LOAD);
    dbg.drain_events();

    // A fresh run must not report that stale fault; it reaches the
    // breakpoint one instruction in.
    dbg.set_breakpoint(LOAD + 6);
    assert_eq!(dbg.run(), Ok(StopReason::Breakpoint(LOAD + 6)));
    assert_eq!(dbg.pc(), LOAD + 6);
}

#[test]
fn step_refuses_an_unreadable_fetch_address() {
    // One word right at the top of the address space.
    let edge = MEMORY_SIZE as i32 - 2;
    let mut dbg = Debugger::new(&Config::default());
    dbg.load_bytes(&assemble(&[op(Opcode::Moveq, 5, 2)]), edge)
        .expect("load");

    dbg.step().expect("step");
    assert_eq!(dbg.pc(), MEMORY_SIZE as i32);

    assert_eq!(dbg.step(), Err(ControlError::FetchFault(MEMORY_SIZE as i32)));
    assert_eq!(dbg.pc(), MEMORY_SIZE as i32, "a refused step moves nothing");
    assert_eq!(dbg.register(0, 2), Ok(5));
}

#[test]
fn stop_handle_interrupts_a_spinning_program() {
    // jr back to itself plus a slot instruction: a tight infinite loop.
    let mut dbg = debugger_with(&[op(Opcode::Jr, 31, 0x00), op(Opcode::Moveq, 0, 2)]);
    let handle = dbg.stop_handle();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.request_stop();
    });

    assert_eq!(dbg.run(), Ok(StopReason::Requested));
    stopper.join().expect("join");

    // The request is consumed; the next run starts clean.
    dbg.set_breakpoint(LOAD);
    assert_eq!(dbg.run(), Ok(StopReason::Breakpoint(LOAD)));
}

#[test]
fn reset_rewinds_without_clearing_memory() {
    let mut dbg = debugger_with(&[op(Opcode::Moveq, 7, 2), op(Opcode::Moveq, 1, 3)]);
    dbg.step().expect("step");
    assert_eq!(dbg.register(0, 2), Ok(7));

    dbg.reset().expect("reset");
    assert_eq!(dbg.pc(), LOAD);
    assert_eq!(dbg.register(0, 2), Ok(0));
    assert_eq!(dbg.listing().len(), 2, "listing survives");
    dbg.step().expect("step");
    assert_eq!(dbg.register(0, 2), Ok(7), "program memory survives");
}

#[test]
fn register_edits_are_validated() {
    let mut dbg = debugger_with(&[op(Opcode::Moveq, 0, 0)]);
    assert!(dbg.edit_register(1, 31, -1).is_ok());
    assert_eq!(dbg.register(1, 31), Ok(-1));
    assert_eq!(dbg.edit_register(2, 0, 0), Err(ControlError::BadBank(2)));
    assert_eq!(dbg.edit_register(0, 32, 0), Err(ControlError::BadRegister(32)));
}

#[test]
fn jump_target_mirrors_the_delay_slot() {
    let mut dbg = debugger_with(&[
        op(Opcode::Jr, 2, 0x00),
        op(Opcode::Moveq, 0, 2),
        op(Opcode::Moveq, 1, 3),
    ]);
    assert_eq!(dbg.jump_target(), None);
    dbg.step().expect("step");
    assert_eq!(dbg.jump_target(), Some(LOAD + 6));
    dbg.step().expect("step");
    assert_eq!(dbg.jump_target(), None);
    assert_eq!(dbg.pc(), LOAD + 6);
}

#[test]
fn display_accessors_format_like_the_front_panel() {
    let mut dbg = debugger_with(&[op(Opcode::Moveq, 0, 0)]);
    dbg.edit_register(0, 3, 0x00F0_2100).expect("edit");

    let lines = dbg.bank_lines(0).expect("bank");
    assert_eq!(lines.len(), 32);
    assert_eq!(lines[0], "r0:  $00000000");
    assert_eq!(lines[3], "r3:  $00F02100");
    assert_eq!(lines[10], "r10: $00000000");

    assert_eq!(dbg.flags_line(), "Flags: Z:0 N:0 C:0");
    assert_eq!(dbg.current_bank(), 0);
}

#[test]
fn events_drain_once() {
    // A misaligned long access raises one advisory.
    let mut words = movei(1, 0x00F0_5002).to_vec();
    words.push(op(Opcode::Load, 1, 2));
    let mut dbg = debugger_with(&words);
    dbg.step().expect("movei");
    dbg.step().expect("load");

    let events = dbg.drain_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], CoreEvent::MisalignedAccess { .. }));
    assert!(dbg.drain_events().is_empty());
}

#[test]
fn mode_switch_relocates_the_mmio_window() {
    let mut dbg = Debugger::new(&Config {
        mode: CoreMode::Dsp,
        ..Config::default()
    });
    assert_eq!(dbg.mode(), CoreMode::Dsp);
    let d_ram = CoreMode::Dsp.ram_window().0;
    let program = crate::common::assemble(&[op(Opcode::Moveq, 3, 2)]);
    dbg.load_bytes(&program, d_ram).expect("load");
    dbg.step().expect("step");
    assert_eq!(dbg.register(0, 2), Ok(3));
    assert!(dbg.set_mode(CoreMode::Gpu).is_ok());
    assert_eq!(dbg.mode(), CoreMode::Gpu);
}

#[test]
fn hidata_and_remainder_views_read_the_gpu_block() {
    let mut words = movei(1, 2).to_vec(); // divisor 2
    words.push(op(Opcode::Moveq, 7, 2));
    words.push(op(Opcode::Div, 1, 2));
    let mut dbg = debugger_with(&words);
    for _ in 0..3 {
        dbg.step().expect("step");
    }
    assert_eq!(dbg.register(0, 2), Ok(3));
    assert_eq!(dbg.remainder(), 1);
    assert_eq!(dbg.hidata(), 0);
}
