//! Tom/Jerry RISC debugger CLI.
//!
//! This binary drives a single debugging session from the command line. It performs:
//! 1. **Load:** Read a headered or plain image into the memory map.
//! 2. **Listing:** Optionally print the disassembly built at load time.
//! 3. **Execution:** Single-step a fixed count, or run to a breakpoint with
//!    an optional watchdog timeout.

use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jagrisc_core::config::{Config, CoreMode};
use jagrisc_core::sim::Debugger;

#[derive(Parser, Debug)]
#[command(
    name = "jagdbg",
    author,
    version,
    about = "Debugger for the Atari Jaguar's Tom/Jerry RISC coprocessors",
    long_about = "Load a GPU/DSP image, disassemble it, and step or run it.\n\nAddresses accept 0x or $ prefixes.\n\nExamples:\n  jagdbg demo.bin --list\n  jagdbg demo.o -a 0xF03000 --steps 32\n  jagdbg demo.o --run --break \\$F03010 --timeout-ms 5000"
)]
struct Cli {
    /// Image file to load (headered images relocate themselves).
    image: PathBuf,

    /// Load address for plain images.
    #[arg(short = 'a', long = "addr", value_parser = parse_addr, default_value = "0xF03000")]
    addr: i32,

    /// Which coprocessor register map to use.
    #[arg(long, value_enum, default_value_t = ModeArg::Gpu)]
    mode: ModeArg,

    /// Configuration file (JSON) overriding mode and warning settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the disassembly listing after loading.
    #[arg(long)]
    list: bool,

    /// Run until a breakpoint, the end of the program, or a fault.
    #[arg(long)]
    run: bool,

    /// Breakpoint address; stops a run before the instruction executes.
    #[arg(long = "break", value_parser = parse_addr)]
    breakpoint: Option<i32>,

    /// Single-step this many instructions instead of running.
    #[arg(long)]
    steps: Option<u32>,

    /// Abort a run after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Silence the out-of-window access advisories.
    #[arg(long)]
    no_mem_warn: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    Gpu,
    Dsp,
}

impl From<ModeArg> for CoreMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Gpu => CoreMode::Gpu,
            ModeArg::Dsp => CoreMode::Dsp,
        }
    }
}

/// Parses `0x`- or `$`-prefixed hex, or plain decimal.
fn parse_addr(s: &str) -> Result<i32, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("$")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse::<u32>()
    };
    parsed.map(|v| v as i32).map_err(|e| format!("bad address {s:?}: {e}"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config {
        mode: cli.mode.into(),
        ..Config::default()
    };
    if let Some(path) = &cli.config {
        config = match read_config(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error reading config {}: {e}", path.display());
                process::exit(1);
            }
        };
    }
    if cli.no_mem_warn {
        config.memory_warnings = false;
    }

    let mut dbg = Debugger::new(&config);

    let image = match dbg.load_bin(&cli.image, cli.addr) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error loading {}: {e}", cli.image.display());
            process::exit(1);
        }
    };
    println!(
        "[*] Loaded {} ({} bytes at ${:08X}, {} mode)",
        cli.image.display(),
        image.program_size,
        image.load_address,
        dbg.mode()
    );

    if cli.list {
        for entry in dbg.listing() {
            println!("{entry}");
        }
    }

    if let Some(addr) = cli.breakpoint {
        dbg.set_breakpoint(addr);
    }

    if let Some(count) = cli.steps {
        for _ in 0..count {
            if let Err(e) = dbg.step() {
                eprintln!("[!] {e}");
                process::exit(1);
            }
        }
        println!("[*] Stepped {} instruction(s), PC=${:08X}", count, dbg.pc());
        dump_state(&mut dbg);
    } else if cli.run {
        if let Some(ms) = cli.timeout_ms {
            let handle = dbg.stop_handle();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(ms));
                handle.request_stop();
            });
        }
        match dbg.run() {
            Ok(reason) => println!("\n[*] Stopped: {reason}"),
            Err(e) => {
                eprintln!("[!] {e}");
                process::exit(1);
            }
        }
        dump_state(&mut dbg);
    }
}

/// Reads a JSON configuration file.
fn read_config(path: &std::path::Path) -> Result<Config, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Prints the active bank, flags, and any accumulated events.
fn dump_state(dbg: &mut Debugger) {
    let bank = dbg.current_bank();
    println!("Bank {bank}:");
    if let Ok(lines) = dbg.bank_lines(bank) {
        for chunk in lines.chunks(4) {
            println!("  {}", chunk.join("  "));
        }
    }
    println!("{}", dbg.flags_line());
    for event in dbg.drain_events() {
        println!("[!] {event}");
    }
}
