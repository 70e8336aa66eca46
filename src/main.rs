//! useq Emulator - CLI Entry Point
//!
//! Commands:
//! - `useq-emu run <program>` - Run a hex image or ASM file
//! - `useq-emu debug <program>` - Interactive cycle-stepping debugger
//! - `useq-emu asm <source>` - Assemble to a hex image
//! - `useq-emu disasm <image>` - Disassemble a hex image
//! - `useq-emu ucode` - Write the built-in decode table

use clap::{Parser, Subcommand};
use std::path::Path;
use useq::{Cpu, MEMORY_SIZE};

#[derive(Parser)]
#[command(name = "useq-emu")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "A cycle-accurate emulator of a microsequenced 8-bit processor")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program for a number of cycles
    Run {
        /// Path to the hex image or ASM file to execute
        program: String,
        /// Decode table hex image (default: built-in microcode)
        #[arg(short, long)]
        decode: Option<String>,
        /// Maximum number of cycles to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        max_cycles: u64,
        /// Stop as soon as PC holds this hex address
        #[arg(short, long)]
        until_pc: Option<String>,
        /// Print every cycle
        #[arg(short, long)]
        trace: bool,
        /// Emit trace lines and final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the hex image or ASM file to debug
        program: String,
        /// Decode table hex image (default: built-in microcode)
        #[arg(short, long)]
        decode: Option<String>,
    },
    /// Assemble source to a hex image
    Asm {
        /// Path to the source file
        source: String,
        /// Output hex file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a hex image to readable text
    Disasm {
        /// Path to the hex image
        image: String,
    },
    /// Write the built-in microcode as a decode table hex image
    Ucode {
        /// Output hex file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Run { program, decode, max_cycles, until_pc, trace, json }) => {
            run_program(&program, decode.as_deref(), max_cycles, until_pc.as_deref(), trace, json);
        }
        Some(Commands::Debug { program, decode }) => {
            debug_program(&program, decode.as_deref());
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
        Some(Commands::Ucode { output }) => {
            write_microcode(output);
        }
        None => {
            println!("useq Emulator v0.1.0");
            println!("A microsequenced 8-bit processor with clocked memory");
            println!();
            println!("Use --help for available commands");
            println!();
            print_microcode();
        }
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load a ROM image, assembling `.asm` sources first.
///
/// With `quiet` set nothing goes to stdout.
fn load_rom(path: &str, quiet: bool) -> Vec<u8> {
    use useq::{assemble, load_hex};

    if path.ends_with(".asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Failed to read file: {}", e);
                std::process::exit(1);
            }
        };

        match assemble(&source) {
            Ok(mut image) => {
                if !quiet {
                    println!("📝 Assembled {} bytes", image.len());
                }
                image.resize(MEMORY_SIZE, 0);
                image
            }
            Err(e) => {
                eprintln!("❌ Assembly error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match load_hex(path) {
            Ok(image) => {
                if !quiet {
                    println!("📂 Loaded {}", path);
                }
                image
            }
            Err(e) => {
                eprintln!("❌ Failed to load image: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn build_cpu(program: &str, decode: Option<&str>, quiet: bool) -> Cpu {
    let rom = load_rom(program, quiet);
    let table = match decode {
        Some(path) => match useq::load_hex(path) {
            Ok(table) => table,
            Err(e) => {
                eprintln!("❌ Failed to load decode table: {}", e);
                std::process::exit(1);
            }
        },
        None => useq::cpu::decode_table(),
    };

    match Cpu::new(&rom, &table) {
        Ok(cpu) => cpu,
        Err(e) => {
            eprintln!("❌ Failed to build CPU: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_address(text: &str) -> u8 {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X");
    match u8::from_str_radix(digits, 16) {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("❌ Invalid address '{}': {}", text, e);
            std::process::exit(1);
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> String {
    let result = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match result {
        Ok(text) => text,
        Err(e) => {
            eprintln!("❌ JSON error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(
    path: &str,
    decode: Option<&str>,
    max_cycles: u64,
    until_pc: Option<&str>,
    trace: bool,
    json: bool,
) {
    let mut cpu = build_cpu(path, decode, json);
    let stop_at = until_pc.map(parse_address);

    if !json {
        println!();
        println!("━━━ Execution ━━━");
    }

    let mut reached = false;
    while cpu.cycles() < max_cycles {
        if stop_at == Some(cpu.pc()) {
            reached = true;
            break;
        }
        let cycle = cpu.step();
        if trace {
            if json {
                println!("{}", to_json(&cycle, false));
            } else {
                println!("{}", cycle);
            }
        }
    }

    if json {
        println!("{}", to_json(&cpu.state(), true));
        return;
    }

    let state = cpu.state();
    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", state.cycles);
    println!("PC:   {:02X}", state.pc);
    println!(
        "IR:   {:02X} ({})",
        state.ir,
        state.opcode.map_or("reserved", |op| op.mnemonic())
    );
    println!("AR:   {:02X}", state.ar);
    println!("X:    {:02X}", state.x);
    println!("uSeq: {}", state.useq);
    println!();
    println!("ROM (non-zero cells):");
    for (addr, value) in cpu.rom().iter().enumerate().filter(|(_, v)| **v != 0) {
        println!("  {:02X}: {:02X}", addr, value);
    }

    if let Some(pc) = stop_at {
        if !reached {
            println!();
            println!("⚠️  PC never reached {:02X} within {} cycles.", pc, max_cycles);
        }
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, decode: Option<&str>) {
    use useq::tui::run_debugger;

    let cpu = build_cpu(path, decode, false);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = run_debugger(cpu) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _decode: Option<&str>) {
    eprintln!("❌ This build has no debugger (enable the `tui` feature)");
    std::process::exit(1);
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use useq::{assemble, save_hex};

    let out_path = output.unwrap_or_else(|| default_output_path(source_path));
    if Path::new(&out_path) == Path::new(source_path) {
        eprintln!("❌ Output {} would overwrite the source", out_path);
        std::process::exit(1);
    }

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let image = match assemble(&source) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} bytes", image.len());

    if let Err(e) = save_hex(&out_path, &image) {
        eprintln!("❌ Failed to save image: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

/// The source path with its extension replaced by `.hex`.
fn default_output_path(source_path: &str) -> String {
    Path::new(source_path)
        .with_extension("hex")
        .to_string_lossy()
        .into_owned()
}

fn disassemble_file(path: &str) {
    use useq::{disassemble, load_hex};

    let image = match load_hex(path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", disassemble(&image));
}

fn write_microcode(output: Option<String>) {
    use useq::asm::format_hex;
    use useq::cpu::decode_table;

    let table = decode_table();
    match output {
        Some(path) => {
            if let Err(e) = useq::save_hex(&path, &table) {
                eprintln!("❌ Failed to save decode table: {}", e);
                std::process::exit(1);
            }
            println!("✓ Saved decode table to {}", path);
        }
        None => print!("{}", format_hex(&table)),
    }
}

fn print_microcode() {
    use useq::Opcode;

    println!("━━━ Microcode ━━━");
    for op in Opcode::ALL {
        println!("{:X} {}", op as u8, op);
        for (phase, lines) in op.phases().iter().enumerate() {
            println!("    {}: {}", phase, lines);
        }
    }
}
