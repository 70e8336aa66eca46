//! # useq
//!
//! A cycle-accurate emulator of a tiny microsequenced 8-bit processor.
//!
//! The machine is built from clocked registers, counters and memories. Its
//! memories have one cycle of read latency, and the microcode carries
//! explicit wait phases so that no control decision consumes a read before
//! the data is actually on the bus.

pub mod asm;
pub mod clocked;
pub mod cpu;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use asm::{assemble, disassemble, load_hex, parse_hex, save_hex, AssemblerError, HexFileError};
pub use clocked::{Clocked, Counter, Memory, Register, MEMORY_SIZE};
pub use cpu::{ConfigurationError, ControlLines, Cpu, CpuState, Cycle, Opcode, RunError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
