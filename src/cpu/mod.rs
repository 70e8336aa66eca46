//! The microsequenced processor.
//!
//! This module wires the clocked primitives into a CPU:
//! - IR, AR, X registers; PC and uSeq counters
//! - ROM (shared code and data) and the decode memory holding microcode
//! - two bus multiplexers and the control lines that steer them

pub mod bus;
pub mod control;
pub mod execute;
pub mod microcode;

pub use bus::Buses;
pub use control::ControlLines;
pub use execute::{ConfigurationError, Cpu, CpuState, Cycle, RunError};
pub use microcode::{decode_table, Opcode};
