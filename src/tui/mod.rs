//! TUI debugger.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and control-line view
//! - ROM grid with PC/AR highlighting
//! - Cycle and instruction stepping, run, breakpoints
//! - Rolling cycle trace

mod app;
mod ui;

pub use app::{run_debugger, DebuggerApp};
