//! Assembler, disassembler and image files.
//!
//! This module provides:
//! - A simple two-pass assembler (text → ROM image)
//! - A disassembler (ROM image → readable text)
//! - The hex image format used for ROM and decode-table contents

pub mod assembler;
pub mod disasm;
pub mod hexfile;

pub use assembler::{assemble, AssemblerError};
pub use disasm::disassemble;
pub use hexfile::{format_hex, load_hex, parse_hex, save_hex, HexFileError};
