//! Microcode for the instruction set.
//!
//! Each opcode owns a list of phases; each phase is the set of control
//! lines asserted while it runs. The decode memory image is generated from
//! this table, one byte per (opcode nibble, phase nibble) pair. Every
//! unlisted pair, including all of opcodes 5–15, is the zero vector.
//!
//! Phase 1 of every instruction is an explicit wait. The ROM read started
//! by the fetch in phase 0 is not on the data bus until a cycle later,
//! and anything that consumes it has to sit behind that cycle.

use super::control::ControlLines as C;
use crate::clocked::MEMORY_SIZE;
use serde::{Deserialize, Serialize};

/// The five defined instructions. The value is the opcode nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// Fetch the next opcode, nothing else.
    Nop = 0,
    /// Load constant: X := ROM[PC], PC := PC + 1
    Lcx = 1,
    /// Load X: X := ROM[ROM[PC]]
    Ldx = 2,
    /// Store X: ROM[ROM[PC]] := X
    Stx = 3,
    /// Jump: PC := ROM[PC]
    Jmp = 4,
}

const FETCH: C = C::IR_LOAD.union(C::PC_INCR);
const WAIT: C = C::WAIT;

const NOP: &[C] = &[FETCH, WAIT, C::US_RESET];
const LCX: &[C] = &[
    FETCH,
    WAIT,
    C::X_LOAD.union(C::PC_INCR).union(C::US_RESET),
];
const LDX: &[C] = &[
    FETCH,
    WAIT,
    C::AR_LOAD.union(C::PC_INCR),
    C::AR_ENA,
    C::X_LOAD.union(C::US_RESET),
];
const STX: &[C] = &[
    FETCH,
    WAIT,
    C::AR_LOAD.union(C::PC_INCR),
    C::AR_ENA.union(C::X_ENA).union(C::US_RESET),
];
const JMP: &[C] = &[
    FETCH,
    WAIT,
    C::AR_LOAD,
    C::AR_ENA.union(C::PC_LOAD).union(C::US_RESET),
];

impl Opcode {
    /// All defined opcodes in nibble order.
    pub const ALL: [Opcode; 5] = [Opcode::Nop, Opcode::Lcx, Opcode::Ldx, Opcode::Stx, Opcode::Jmp];

    /// Look up the low nibble of an instruction byte.
    ///
    /// Reserved nibbles (5–15) return `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte & 0x0F {
            0 => Some(Opcode::Nop),
            1 => Some(Opcode::Lcx),
            2 => Some(Opcode::Ldx),
            3 => Some(Opcode::Stx),
            4 => Some(Opcode::Jmp),
            _ => None,
        }
    }

    /// Parse an assembler mnemonic (case-insensitive).
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Lcx => "LCX",
            Opcode::Ldx => "LDX",
            Opcode::Stx => "STX",
            Opcode::Jmp => "JMP",
        }
    }

    /// Total encoded length in bytes, opcode included.
    pub fn size(self) -> u8 {
        match self {
            Opcode::Nop => 1,
            _ => 2,
        }
    }

    /// Control vectors for each phase, in order.
    pub fn phases(self) -> &'static [C] {
        match self {
            Opcode::Nop => NOP,
            Opcode::Lcx => LCX,
            Opcode::Ldx => LDX,
            Opcode::Stx => STX,
            Opcode::Jmp => JMP,
        }
    }

    /// Clock cycles one execution takes, including the dead cycle the
    /// decoder latency adds in front of phase 0.
    pub fn cycles(self) -> usize {
        self.phases().len() + 1
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Build the 256-byte decode memory image.
pub fn decode_table() -> Vec<u8> {
    let mut table = vec![0u8; MEMORY_SIZE];
    for op in Opcode::ALL {
        for (phase, lines) in op.phases().iter().enumerate() {
            table[((op as usize) << 4) | phase] = lines.bits();
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_table_bytes() {
        let table = decode_table();
        assert_eq!(table.len(), MEMORY_SIZE);

        assert_eq!(&table[0x00..0x04], &[0x84, 0x00, 0x40, 0x00]);
        assert_eq!(&table[0x10..0x14], &[0x84, 0x00, 0xC2, 0x00]);
        assert_eq!(&table[0x20..0x26], &[0x84, 0x00, 0x88, 0x10, 0x42, 0x00]);
        assert_eq!(&table[0x30..0x35], &[0x84, 0x00, 0x88, 0x70, 0x00]);
        assert_eq!(&table[0x40..0x45], &[0x84, 0x00, 0x08, 0x51, 0x00]);
    }

    #[test]
    fn test_reserved_rows_are_zero() {
        let table = decode_table();
        assert!(table[0x50..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_every_instruction_ends_with_reset() {
        for op in Opcode::ALL {
            let phases = op.phases();
            let (last, body) = phases.split_last().unwrap();
            assert!(last.contains(C::US_RESET), "{} must end with uSreset", op);
            assert!(body.iter().all(|p| !p.contains(C::US_RESET)));
            assert_eq!(phases[0], FETCH);
            assert_eq!(phases[1], WAIT);
        }
    }

    #[test]
    fn test_opcode_lookup() {
        assert_eq!(Opcode::from_byte(0x02), Some(Opcode::Ldx));
        // Only the low nibble decodes
        assert_eq!(Opcode::from_byte(0x23), Some(Opcode::Stx));
        assert_eq!(Opcode::from_byte(0x0F), None);
        assert_eq!(Opcode::from_mnemonic("jmp"), Some(Opcode::Jmp));
        assert_eq!(Opcode::from_mnemonic("ADD"), None);
    }
}
