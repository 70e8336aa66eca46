//! Control-line vector produced by the microcode decoder.
//!
//! The bit order is the decode-table byte layout, MSB first:
//! PCincr, uSreset, Xena, ARena, ARload, IRload, Xload, PCload.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// One decoded microcode word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ControlLines: u8 {
        /// Increment PC.
        const PC_INCR = 0b1000_0000;
        /// Return uSeq to phase 0 on the next edge.
        const US_RESET = 0b0100_0000;
        /// X drives the data bus (and ROM is written).
        const X_ENA = 0b0010_0000;
        /// AR drives the address bus instead of PC.
        const AR_ENA = 0b0001_0000;
        /// Load AR from the data bus.
        const AR_LOAD = 0b0000_1000;
        /// Load IR from the data bus.
        const IR_LOAD = 0b0000_0100;
        /// Load X from the data bus.
        const X_LOAD = 0b0000_0010;
        /// Load PC from the data bus.
        const PC_LOAD = 0b0000_0001;
    }
}

impl ControlLines {
    /// No lines asserted. Used for wait phases and reserved opcodes.
    pub const WAIT: Self = Self::empty();

    /// Display names in decode-table bit order.
    pub const NAMES: [(Self, &'static str); 8] = [
        (Self::PC_INCR, "PCincr"),
        (Self::US_RESET, "uSreset"),
        (Self::X_ENA, "Xena"),
        (Self::AR_ENA, "ARena"),
        (Self::AR_LOAD, "ARload"),
        (Self::IR_LOAD, "IRload"),
        (Self::X_LOAD, "Xload"),
        (Self::PC_LOAD, "PCload"),
    ];

    /// Decode a raw table byte. Every bit is meaningful, so this is total.
    #[inline]
    pub const fn from_byte(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }

    /// Names of the asserted lines, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(line, _)| self.contains(*line))
            .map(|(_, name)| *name)
            .collect()
    }

    /// ROM write enable. X is stored whenever it drives the data bus.
    #[inline]
    pub fn rom_write(self) -> bool {
        self.contains(Self::X_ENA)
    }
}

impl std::fmt::Display for ControlLines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "(wait)")
        } else {
            write!(f, "{}", self.names().join(","))
        }
    }
}

/// Decode memory address for an instruction byte and a phase.
///
/// Only the low nibble of each participates.
#[inline]
pub const fn decode_address(ir: u8, useq: u8) -> u8 {
    ((ir & 0x0F) << 4) | (useq & 0x0F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        assert_eq!(ControlLines::PC_INCR.bits(), 0x80);
        assert_eq!(ControlLines::PC_LOAD.bits(), 0x01);
        let fetch = ControlLines::from_byte(0x84);
        assert_eq!(fetch, ControlLines::IR_LOAD | ControlLines::PC_INCR);
    }

    #[test]
    fn test_display() {
        assert_eq!(ControlLines::WAIT.to_string(), "(wait)");
        let stx = ControlLines::AR_ENA | ControlLines::X_ENA | ControlLines::US_RESET;
        assert_eq!(stx.to_string(), "uSreset,Xena,ARena");
        assert!(stx.rom_write());
    }

    #[test]
    fn test_decode_address() {
        assert_eq!(decode_address(0x02, 3), 0x23);
        // High nibbles are ignored on both inputs
        assert_eq!(decode_address(0xF4, 0x12), 0x42);
    }
}
