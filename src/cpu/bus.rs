//! Bus fabric: the two multiplexers between the clocked elements.
//!
//! Both buses are recomputed from scratch every cycle. They have no storage.

use super::control::ControlLines;
use serde::{Deserialize, Serialize};

/// Values driven on the address and data buses during one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Buses {
    pub address: u8,
    pub data: u8,
}

/// Register and memory outputs the multiplexers choose between.
#[derive(Debug, Clone, Copy)]
pub struct BusSources {
    pub pc: u8,
    pub ar: u8,
    pub x: u8,
    pub rom: u8,
}

impl Buses {
    /// Select bus drivers for this cycle.
    ///
    /// - address bus: AR when ARena, else PC
    /// - data bus: X when Xena, else the ROM output latch
    pub fn resolve(control: ControlLines, src: BusSources) -> Self {
        let address = if control.contains(ControlLines::AR_ENA) { src.ar } else { src.pc };
        let data = if control.contains(ControlLines::X_ENA) { src.x } else { src.rom };
        Self { address, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: BusSources = BusSources { pc: 0x10, ar: 0x40, x: 0x23, rom: 0x99 };

    #[test]
    fn test_defaults_to_pc_and_rom() {
        let buses = Buses::resolve(ControlLines::WAIT, SRC);
        assert_eq!(buses, Buses { address: 0x10, data: 0x99 });
    }

    #[test]
    fn test_enables_switch_drivers() {
        let buses = Buses::resolve(ControlLines::AR_ENA | ControlLines::X_ENA, SRC);
        assert_eq!(buses, Buses { address: 0x40, data: 0x23 });

        let buses = Buses::resolve(ControlLines::AR_ENA, SRC);
        assert_eq!(buses, Buses { address: 0x40, data: 0x99 });
    }
}
