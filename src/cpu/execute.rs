//! Processor core and cycle scheduler.
//!
//! Every call to [`Cpu::step`] is one clock cycle:
//! 1. form the decode address from the current IR and uSeq
//! 2. take the control vector from the decode memory's output latch, which
//!    holds the word addressed during the previous cycle
//! 3. resolve the buses from the current register and ROM outputs
//! 4. stage the next value of every clocked element
//! 5. clock edge: commit them all at once
//!
//! Nothing in steps 1–4 observes a value produced during the same cycle.

use crate::clocked::{Clocked, Counter, Memory, Register};
use crate::cpu::bus::{BusSources, Buses};
use crate::cpu::control::{decode_address, ControlLines};
use crate::cpu::microcode::{self, Opcode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Cycles [`Cpu::run_instruction`] allows before giving up. One more than
/// the number of phases the 4-bit phase nibble can address.
pub const INSTRUCTION_CYCLE_LIMIT: u64 = 16;

/// Everything observable about a single clock cycle.
///
/// Register values are the ones visible during the cycle, before the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// Cycle index, counting from 0 at reset.
    pub number: u64,
    pub pc: u8,
    pub ir: u8,
    pub ar: u8,
    pub x: u8,
    pub useq: u8,
    /// Address presented to the decode memory this cycle.
    pub decode_address: u8,
    /// Control lines in force this cycle.
    pub control: ControlLines,
    pub buses: Buses,
    /// Whether the data bus was written to ROM at the address bus.
    pub rom_write: bool,
}

impl std::fmt::Display for Cycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:6}  PC={:02X} IR={:02X} AR={:02X} X={:02X} uS={:<2}  dec={:02X}  A={:02X} D={:02X}{}  {}",
            self.number,
            self.pc,
            self.ir,
            self.ar,
            self.x,
            self.useq,
            self.decode_address,
            self.buses.address,
            self.buses.data,
            if self.rom_write { " W" } else { "  " },
            self.control,
        )
    }
}

/// Register snapshot for dumps and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub cycles: u64,
    pub pc: u8,
    pub ir: u8,
    pub ar: u8,
    pub x: u8,
    pub useq: u8,
    /// Control lines that will apply on the next cycle.
    pub control: ControlLines,
    /// Decoded IR, `None` for a reserved opcode.
    pub opcode: Option<Opcode>,
}

/// The processor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cpu {
    pc: Counter,
    useq: Counter,
    ir: Register,
    ar: Register,
    x: Register,
    rom: Memory,
    decode: Memory,
    cycles: u64,
}

impl Cpu {
    /// Create a CPU in reset state with the given ROM and decode images.
    ///
    /// Both images must be exactly 256 bytes. Padding short images is up to
    /// the loader.
    pub fn new(rom: &[u8], decode: &[u8]) -> Result<Self, ConfigurationError> {
        let rom = Memory::from_image(rom).ok_or(ConfigurationError::RomSize(rom.len()))?;
        let decode = Memory::from_image(decode)
            .ok_or(ConfigurationError::DecodeTableSize(decode.len()))?;

        debug!(rom_cells = rom.non_zero().len(), "cpu created");

        Ok(Self {
            pc: Counter::new(),
            useq: Counter::new(),
            ir: Register::new(),
            ar: Register::new(),
            x: Register::new(),
            rom,
            decode,
            cycles: 0,
        })
    }

    /// Create a CPU using the built-in microcode.
    pub fn with_microcode(rom: &[u8]) -> Result<Self, ConfigurationError> {
        Self::new(rom, &microcode::decode_table())
    }

    /// Advance the whole machine by exactly one clock cycle.
    pub fn step(&mut self) -> Cycle {
        let dec_addr = decode_address(self.ir.read(), self.useq.read());
        let control = ControlLines::from_byte(self.decode.read());
        let buses = Buses::resolve(
            control,
            BusSources {
                pc: self.pc.read(),
                ar: self.ar.read(),
                x: self.x.read(),
                rom: self.rom.read(),
            },
        );

        let record = Cycle {
            number: self.cycles,
            pc: self.pc.read(),
            ir: self.ir.read(),
            ar: self.ar.read(),
            x: self.x.read(),
            useq: self.useq.read(),
            decode_address: dec_addr,
            control,
            buses,
            rom_write: control.rom_write(),
        };
        trace!(
            cycle = record.number,
            control = %control,
            address = record.buses.address,
            data = record.buses.data,
            "step"
        );

        self.decode.advance(false, dec_addr, 0);
        self.rom.advance(record.rom_write, buses.address, buses.data);
        self.ir.advance(control.contains(ControlLines::IR_LOAD), buses.data);
        self.ar.advance(control.contains(ControlLines::AR_LOAD), buses.data);
        self.x.advance(control.contains(ControlLines::X_LOAD), buses.data);
        self.pc.advance(
            control.contains(ControlLines::PC_LOAD),
            control.contains(ControlLines::PC_INCR),
            buses.data,
        );
        if control.contains(ControlLines::US_RESET) {
            self.useq.reset();
        } else {
            self.useq.advance(false, true, 0);
        }

        self.clock_edge();
        self.cycles += 1;

        if record.rom_write {
            debug!(address = buses.address, data = buses.data, "rom write");
        }
        if control.contains(ControlLines::IR_LOAD) {
            match self.opcode() {
                Some(op) => debug!(pc = record.pc, opcode = %op, "fetch"),
                None => warn!(pc = record.pc, ir = self.ir.read(), "reserved opcode fetched"),
            }
        }

        record
    }

    fn clock_edge(&mut self) {
        self.decode.commit();
        self.rom.commit();
        self.ir.commit();
        self.ar.commit();
        self.x.commit();
        self.pc.commit();
        self.useq.commit();
    }

    /// Step until uSeq is back at phase 0, finishing the instruction in flight.
    ///
    /// From reset this runs the first instruction in full. Returns the
    /// number of cycles taken. A reserved opcode never asserts uSreset and
    /// fails with [`RunError::CycleLimit`].
    pub fn run_instruction(&mut self) -> Result<u64, RunError> {
        let start = self.cycles;
        loop {
            self.step();
            let elapsed = self.cycles - start;
            if self.useq.read() == 0 {
                return Ok(elapsed);
            }
            if elapsed >= INSTRUCTION_CYCLE_LIMIT {
                warn!(pc = self.pc.read(), ir = self.ir.read(), "instruction did not complete");
                return Err(RunError::CycleLimit { limit: INSTRUCTION_CYCLE_LIMIT });
            }
        }
    }

    /// Step until `done` returns true, checking before every cycle.
    ///
    /// Returns the number of cycles executed.
    pub fn run_until<F>(&mut self, max_cycles: u64, mut done: F) -> Result<u64, RunError>
    where
        F: FnMut(&Cpu) -> bool,
    {
        let start = self.cycles;
        while !done(self) {
            if self.cycles - start >= max_cycles {
                warn!(max_cycles, "cycle limit reached");
                return Err(RunError::CycleLimit { limit: max_cycles });
            }
            self.step();
        }
        Ok(self.cycles - start)
    }

    /// Step until PC holds `pc`.
    pub fn run_until_pc(&mut self, pc: u8, max_cycles: u64) -> Result<u64, RunError> {
        self.run_until(max_cycles, |cpu| cpu.pc() == pc)
    }

    #[inline]
    pub fn pc(&self) -> u8 {
        self.pc.read()
    }

    #[inline]
    pub fn ir(&self) -> u8 {
        self.ir.read()
    }

    #[inline]
    pub fn ar(&self) -> u8 {
        self.ar.read()
    }

    #[inline]
    pub fn x(&self) -> u8 {
        self.x.read()
    }

    /// Current microsequence phase.
    #[inline]
    pub fn useq(&self) -> u8 {
        self.useq.read()
    }

    /// Cycles executed since reset.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Contents of a ROM cell, bypassing the clocked read port.
    #[inline]
    pub fn rom_cell(&self, address: u8) -> u8 {
        self.rom.peek(address)
    }

    /// The whole ROM.
    pub fn rom(&self) -> &[u8] {
        self.rom.contents()
    }

    /// Control lines that the next [`Cpu::step`] will apply.
    pub fn control(&self) -> ControlLines {
        ControlLines::from_byte(self.decode.read())
    }

    /// Decoded IR, `None` for reserved nibbles.
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_byte(self.ir.read())
    }

    pub fn state(&self) -> CpuState {
        CpuState {
            cycles: self.cycles,
            pc: self.pc(),
            ir: self.ir(),
            ar: self.ar(),
            x: self.x(),
            useq: self.useq(),
            control: self.control(),
            opcode: self.opcode(),
        }
    }
}

/// Errors from building a [`Cpu`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("ROM image must be 256 bytes, got {0}")]
    RomSize(usize),

    #[error("decode table must be 256 bytes, got {0}")]
    DecodeTableSize(usize),
}

/// Errors from the run helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("stop condition not reached within {limit} cycles")]
    CycleLimit { limit: u64 },
}
