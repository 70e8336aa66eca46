//! 256 × 8-bit synchronous memory.
//!
//! The read port is registered: the address presented during a cycle is
//! latched at the clock edge, and the cell it selected only appears on
//! [`Memory::read`] during the following cycle. A write and a read of the
//! same cell in one cycle return the old contents.

use super::Clocked;
use serde::{Deserialize, Serialize};

/// The number of cells in a memory.
pub const MEMORY_SIZE: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Staged {
    latch: u8,
    write: Option<(u8, u8)>,
}

/// A 256-cell memory with one cycle of read latency.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MemoryImage")]
pub struct Memory {
    cells: Vec<u8>,
    output: u8,
    #[serde(skip)]
    staged: Option<Staged>,
}

impl Memory {
    /// Create a memory with all cells and the output latch zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
            output: 0,
            staged: None,
        }
    }

    /// Create a memory from an image of exactly [`MEMORY_SIZE`] bytes.
    ///
    /// Returns `None` for any other length.
    pub fn from_image(image: &[u8]) -> Option<Self> {
        if image.len() != MEMORY_SIZE {
            return None;
        }
        Some(Self {
            cells: image.to_vec(),
            output: 0,
            staged: None,
        })
    }

    /// The registered output: the cell addressed during the previous cycle.
    #[inline]
    pub fn read(&self) -> u8 {
        self.output
    }

    /// Present `address` for this cycle and optionally write `data` to it.
    ///
    /// The latched output is taken from the cell before the write lands.
    pub fn advance(&mut self, write_enable: bool, address: u8, data: u8) {
        self.staged = Some(Staged {
            latch: self.cells[address as usize],
            write: write_enable.then_some((address, data)),
        });
    }

    /// Look at a cell without going through the clocked read port.
    ///
    /// Used for tracing and inspection only.
    #[inline]
    pub fn peek(&self, address: u8) -> u8 {
        self.cells[address as usize]
    }

    /// All cells, for dumps.
    pub fn contents(&self) -> &[u8] {
        &self.cells
    }

    /// Non-zero cells in address order (for debugging).
    pub fn non_zero(&self) -> Vec<(u8, u8)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell != 0)
            .map(|(addr, cell)| (addr as u8, *cell))
            .collect()
    }
}

/// Serialized form of a [`Memory`], checked before it becomes one.
#[derive(Deserialize)]
struct MemoryImage {
    cells: Vec<u8>,
    output: u8,
}

impl TryFrom<MemoryImage> for Memory {
    type Error = String;

    fn try_from(image: MemoryImage) -> Result<Self, Self::Error> {
        let mut memory = Memory::from_image(&image.cells).ok_or_else(|| {
            format!("memory image must be {} bytes, got {}", MEMORY_SIZE, image.cells.len())
        })?;
        memory.output = image.output;
        Ok(memory)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Clocked for Memory {
    fn commit(&mut self) {
        if let Some(staged) = self.staged.take() {
            self.output = staged.latch;
            if let Some((address, data)) = staged.write {
                self.cells[address as usize] = data;
            }
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("non_zero_cells", &self.non_zero().len())
            .field("total_cells", &MEMORY_SIZE)
            .field("output", &format_args!("{:02X}", self.output))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn image() -> Vec<u8> {
        (0..MEMORY_SIZE).map(|i| (i as u8).wrapping_mul(7)).collect()
    }

    #[test]
    fn test_from_image_rejects_wrong_size() {
        assert!(Memory::from_image(&[0; 255]).is_none());
        assert!(Memory::from_image(&[0; 257]).is_none());
        assert!(Memory::from_image(&[0; MEMORY_SIZE]).is_some());
    }

    #[test]
    fn test_read_is_one_cycle_late() {
        let mut mem = Memory::from_image(&image()).unwrap();

        mem.advance(false, 10, 0);
        // Nothing latched yet
        assert_eq!(mem.read(), 0);
        mem.commit();
        assert_eq!(mem.read(), 70);

        mem.advance(false, 11, 0);
        // Still showing address 10 until the edge
        assert_eq!(mem.read(), 70);
        mem.commit();
        assert_eq!(mem.read(), 77);
    }

    #[test]
    fn test_read_before_write() {
        let mut mem = Memory::new();
        mem.advance(true, 0x40, 0x23);
        mem.commit();
        // Output latched the old contents of the written cell
        assert_eq!(mem.read(), 0);
        assert_eq!(mem.peek(0x40), 0x23);

        mem.advance(false, 0x40, 0);
        mem.commit();
        assert_eq!(mem.read(), 0x23);
    }

    #[test]
    fn test_output_holds_without_advance() {
        let mut mem = Memory::from_image(&image()).unwrap();
        mem.advance(false, 3, 0);
        mem.commit();
        mem.commit();
        assert_eq!(mem.read(), 21);
    }

    #[test]
    fn test_deserialize_checks_size() {
        let mut mem = Memory::from_image(&image()).unwrap();
        mem.advance(false, 5, 0);
        mem.commit();

        let json = serde_json::to_string(&mem).unwrap();
        let back: Memory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mem);
        assert_eq!(back.read(), 35);

        let err = serde_json::from_str::<Memory>(r#"{"cells":[1,2],"output":0}"#).unwrap_err();
        assert!(err.to_string().contains("256 bytes, got 2"));
    }

    proptest! {
        #[test]
        fn prop_read_reflects_previous_address(addrs in proptest::collection::vec(any::<u8>(), 2..32)) {
            let img = image();
            let mut mem = Memory::from_image(&img).unwrap();
            let mut previous: Option<u8> = None;
            for addr in addrs {
                if let Some(prev) = previous {
                    prop_assert_eq!(mem.read(), img[prev as usize]);
                }
                mem.advance(false, addr, 0);
                mem.commit();
                previous = Some(addr);
            }
        }

        #[test]
        fn prop_write_lands_at_edge(addr: u8, data: u8) {
            let mut mem = Memory::new();
            mem.advance(true, addr, data);
            prop_assert_eq!(mem.peek(addr), 0);
            mem.commit();
            prop_assert_eq!(mem.peek(addr), data);
        }
    }
}
