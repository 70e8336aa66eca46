//! 8-bit synchronous register.

use super::Clocked;
use serde::{Deserialize, Serialize};

/// An 8-bit register with a load enable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    value: u8,
    #[serde(skip)]
    next: Option<u8>,
}

impl Register {
    /// Create a register holding zero.
    pub const fn new() -> Self {
        Self { value: 0, next: None }
    }

    /// Create a register holding `value`.
    pub const fn with_value(value: u8) -> Self {
        Self { value, next: None }
    }

    /// Value as of the last clock edge.
    #[inline]
    pub fn read(&self) -> u8 {
        self.value
    }

    /// Stage the next value. With `load` low the register holds.
    #[inline]
    pub fn advance(&mut self, load: bool, input: u8) {
        self.next = load.then_some(input);
    }
}

impl Clocked for Register {
    fn commit(&mut self) {
        if let Some(next) = self.next.take() {
            self.value = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_load_visible_after_commit() {
        let mut reg = Register::new();
        reg.advance(true, 0x42);
        assert_eq!(reg.read(), 0);

        reg.commit();
        assert_eq!(reg.read(), 0x42);
    }

    #[test]
    fn test_hold_when_not_loaded() {
        let mut reg = Register::with_value(7);
        reg.advance(false, 0xFF);
        reg.commit();
        assert_eq!(reg.read(), 7);

        // No advance at all also holds
        reg.commit();
        assert_eq!(reg.read(), 7);
    }

    proptest! {
        #[test]
        fn prop_register_follows_load(start: u8, input: u8, load: bool) {
            let mut reg = Register::with_value(start);
            reg.advance(load, input);
            prop_assert_eq!(reg.read(), start);
            reg.commit();
            prop_assert_eq!(reg.read(), if load { input } else { start });
        }
    }
}
