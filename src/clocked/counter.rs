//! 8-bit synchronous counter.

use super::Clocked;
use serde::{Deserialize, Serialize};

/// An 8-bit counter with load and increment enables.
///
/// Load wins over increment. Increment wraps from 255 to 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    value: u8,
    #[serde(skip)]
    next: Option<u8>,
}

impl Counter {
    /// Create a counter at zero.
    pub const fn new() -> Self {
        Self { value: 0, next: None }
    }

    /// Create a counter holding `value`.
    pub const fn with_value(value: u8) -> Self {
        Self { value, next: None }
    }

    /// Value as of the last clock edge.
    #[inline]
    pub fn read(&self) -> u8 {
        self.value
    }

    /// Stage the next value from the load and increment enables.
    pub fn advance(&mut self, load: bool, incr: bool, input: u8) {
        self.next = if load {
            Some(input)
        } else if incr {
            Some(self.value.wrapping_add(1))
        } else {
            None
        };
    }

    /// Stage a return to zero on the next edge.
    #[inline]
    pub fn reset(&mut self) {
        self.advance(true, false, 0);
    }
}

impl Clocked for Counter {
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
    fn test_increment() {
        let mut ctr = Counter::new();
        for expected in 1..=5 {
            ctr.advance(false, true, 0);
            ctr.commit();
            assert_eq!(ctr.read(), expected);
        }
    }

    #[test]
    fn test_wraparound() {
        let mut ctr = Counter::with_value(255);
        ctr.advance(false, true, 0);
        ctr.commit();
        assert_eq!(ctr.read(), 0);
    }

    #[test]
    fn test_load_beats_increment() {
        let mut ctr = Counter::with_value(3);
        ctr.advance(true, true, 0x10);
        ctr.commit();
        assert_eq!(ctr.read(), 0x10);
    }

    #[test]
    fn test_reset() {
        let mut ctr = Counter::with_value(9);
        ctr.reset();
        assert_eq!(ctr.read(), 9);
        ctr.commit();
        assert_eq!(ctr.read(), 0);
    }

    proptest! {
        #[test]
        fn prop_counter_next_value(start: u8, input: u8, load: bool, incr: bool) {
            let mut ctr = Counter::with_value(start);
            ctr.advance(load, incr, input);
            ctr.commit();
            let expected = match (load, incr) {
                (true, _) => input,
                (false, true) => start.wrapping_add(1),
                (false, false) => start,
            };
            prop_assert_eq!(ctr.read(), expected);
        }
    }
}
