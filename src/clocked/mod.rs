//! Clocked storage primitives.
//!
//! Every element here follows the same two-phase discipline:
//! - `advance()` stages the value the element will hold after the next
//!   clock edge, computed only from values that are stable this cycle
//! - [`Clocked::commit`] is the clock edge itself and publishes the staged value
//!
//! Reads always return the value as of the last committed edge, so the order
//! in which elements are advanced inside a cycle can never be observed.

mod counter;
mod memory;
mod register;

pub use counter::Counter;
pub use memory::{Memory, MEMORY_SIZE};
pub use register::Register;

/// An element that changes state only on a clock edge.
pub trait Clocked {
    /// Apply the value staged by the last `advance()`.
    ///
    /// An element that was not advanced during the cycle holds its value.
    fn commit(&mut self);
}
