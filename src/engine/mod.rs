//! Pure decision logic for the wheel: no I/O, all inputs passed in.

pub mod prize_selector;
pub mod spin_policy;

pub use prize_selector::*;
pub use spin_policy::*;
