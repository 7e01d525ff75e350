//! Pure data shapes used inside the sandbox boundary: the contract-wrapping
//! template, name validation, and the logs accumulator.

pub mod logs;
pub mod validation;
pub mod wrapping;

pub use logs::{Event, Logs};
