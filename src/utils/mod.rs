//! Output helpers shared by the binary

pub mod display;

pub use display::{Color, ColorOutput, RecordFormatter};
