//! Shared utilities

pub mod color;

pub use color::{ColorParser, PRESET_COLORS};
