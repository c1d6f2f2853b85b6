//! Output helpers.
//!
//! - consumption CSV export (`export`)

pub mod export;

pub use export::*;
