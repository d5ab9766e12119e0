//! Shared utility functions.

pub mod color;
pub mod format;

pub use color::{hsv_to_rgba, Rgba};
pub use format::{format_address, format_address_range, format_bytes};
