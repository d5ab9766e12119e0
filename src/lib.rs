//! Chorograph - space-filling-curve cartography engine for raw byte buffers.
//!
//! This library maps every byte offset of an opaque buffer onto a 2D point via
//! a space-filling curve and colours that point by a per-byte property:
//! - Hilbert and zigzag (boustrophedon) curve mappings, chunked for buffers of
//!   arbitrary (non-power-of-two) length
//! - Per-byte colour metrics: neighbour similarity, windowed Shannon entropy,
//!   structural byte classification, seeded pseudo-random
//! - A viewport model (zoom, scroll, pixel-to-offset hover resolution)
//! - Background recomputation of the visible position/colour arrays
//!
//! The windowing shell, file loading, and GPU submission live outside this
//! crate: bytes arrive as an opaque buffer, and geometry leaves as parallel
//! position/colour arrays ready for a draw call.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

pub mod curve;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod util;

pub use curve::{CurveKind, MAX_ORDER};
pub use engine::{BufferSummary, EngineEvent, Point2, RenderBuffer, Session, Viewport};
pub use error::{EngineError, Result};
pub use metrics::ColourMode;
pub use util::color::Rgba;
