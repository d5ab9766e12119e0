//! Space-filling curve mappings between byte offsets and 2D coordinates.
//!
//! This module provides:
//! - Hilbert curve forward/inverse transforms (locality preserving)
//! - Zigzag (boustrophedon) forward/inverse transforms
//! - Chunk layout derivation for buffers of arbitrary length

pub mod hilbert;
pub mod layout;
pub mod zigzag;

pub use hilbert::{hilbert_forward, hilbert_inverse, warm_luts, MAX_ORDER};
pub use layout::{hilbert_chunk_width, Chunk, ChunkLayout};
pub use zigzag::{zigzag_forward, zigzag_inverse};

/// Curve family used to arrange byte offsets on the plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CurveKind {
    /// No geometry at all; the drawing area stays empty.
    Blank,
    /// Chunked Hilbert curve (default): neighbouring offsets stay
    /// neighbouring points.
    #[default]
    Hilbert,
    /// Row-by-row raster scan, alternating direction per row.
    Zigzag,
}

impl CurveKind {
    /// Display name for the curve kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blank => "Blank",
            Self::Hilbert => "Hilbert",
            Self::Zigzag => "Zigzag",
        }
    }

    /// All selectable curve kinds.
    pub fn all() -> &'static [Self] {
        &[Self::Blank, Self::Hilbert, Self::Zigzag]
    }
}
