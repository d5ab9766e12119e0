//! Per-offset colour metrics.
//!
//! Every metric is a pure function of `(mode, buffer contents, offset)`:
//! there is no hidden state, so recomputation is always safe and results are
//! reproducible for testing.

pub mod entropy;
pub mod random;
pub mod similarity;
pub mod structural;

pub use entropy::{buffer_entropy, window_entropy, ENTROPY_WINDOW};
pub use structural::{classify, ByteClass};

use crate::util::color::{self, entropy_ramp, Rgba};

/// Property of each byte that drives its colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColourMode {
    /// Constant colour; only the curve geometry is of interest.
    Blank,
    /// Similarity to the preceding byte.
    Similarity,
    /// Windowed Shannon entropy.
    #[default]
    Entropy,
    /// Structural byte class (NUL, printable, whitespace, control, high-bit).
    Structural,
    /// Seeded pseudo-random colour per offset, for density debugging.
    Random,
}

impl ColourMode {
    /// Display name for the mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blank => "Blank",
            Self::Similarity => "Similarity",
            Self::Entropy => "Entropy",
            Self::Structural => "Structural",
            Self::Random => "Random",
        }
    }

    /// All selectable colour modes.
    pub fn all() -> &'static [Self] {
        &[
            Self::Blank,
            Self::Similarity,
            Self::Entropy,
            Self::Structural,
            Self::Random,
        ]
    }
}

/// Colour for the byte at `offset` under the given mode.
///
/// `offset` must lie inside the buffer; callers iterate the visible range
/// which is already bounds-checked against the layout.
#[inline]
pub fn colour_for(mode: ColourMode, data: &[u8], offset: u64) -> Rgba {
    match mode {
        ColourMode::Blank => color::BLANK,
        ColourMode::Similarity => similarity::colour(data, offset as usize),
        ColourMode::Entropy => entropy_ramp(window_entropy(data, offset as usize) as f32),
        ColourMode::Structural => classify(data[offset as usize]).colour(),
        ColourMode::Random => random::colour(offset),
    }
}

/// Colour with a reusable entropy histogram buffer, for the bulk loop.
///
/// Identical results to [`colour_for`]; only the allocation behavior differs.
#[inline]
pub fn colour_for_with_scratch(
    mode: ColourMode,
    data: &[u8],
    offset: u64,
    scratch: &mut [u32; 256],
) -> Rgba {
    match mode {
        ColourMode::Entropy => {
            let h = entropy::window_entropy_with_buffer(data, offset as usize, scratch);
            entropy_ramp(h as f32)
        }
        _ => colour_for(mode, data, offset),
    }
}
