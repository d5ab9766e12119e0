//! Committed position/colour arrays for the visible byte range.
//!
//! A [`Frame`] is produced off to the side (inline or on the worker thread)
//! and swapped into the [`RenderBuffer`] as a unit; the draw call never
//! observes a mix of two generations.

use bytemuck::{Pod, Zeroable};

use crate::util::color::Rgba;

/// Device-independent point position, centred in its byte cell, relative to
/// the viewport origin. `repr(C)` + `Pod` so the external renderer can
/// reinterpret the array as raw vertex data.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

/// One fully computed generation of visible geometry and colour.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Generation counter this frame was computed for.
    pub generation: u64,
    /// Absolute byte offsets, strictly increasing.
    pub offsets: Vec<u64>,
    /// Point positions, parallel to `offsets`.
    pub positions: Vec<Point2>,
    /// Point colours, parallel to `offsets`.
    pub colours: Vec<Rgba>,
}

impl Frame {
    /// Empty frame for the given generation.
    pub fn empty(generation: u64) -> Self {
        Self { generation, ..Self::default() }
    }
}

/// Double-buffered view of the last committed frame.
#[derive(Debug, Default)]
pub struct RenderBuffer {
    frame: Frame,
}

impl RenderBuffer {
    /// Replace the committed arrays wholesale.
    pub(crate) fn commit(&mut self, frame: Frame) {
        debug_assert_eq!(frame.offsets.len(), frame.positions.len());
        debug_assert_eq!(frame.offsets.len(), frame.colours.len());
        self.frame = frame;
    }

    /// Generation of the committed frame.
    pub fn generation(&self) -> u64 {
        self.frame.generation
    }

    /// Number of visible points.
    pub fn len(&self) -> usize {
        self.frame.offsets.len()
    }

    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.frame.offsets.is_empty()
    }

    /// Absolute byte offsets of the visible points, strictly increasing.
    pub fn offsets(&self) -> &[u64] {
        &self.frame.offsets
    }

    /// Positions of the visible points, parallel to `offsets`.
    pub fn positions(&self) -> &[Point2] {
        &self.frame.positions
    }

    /// Colours of the visible points, parallel to `offsets`.
    pub fn colours(&self) -> &[Rgba] {
        &self.frame.colours
    }
}
