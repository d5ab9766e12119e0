//! Typed events pushed across the engine boundary.
//!
//! The shell subscribes with [`Session::subscribe`](super::Session::subscribe)
//! and receives these over a plain channel; there is no delegate protocol or
//! inheritance involved.

use std::ops::Range;

/// Notification emitted by a [`Session`](super::Session).
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// The hovered byte changed. `None` means the pointer left every
    /// occupied cell (the invalid sentinel). `region` is the surrounding
    /// offset range shown in the address-range label.
    HoverChanged {
        offset: Option<u64>,
        region: Option<Range<u64>>,
    },
    /// Geometry and/or colours were invalidated; a recompute is underway and
    /// the current arrays remain valid until a new frame commits.
    Invalidated,
    /// Progress of the in-flight background recompute, 0.0-1.0.
    RecomputeProgress { fraction: f32 },
    /// A recompute generation committed; the pull interface now returns the
    /// new arrays.
    FrameReady { generation: u64 },
}
