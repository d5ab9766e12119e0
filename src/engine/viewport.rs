//! Viewport state: zoom, scroll, and pixel-to-offset resolution.
//!
//! The viewport owns the derived [`ChunkLayout`] and is the only component
//! that knows about device pixels. Layout derivation is cheap and happens
//! synchronously on every zoom/size/kind change; the expensive per-offset
//! work lives in the recompute worker.

use std::ops::Range;

use tracing::warn;

use crate::curve::{ChunkLayout, CurveKind, MAX_ORDER};
use crate::error::{EngineError, Result};
use crate::metrics::ColourMode;

/// Smallest accepted zoom level: one pixel per byte cell.
pub const MIN_ZOOM_LEVEL: i32 = 1;

/// Largest accepted zoom level: `2^(12-1)` = 2048 pixels per byte cell.
pub const MAX_ZOOM_LEVEL: i32 = 12;

/// Zoom level applied on creation and after [`Viewport::clear_state`].
pub const DEFAULT_ZOOM_LEVEL: i32 = 3;

/// Presentation-facing viewport over the chunked curve stack.
#[derive(Debug, Clone)]
pub struct Viewport {
    curve_kind: CurveKind,
    colour_mode: ColourMode,
    zoom_level: i32,
    scroll_position: f32,
    view_width: u32,
    view_height: u32,
    buffer_len: u64,
    layout: ChunkLayout,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            curve_kind: CurveKind::default(),
            colour_mode: ColourMode::default(),
            zoom_level: DEFAULT_ZOOM_LEVEL,
            scroll_position: 0.0,
            view_width: 0,
            view_height: 0,
            buffer_len: 0,
            layout: ChunkLayout::default(),
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Side length of one byte cell in device pixels at the current zoom.
    #[inline]
    pub fn point_size(&self) -> u32 {
        1u32 << (self.zoom_level - 1)
    }

    /// Cells that fit across the view at the current zoom.
    #[inline]
    pub fn cells_per_row(&self) -> u64 {
        u64::from(self.view_width / self.point_size())
    }

    /// Rows that fit down the view at the current zoom.
    #[inline]
    pub fn visible_rows(&self) -> u64 {
        u64::from(self.view_height / self.point_size())
    }

    /// Whether `zoom_level` would be accepted by [`set_zoom_level`].
    ///
    /// Rejects levels outside the supported range, levels too coarse to fit
    /// a single cell across the view, and levels whose derived curve order
    /// would exceed [`MAX_ORDER`]. Pure: never mutates state.
    ///
    /// [`set_zoom_level`]: Self::set_zoom_level
    pub fn is_valid_zoom_level(&self, zoom_level: i32) -> bool {
        if !(MIN_ZOOM_LEVEL..=MAX_ZOOM_LEVEL).contains(&zoom_level) {
            return false;
        }
        let point = 1u32 << (zoom_level - 1);
        let cells = u64::from(self.view_width / point);
        if cells == 0 {
            return false;
        }
        let order = 63 - u64::leading_zeros(cells);
        order <= MAX_ORDER
    }

    /// Set the zoom level, rederiving the layout on success.
    ///
    /// On failure the viewport is left untouched and the caller gets
    /// [`EngineError::InvalidZoomLevel`].
    pub fn set_zoom_level(&mut self, zoom_level: i32) -> Result<()> {
        if !self.is_valid_zoom_level(zoom_level) {
            warn!(zoom_level, "rejecting out-of-range zoom level");
            return Err(EngineError::InvalidZoomLevel(zoom_level));
        }
        self.zoom_level = zoom_level;
        self.rebuild_layout();
        Ok(())
    }

    /// Current zoom level.
    pub fn zoom_level(&self) -> i32 {
        self.zoom_level
    }

    /// Set the normalized scroll position, clamped to `[0, 1]`.
    ///
    /// Scrolling shifts which rows are visible; it does not rederive the
    /// layout and never changes the colour of any given offset.
    pub fn set_scroll_position(&mut self, position: f32) {
        self.scroll_position = if position.is_nan() { 0.0 } else { position.clamp(0.0, 1.0) };
    }

    /// Current normalized scroll position.
    pub fn scroll_position(&self) -> f32 {
        self.scroll_position
    }

    /// Select the curve kind and rederive the layout.
    pub fn set_curve_kind(&mut self, kind: CurveKind) {
        self.curve_kind = kind;
        self.rebuild_layout();
    }

    pub fn curve_kind(&self) -> CurveKind {
        self.curve_kind
    }

    /// Select the colour mode. Layout is unaffected.
    pub fn set_colour_mode(&mut self, mode: ColourMode) {
        self.colour_mode = mode;
    }

    pub fn colour_mode(&self) -> ColourMode {
        self.colour_mode
    }

    /// Resize the drawing area in device pixels and rederive the layout.
    pub fn set_view_size(&mut self, width: u32, height: u32) {
        self.view_width = width;
        self.view_height = height;
        self.rebuild_layout();
    }

    /// Attach a buffer of the given length and rederive the layout.
    pub fn attach_buffer(&mut self, len: u64) {
        self.buffer_len = len;
        self.rebuild_layout();
    }

    /// Reset scroll and zoom to their defaults, keeping curve kind and
    /// colour mode (display preferences, not per-file state).
    pub fn clear_state(&mut self) {
        self.zoom_level = DEFAULT_ZOOM_LEVEL;
        self.scroll_position = 0.0;
        self.rebuild_layout();
    }

    /// Derived chunk layout for the current buffer/zoom/kind.
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    fn rebuild_layout(&mut self) {
        self.layout = ChunkLayout::build(self.curve_kind, self.buffer_len, self.cells_per_row());
    }

    /// First absolute row in the visible window at the current scroll.
    pub fn first_visible_row(&self) -> u64 {
        let scrollable = self.layout.total_rows().saturating_sub(self.visible_rows());
        (self.scroll_position as f64 * scrollable as f64).round() as u64
    }

    /// Absolute rows currently inside the viewport window.
    pub fn visible_row_range(&self) -> Range<u64> {
        let first = self.first_visible_row();
        let last = (first + self.visible_rows()).min(self.layout.total_rows());
        first..last.max(first)
    }

    /// Resolve a device pixel to the absolute byte offset under it.
    ///
    /// Returns `None` (the invalid sentinel) for pixels outside the view,
    /// outside every chunk's occupied cells, or past the final byte of the
    /// trailing chunk. Synchronous and never blocked by recomputation.
    pub fn resolve_pixel_to_offset(&self, px: f32, py: f32) -> Option<u64> {
        if px < 0.0 || py < 0.0 || !px.is_finite() || !py.is_finite() {
            return None;
        }
        if px >= self.view_width as f32 || py >= self.view_height as f32 {
            return None;
        }

        let point = f64::from(self.point_size());
        let col = (f64::from(px) / point) as u64;
        let view_row = (f64::from(py) / point) as u64;
        if view_row >= self.visible_rows() {
            return None;
        }

        let row = self.first_visible_row() + view_row;
        let offset = self.layout.inverse(col, row)?;
        debug_assert!(offset < self.buffer_len);
        Some(offset)
    }
}
