//! The engine boundary consumed by the windowing shell.
//!
//! A [`Session`] owns one loaded byte buffer and everything derived from it.
//! The shell feeds it buffers, display settings, and pointer positions, pulls
//! position/colour arrays for its draw call, and subscribes to typed events
//! for its labels. All heavy work is funnelled through the generation-tagged
//! recompute worker so pointer handling stays cheap and synchronous.

use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use tracing::{debug, info};

use crate::curve::{warm_luts, CurveKind};
use crate::error::Result;
use crate::metrics::{buffer_entropy, ColourMode};
use crate::util::color::Rgba;

use super::events::EngineEvent;
use super::render::{Frame, Point2, RenderBuffer};
use super::viewport::Viewport;
use super::worker::{compute_frame, spawn_recompute, CancelToken, FrameParams, WorkerMsg};

/// Visible-cell count up to which a rebuild runs inline instead of on the
/// worker thread.
const INLINE_RECOMPUTE_CELLS: u64 = 1 << 16;

/// Base hover-region size in bytes at one pixel per cell; shrinks as the
/// zoom gets finer.
const HOVER_REGION_BASE: u32 = 256;

/// Whole-buffer facts for the shell's summary labels.
#[derive(Clone, Debug, PartialEq)]
pub struct BufferSummary {
    /// Buffer length in bytes.
    pub len: u64,
    /// Shannon entropy of the whole buffer, in bits (0-8).
    pub entropy_bits: f64,
}

/// One loaded buffer and its presentation state.
pub struct Session {
    data: Option<Arc<[u8]>>,
    viewport: Viewport,
    render: RenderBuffer,
    summary: Option<BufferSummary>,
    hover: Option<u64>,
    generation: u64,
    inflight: Option<CancelToken>,
    worker_tx: Sender<WorkerMsg>,
    worker_rx: Receiver<WorkerMsg>,
    subscribers: Vec<Sender<EngineEvent>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session with no buffer loaded.
    pub fn new() -> Self {
        warm_luts();
        let (worker_tx, worker_rx) = mpsc::channel();
        Self {
            data: None,
            viewport: Viewport::new(),
            render: RenderBuffer::default(),
            summary: None,
            hover: None,
            generation: 0,
            inflight: None,
            worker_tx,
            worker_rx,
            subscribers: Vec::new(),
        }
    }

    // =========================================================================
    // Buffer lifecycle
    // =========================================================================

    /// Load (or reload) a byte buffer, replacing any previous one wholesale.
    ///
    /// Resets hover, scroll, and zoom; curve kind and colour mode are display
    /// preferences and survive. An in-flight recompute against the old buffer
    /// is cancelled and its result discarded.
    pub fn load_buffer(&mut self, bytes: impl Into<Arc<[u8]>>) {
        let data: Arc<[u8]> = bytes.into();
        let len = data.len() as u64;
        let entropy_bits = buffer_entropy(&data);
        info!(len, entropy_bits, "buffer loaded");

        self.summary = Some(BufferSummary { len, entropy_bits });
        self.data = Some(data);
        self.set_hover(None);
        self.viewport.attach_buffer(len);
        self.viewport.clear_state();
        self.emit(EngineEvent::Invalidated);
        self.schedule_rebuild();
    }

    /// Drop the loaded buffer, cancelling any in-flight recompute.
    pub fn unload_buffer(&mut self) {
        self.data = None;
        self.summary = None;
        self.set_hover(None);
        self.viewport.attach_buffer(0);
        self.emit(EngineEvent::Invalidated);
        self.schedule_rebuild();
    }

    /// Summary facts for the loaded buffer, if any.
    pub fn summary(&self) -> Option<&BufferSummary> {
        self.summary.as_ref()
    }

    // =========================================================================
    // Display settings
    // =========================================================================

    /// Select the curve family.
    pub fn set_curve_kind(&mut self, kind: CurveKind) {
        if self.viewport.curve_kind() == kind {
            return;
        }
        self.viewport.set_curve_kind(kind);
        self.emit(EngineEvent::Invalidated);
        self.schedule_rebuild();
    }

    /// Select the colour metric.
    pub fn set_colour_mode(&mut self, mode: ColourMode) {
        if self.viewport.colour_mode() == mode {
            return;
        }
        self.viewport.set_colour_mode(mode);
        self.emit(EngineEvent::Invalidated);
        self.schedule_rebuild();
    }

    /// Set the zoom level. On rejection nothing changes and the previous
    /// arrays stay valid.
    pub fn set_zoom_level(&mut self, zoom_level: i32) -> Result<()> {
        self.viewport.set_zoom_level(zoom_level)?;
        self.emit(EngineEvent::Invalidated);
        self.schedule_rebuild();
        Ok(())
    }

    /// Step one zoom level in. Returns whether the level changed.
    pub fn zoom_in(&mut self) -> bool {
        let target = self.viewport.zoom_level() + 1;
        self.viewport.is_valid_zoom_level(target) && self.set_zoom_level(target).is_ok()
    }

    /// Step one zoom level out. Returns whether the level changed.
    pub fn zoom_out(&mut self) -> bool {
        let target = self.viewport.zoom_level() - 1;
        self.viewport.is_valid_zoom_level(target) && self.set_zoom_level(target).is_ok()
    }

    /// Set the normalized scroll position. Only triggers a rebuild when the
    /// visible row window actually moves; colours stay keyed by offset.
    pub fn set_scroll_position(&mut self, position: f32) {
        let before = self.viewport.visible_row_range();
        self.viewport.set_scroll_position(position);
        if self.viewport.visible_row_range() != before {
            self.emit(EngineEvent::Invalidated);
            self.schedule_rebuild();
        }
    }

    /// Resize the drawing area in device pixels.
    pub fn set_view_size(&mut self, width: u32, height: u32) {
        self.viewport.set_view_size(width, height);
        self.emit(EngineEvent::Invalidated);
        self.schedule_rebuild();
    }

    /// Read access to the viewport state.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    // =========================================================================
    // Pointer handling
    // =========================================================================

    /// Resolve a pointer position to the byte offset under it, updating the
    /// hover state. Cheap and synchronous; never waits for the worker.
    pub fn on_pointer_moved(&mut self, px: f32, py: f32) -> Option<u64> {
        let offset = if self.data.is_some() {
            self.viewport.resolve_pixel_to_offset(px, py)
        } else {
            None
        };
        self.set_hover(offset);
        offset
    }

    /// The pointer left the drawing area.
    pub fn on_pointer_exited(&mut self) {
        self.set_hover(None);
    }

    /// Last resolved hover offset, if the pointer is over an occupied cell.
    pub fn hover(&self) -> Option<u64> {
        self.hover
    }

    /// Offset range around the hovered byte for the address-range label.
    /// Coarser zoom levels hover a wider region.
    pub fn hovered_region(&self) -> Option<Range<u64>> {
        self.hover.map(|offset| self.region_around(offset))
    }

    fn region_around(&self, offset: u64) -> Range<u64> {
        let len = self.data.as_ref().map_or(0, |d| d.len() as u64);
        let size = u64::from((HOVER_REGION_BASE / self.viewport.point_size()).max(1));
        let start = offset.saturating_sub(size / 2);
        let end = (start + size).min(len);
        start..end
    }

    fn set_hover(&mut self, offset: Option<u64>) {
        if self.hover == offset {
            return;
        }
        self.hover = offset;
        let region = offset.map(|o| self.region_around(o));
        self.emit(EngineEvent::HoverChanged { offset, region });
    }

    // =========================================================================
    // Geometry output
    // =========================================================================

    /// Parallel position/colour arrays for the visible range, ordered by
    /// increasing offset. Stable between state changes.
    pub fn current_geometry_and_colour(&self) -> (&[Point2], &[Rgba]) {
        (self.render.positions(), self.render.colours())
    }

    /// The committed render arrays, including the visible offsets.
    pub fn render(&self) -> &RenderBuffer {
        &self.render
    }

    /// Whether a background recompute is still in flight.
    pub fn is_recomputing(&self) -> bool {
        self.inflight.is_some()
    }

    // =========================================================================
    // Events and polling
    // =========================================================================

    /// Subscribe to engine events. Disconnected receivers are pruned on the
    /// next emission.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Drain worker messages, committing at most the current generation.
    /// Returns whether a new frame was committed (the shell repaints then).
    ///
    /// Call once per shell frame tick.
    pub fn poll(&mut self) -> bool {
        let mut committed = false;
        while let Ok(msg) = self.worker_rx.try_recv() {
            match msg {
                WorkerMsg::Progress { generation, fraction } => {
                    if generation == self.generation {
                        self.emit(EngineEvent::RecomputeProgress { fraction });
                    }
                }
                WorkerMsg::Completed(frame) => {
                    if frame.generation == self.generation {
                        self.commit(frame);
                        committed = true;
                    } else {
                        debug!(
                            stale = frame.generation,
                            current = self.generation,
                            "discarding stale frame"
                        );
                    }
                }
            }
        }
        committed
    }

    fn commit(&mut self, frame: Frame) {
        let generation = frame.generation;
        self.render.commit(frame);
        self.inflight = None;
        self.emit(EngineEvent::FrameReady { generation });
    }

    fn emit(&mut self, event: EngineEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // =========================================================================
    // Recompute scheduling
    // =========================================================================

    /// Start a new recompute generation, superseding any in-flight one.
    fn schedule_rebuild(&mut self) {
        self.generation += 1;
        if let Some(token) = self.inflight.take() {
            token.cancel();
        }

        let Some(data) = self.data.clone() else {
            self.commit(Frame::empty(self.generation));
            return;
        };
        if self.viewport.layout().is_empty() {
            self.commit(Frame::empty(self.generation));
            return;
        }

        let row_range = self.viewport.visible_row_range();
        let params = FrameParams {
            generation: self.generation,
            data,
            layout: self.viewport.layout().clone(),
            colour_mode: self.viewport.colour_mode(),
            point_size: self.viewport.point_size(),
            row_range: row_range.clone(),
        };

        let visible_cells = (row_range.end - row_range.start) * self.viewport.cells_per_row();
        if visible_cells <= INLINE_RECOMPUTE_CELLS {
            // Small windows compute faster than a thread handoff. A fresh
            // token is never cancelled, so the frame always materializes.
            if let Some(frame) = compute_frame(&params, &CancelToken::new(), &mut |_| {}) {
                self.commit(frame);
            }
        } else {
            debug!(
                generation = self.generation,
                visible_cells, "scheduling background recompute"
            );
            self.inflight = Some(spawn_recompute(params, self.worker_tx.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::viewport::{DEFAULT_ZOOM_LEVEL, MIN_ZOOM_LEVEL};
    use std::time::{Duration, Instant};

    fn drain(rx: &Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn wait_for_frame(session: &mut Session) {
        let deadline = Instant::now() + Duration::from_secs(30);
        while session.is_recomputing() {
            assert!(Instant::now() < deadline, "recompute did not finish in time");
            session.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn load_produces_geometry_for_every_visible_byte() {
        let mut session = Session::new();
        session.set_view_size(64, 64); // 16x16 cells at default zoom
        session.load_buffer(vec![0xABu8; 256]); // exactly one 16x16 chunk

        let render = session.render();
        assert_eq!(render.len(), 256);
        assert_eq!(render.positions().len(), render.colours().len());
        assert!(render.offsets().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn geometry_pull_is_idempotent() {
        let mut session = Session::new();
        session.set_view_size(64, 64);
        session.set_colour_mode(ColourMode::Structural);
        session.load_buffer((0..=255u8).collect::<Vec<_>>());

        let (pos_a, col_a) = {
            let (p, c) = session.current_geometry_and_colour();
            (p.to_vec(), c.to_vec())
        };
        let (pos_b, col_b) = session.current_geometry_and_colour();
        assert_eq!(pos_a.as_slice(), pos_b);
        assert_eq!(col_a.as_slice(), col_b);
    }

    #[test]
    fn reload_resets_transient_state_only() {
        let mut session = Session::new();
        session.set_view_size(256, 256);
        session.set_curve_kind(CurveKind::Zigzag);
        session.set_colour_mode(ColourMode::Structural);
        session.load_buffer(vec![1u8; 5000]);

        session.set_zoom_level(1).unwrap();
        session.set_scroll_position(0.8);
        session.on_pointer_moved(3.0, 3.0);
        assert!(session.hover().is_some());

        session.load_buffer(vec![2u8; 100]);
        let vp = session.viewport();
        assert_eq!(vp.zoom_level(), DEFAULT_ZOOM_LEVEL);
        assert_eq!(vp.scroll_position(), 0.0);
        assert_eq!(vp.curve_kind(), CurveKind::Zigzag);
        assert_eq!(vp.colour_mode(), ColourMode::Structural);
        assert_eq!(session.hover(), None);
    }

    #[test]
    fn invalid_zoom_changes_nothing() {
        let mut session = Session::new();
        session.set_view_size(64, 64);
        session.load_buffer(vec![7u8; 100]);

        let generation_before = session.render().generation();
        let result = session.set_zoom_level(99);
        assert!(result.is_err());
        assert_eq!(session.render().generation(), generation_before);
        assert_eq!(session.viewport().zoom_level(), DEFAULT_ZOOM_LEVEL);
    }

    #[test]
    fn empty_buffer_degrades_to_noop() {
        let mut session = Session::new();
        session.set_view_size(64, 64);
        session.load_buffer(Vec::<u8>::new());

        assert!(session.render().is_empty());
        assert_eq!(session.on_pointer_moved(5.0, 5.0), None);
        assert_eq!(session.summary().unwrap().len, 0);
        assert_eq!(session.summary().unwrap().entropy_bits, 0.0);
    }

    #[test]
    fn unload_clears_everything() {
        let mut session = Session::new();
        session.set_view_size(64, 64);
        session.load_buffer(vec![1u8; 256]);
        assert!(!session.render().is_empty());

        session.unload_buffer();
        assert!(session.render().is_empty());
        assert!(session.summary().is_none());
        assert_eq!(session.on_pointer_moved(5.0, 5.0), None);
    }

    #[test]
    fn zoom_steppers_respect_limits() {
        let mut session = Session::new();
        session.set_view_size(64, 64);
        session.load_buffer(vec![1u8; 256]);

        assert!(session.zoom_in());
        assert_eq!(session.viewport().zoom_level(), DEFAULT_ZOOM_LEVEL + 1);

        // A 64 px view fits one 64 px cell at level 7; level 8 fits none.
        while session.zoom_in() {}
        assert_eq!(session.viewport().zoom_level(), 7);

        while session.zoom_out() {}
        assert_eq!(session.viewport().zoom_level(), MIN_ZOOM_LEVEL);
        assert!(!session.zoom_out());
    }

    #[test]
    fn hover_events_carry_offset_and_region() {
        let mut session = Session::new();
        session.set_view_size(64, 64);
        session.load_buffer(vec![0u8; 256]);
        let rx = session.subscribe();

        let offset = session.on_pointer_moved(10.0, 10.0).expect("inside the chunk");
        let events = drain(&rx);
        let hover = events
            .iter()
            .find_map(|e| match e {
                EngineEvent::HoverChanged { offset, region } => Some((offset, region)),
                _ => None,
            })
            .expect("hover event emitted");
        assert_eq!(*hover.0, Some(offset));
        let region = hover.1.clone().unwrap();
        assert!(region.contains(&offset));

        // Same cell again: no duplicate event.
        session.on_pointer_moved(10.5, 10.5);
        assert!(drain(&rx)
            .iter()
            .all(|e| !matches!(e, EngineEvent::HoverChanged { .. })));

        session.on_pointer_exited();
        let events = drain(&rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::HoverChanged { offset: None, .. })));
        assert_eq!(session.hover(), None);
    }

    #[test]
    fn hover_region_shrinks_with_finer_zoom() {
        let mut session = Session::new();
        session.set_view_size(512, 512);
        session.load_buffer(vec![0u8; 1 << 16]);

        session.set_zoom_level(1).unwrap(); // 1 px cells
        session.on_pointer_moved(100.0, 100.0).unwrap();
        let coarse = session.hovered_region().unwrap();

        session.set_zoom_level(4).unwrap(); // 8 px cells
        session.on_pointer_moved(100.0, 100.0).unwrap();
        let fine = session.hovered_region().unwrap();

        assert!(coarse.end - coarse.start > fine.end - fine.start);
    }

    #[test]
    fn summary_reports_whole_buffer_entropy() {
        let mut session = Session::new();
        session.set_view_size(64, 64);
        session.load_buffer((0..=255u8).collect::<Vec<_>>());

        let summary = session.summary().unwrap();
        assert_eq!(summary.len, 256);
        assert!((summary.entropy_bits - 8.0).abs() < 1e-12);
    }

    #[test]
    fn background_recompute_commits_current_generation() {
        let mut session = Session::new();
        session.set_view_size(1024, 1024);
        session.set_colour_mode(ColourMode::Structural);
        session.load_buffer(vec![0x55u8; 1 << 20]);
        session.set_zoom_level(1).unwrap(); // 1 Mi visible cells: background path
        assert!(session.is_recomputing());

        wait_for_frame(&mut session);
        assert!(!session.render().is_empty());
    }

    #[test]
    fn superseded_generation_never_publishes() {
        let mut session = Session::new();
        session.set_view_size(1024, 1024);
        session.set_colour_mode(ColourMode::Structural);
        // 4 MiB at 1024 cells per row stacks four 1024x1024 chunks, so only a
        // quarter of the rows fit the view and scrolling has room to move.
        session.load_buffer(vec![0x55u8; 4 << 20]);
        session.set_zoom_level(1).unwrap();
        assert!(session.is_recomputing());

        // Supersede the in-flight job before it can land.
        session.set_scroll_position(1.0);
        let current = session.render().generation();

        wait_for_frame(&mut session);
        let committed = session.render().generation();
        assert!(committed > current, "the superseding generation must land");

        // The committed window reflects the new scroll position.
        let first_row = session.viewport().visible_row_range().start;
        assert!(first_row > 0);
        let expected_first = session.viewport().layout().inverse(0, first_row);
        if let Some(expected) = expected_first {
            assert!(session.render().offsets().contains(&expected));
        }
    }
}
