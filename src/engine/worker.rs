//! Off-thread recomputation of the visible position/colour arrays.
//!
//! One recompute runs per session at a time. Every trigger bumps the
//! session's generation and cancels the previous job through an atomic
//! token; a cancelled job exits between bands and never publishes anything.
//! Completed frames travel back over a channel and are committed (or
//! discarded as stale) by [`Session::poll`](super::Session::poll).

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use rayon::prelude::*;
use tracing::debug;

use crate::curve::{hilbert_forward, zigzag_forward, Chunk, ChunkLayout, CurveKind};
use crate::metrics::{self, ColourMode};
use crate::util::color::Rgba;

use super::render::{Frame, Point2};

/// Offsets processed between cancellation checks and progress reports.
const BAND_SIZE: u64 = 1 << 16;

/// Shared cancellation flag handed to an in-flight recompute.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the job to stop. Irrevocable for that job.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Message from a recompute job back to its session.
#[derive(Debug)]
pub(crate) enum WorkerMsg {
    /// Fraction of the visible range processed so far, 0.0-1.0.
    Progress { generation: u64, fraction: f32 },
    /// The finished frame, published as a single unit.
    Completed(Frame),
}

/// Inputs of one recompute, detached from live session state.
///
/// The job holds its own `Arc` of the byte buffer, so a reload in the
/// session can never mutate memory this job is reading; its stale result is
/// discarded by the generation check on commit.
#[derive(Clone, Debug)]
pub(crate) struct FrameParams {
    pub generation: u64,
    pub data: Arc<[u8]>,
    pub layout: ChunkLayout,
    pub colour_mode: ColourMode,
    pub point_size: u32,
    pub row_range: Range<u64>,
}

#[inline]
fn cell_of(kind: CurveKind, chunk: &Chunk, d: u64) -> (u64, u64) {
    match kind {
        CurveKind::Hilbert => hilbert_forward(chunk.width.trailing_zeros(), d),
        CurveKind::Zigzag => zigzag_forward(chunk.width, d),
        CurveKind::Blank => unreachable!("blank layouts contain no chunks"),
    }
}

/// In-chunk offsets worth scanning for the visible row range.
///
/// Zigzag chunks fill row by row, so only the visible rows need scanning.
/// Hilbert chunks scatter every offset across their square, so the whole
/// chunk is scanned and filtered per offset.
fn scan_range(kind: CurveKind, chunk: &Chunk, rows: &Range<u64>) -> Range<u64> {
    let chunk_rows = chunk.row_origin..chunk.row_origin + chunk.rows;
    if rows.end <= chunk_rows.start || rows.start >= chunk_rows.end {
        return 0..0;
    }
    match kind {
        CurveKind::Zigzag => {
            let first = rows.start.max(chunk_rows.start) - chunk.row_origin;
            let last = rows.end.min(chunk_rows.end) - chunk.row_origin;
            (first * chunk.width).min(chunk.len)..(last * chunk.width).min(chunk.len)
        }
        _ => 0..chunk.len,
    }
}

/// Compute the frame for `params`, checking `cancel` between bands.
///
/// Returns `None` when cancelled; partial results are never exposed.
/// Entries come out ordered by increasing absolute offset, and the three
/// output arrays always have equal lengths.
pub(crate) fn compute_frame(
    params: &FrameParams,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(f32),
) -> Option<Frame> {
    let kind = params.layout.kind();
    let point = params.point_size as f32;
    let first_row = params.row_range.start;
    let data = &params.data;

    let total_scan: u64 = params
        .layout
        .chunks()
        .iter()
        .map(|c| {
            let r = scan_range(kind, c, &params.row_range);
            r.end - r.start
        })
        .sum();

    let mut offsets = Vec::new();
    let mut positions = Vec::new();
    let mut colours = Vec::new();
    let mut processed = 0u64;

    for chunk in params.layout.chunks() {
        let scan = scan_range(kind, chunk, &params.row_range);
        let mut d = scan.start;
        while d < scan.end {
            if cancel.is_cancelled() {
                return None;
            }
            let band_end = (d + BAND_SIZE).min(scan.end);
            let entries: Vec<(u64, Point2, Rgba)> = (d..band_end)
                .into_par_iter()
                .map_init(
                    || [0u32; 256],
                    |scratch, i| {
                        let (x, y) = cell_of(kind, chunk, i);
                        let row = chunk.row_origin + y;
                        if row < params.row_range.start || row >= params.row_range.end {
                            return None;
                        }
                        let offset = chunk.base + i;
                        let position = Point2 {
                            x: (x as f32 + 0.5) * point,
                            y: ((row - first_row) as f32 + 0.5) * point,
                        };
                        let colour = metrics::colour_for_with_scratch(
                            params.colour_mode,
                            data,
                            offset,
                            scratch,
                        );
                        Some((offset, position, colour))
                    },
                )
                .flatten()
                .collect();

            offsets.extend(entries.iter().map(|e| e.0));
            positions.extend(entries.iter().map(|e| e.1));
            colours.extend(entries.iter().map(|e| e.2));

            processed += band_end - d;
            d = band_end;
            if total_scan > 0 {
                on_progress(processed as f32 / total_scan as f32);
            }
        }
    }

    Some(Frame {
        generation: params.generation,
        offsets,
        positions,
        colours,
    })
}

/// Start a recompute on its own thread. Returns the token that cancels it.
pub(crate) fn spawn_recompute(params: FrameParams, tx: Sender<WorkerMsg>) -> CancelToken {
    let token = CancelToken::new();
    let cancel = token.clone();

    thread::spawn(move || {
        let generation = params.generation;
        debug!(generation, "recompute started");

        let progress_tx = tx.clone();
        let frame = compute_frame(&params, &cancel, &mut |fraction| {
            let _ = progress_tx.send(WorkerMsg::Progress { generation, fraction });
        });

        match frame {
            // The session may already be gone; a dead channel just means
            // nobody wants the result.
            Some(frame) => {
                let _ = tx.send(WorkerMsg::Completed(frame));
            }
            None => debug!(generation, "recompute cancelled"),
        }
    });

    token
}
