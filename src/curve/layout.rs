//! Chunk layout derivation for buffers of arbitrary length.
//!
//! A buffer rarely has a square power-of-two size, so it is partitioned into
//! consecutive chunks, each rendered as one self-contained curve instance.
//! Chunks stack vertically in drawing space: chunk `i + 1` starts on the row
//! below the last row of chunk `i`, at column zero.
//!
//! Layouts are value objects: they are re-derived wholesale whenever the
//! buffer length, curve kind, or available width changes, and are never
//! patched incrementally.

use super::{hilbert_forward, hilbert_inverse, zigzag_forward, zigzag_inverse, CurveKind, MAX_ORDER};

/// One contiguous sub-range of the buffer rendered as a single curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Absolute offset of the chunk's first byte.
    pub base: u64,
    /// Number of bytes in the chunk.
    pub len: u64,
    /// Cells per row. A power of two for Hilbert chunks.
    pub width: u64,
    /// Rows the chunk occupies in the vertical stack.
    pub rows: u64,
    /// Absolute row index of the chunk's first row.
    pub row_origin: u64,
}

impl Chunk {
    /// Curve order of a Hilbert chunk (`width == 2^order`).
    #[inline]
    fn order(&self) -> u32 {
        self.width.trailing_zeros()
    }
}

/// Derived arrangement of a whole buffer as stacked curve chunks.
///
/// Invariant: chunks are contiguous, non-overlapping, and their concatenated
/// offset ranges exactly cover `[0, len)`.
#[derive(Clone, Debug, Default)]
pub struct ChunkLayout {
    kind: CurveKind,
    chunks: Vec<Chunk>,
    total_rows: u64,
    len: u64,
}

/// Largest power-of-two chunk width `w` with `w^2 <= max(remaining, 1)` and
/// `w <= max_width`. When `remaining` exceeds `max_width^2` the chunk is
/// capacity-filled at `max_width` and a new chunk begins for the rest.
///
/// Deterministic in `(max_width, remaining)` only; no prior chunk state.
pub fn hilbert_chunk_width(max_width: u64, remaining: u64) -> u64 {
    debug_assert!(max_width >= 1, "chunk width derivation needs a positive max width");

    let remaining = remaining.max(1);
    // Round max_width down to a power of two, capped at the supported order.
    let cap = 1u64 << MAX_ORDER;
    let mut width = if max_width >= cap {
        cap
    } else {
        1u64 << (63 - max_width.leading_zeros() as u64)
    };
    while width > 1 && width * width > remaining {
        width /= 2;
    }

    debug_assert!(width >= 1);
    width
}

impl ChunkLayout {
    /// Derive the layout for `len` bytes at the given available width in
    /// cells. Blank curves, empty buffers, and zero-width viewports all
    /// produce an empty layout.
    pub fn build(kind: CurveKind, len: u64, max_width_cells: u64) -> Self {
        if len == 0 || max_width_cells == 0 || kind == CurveKind::Blank {
            return Self { kind, ..Self::default() };
        }

        let mut chunks = Vec::new();
        let mut base = 0u64;
        let mut row_origin = 0u64;

        match kind {
            CurveKind::Blank => unreachable!(),
            CurveKind::Zigzag => {
                let width = max_width_cells;
                let rows = len.div_ceil(width);
                chunks.push(Chunk { base: 0, len, width, rows, row_origin: 0 });
                row_origin = rows;
            }
            CurveKind::Hilbert => {
                let mut remaining = len;
                while remaining > 0 {
                    let width = hilbert_chunk_width(max_width_cells, remaining);
                    let take = remaining.min(width * width);
                    // A partially filled square still occupies its full height;
                    // cells past the final offset resolve to the invalid sentinel.
                    let rows = width;
                    chunks.push(Chunk { base, len: take, width, rows, row_origin });
                    base += take;
                    row_origin += rows;
                    remaining -= take;
                }
            }
        }

        Self { kind, chunks, total_rows: row_origin, len }
    }

    /// Curve kind this layout was derived for.
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Chunks in offset order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Total rows occupied by the stacked chunks.
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    /// Bytes covered by the layout.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the layout produces no geometry.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk containing the given absolute row, if any.
    pub fn chunk_at_row(&self, row: u64) -> Option<&Chunk> {
        if row >= self.total_rows {
            return None;
        }
        let idx = self
            .chunks
            .partition_point(|c| c.row_origin + c.rows <= row);
        self.chunks.get(idx)
    }

    /// Chunk containing the given absolute byte offset, if any.
    pub fn chunk_at_offset(&self, offset: u64) -> Option<&Chunk> {
        if offset >= self.len {
            return None;
        }
        let idx = self.chunks.partition_point(|c| c.base + c.len <= offset);
        self.chunks.get(idx)
    }

    /// Map an absolute offset to `(column, absolute row)`.
    ///
    /// Returns `None` for offsets past the end of the buffer.
    pub fn forward(&self, offset: u64) -> Option<(u64, u64)> {
        let chunk = self.chunk_at_offset(offset)?;
        let d = offset - chunk.base;
        let (x, y) = match self.kind {
            CurveKind::Blank => return None,
            CurveKind::Hilbert => hilbert_forward(chunk.order(), d),
            CurveKind::Zigzag => zigzag_forward(chunk.width, d),
        };
        Some((x, chunk.row_origin + y))
    }

    /// Map `(column, absolute row)` back to an absolute offset.
    ///
    /// Returns `None` when the cell lies outside every chunk's occupied area,
    /// including cells of the trailing chunk past the final byte.
    pub fn inverse(&self, x: u64, row: u64) -> Option<u64> {
        let chunk = self.chunk_at_row(row)?;
        if x >= chunk.width {
            return None;
        }
        let local_row = row - chunk.row_origin;
        let d = match self.kind {
            CurveKind::Blank => return None,
            CurveKind::Hilbert => hilbert_inverse(chunk.order(), x, local_row),
            CurveKind::Zigzag => zigzag_inverse(chunk.width, x, local_row),
        };
        if d >= chunk.len {
            return None;
        }
        Some(chunk.base + d)
    }
}
