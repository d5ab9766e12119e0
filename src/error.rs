//! Boundary error types.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced across the engine boundary.
///
/// Out-of-range hover resolution is not an error: it returns the invalid
/// sentinel (`None`). An empty buffer is a degraded no-op state. Malformed
/// chunk layouts are internal invariant violations guarded by `debug_assert!`
/// and can never be produced by valid inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The requested zoom level is outside the supported range for the
    /// current view size. State is left unchanged.
    #[error("zoom level {0} is outside the supported range")]
    InvalidZoomLevel(i32),
}
