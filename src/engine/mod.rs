//! Viewport, render buffer, recompute worker, and the session boundary.

pub mod events;
pub mod render;
pub mod session;
pub mod viewport;
pub mod worker;

pub use events::EngineEvent;
pub use render::{Frame, Point2, RenderBuffer};
pub use session::{BufferSummary, Session};
pub use viewport::{Viewport, DEFAULT_ZOOM_LEVEL, MAX_ZOOM_LEVEL, MIN_ZOOM_LEVEL};
pub use worker::CancelToken;
