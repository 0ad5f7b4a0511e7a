//! Editor-side geometry: alignment, screen projection and dragging.

pub mod align;
pub mod display;
pub mod drag;

pub use align::{align_run, AlignBox, TextMeasure};
pub use display::{project, DisplayGeometry, Zoom};
pub use drag::{DragController, DragState, Point, PointerOutcome};
