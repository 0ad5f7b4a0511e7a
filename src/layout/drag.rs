use serde::{Deserialize, Serialize};
use tracing::debug;

use super::display::{to_base, DisplayGeometry};
use crate::model::{FieldKind, TextElement};

/// Pointer position in screen pixels relative to the page's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// State captured on pointer-down and dropped on pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragSession {
    pub element: FieldKind,
    /// Pointer minus the element's screen anchor at capture time.
    pub offset: Point,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PointerOutcome {
    Started { element: FieldKind },
    Moved { element: FieldKind, x: f64, y: f64 },
    Ended { element: Option<FieldKind> },
    /// A second pointer-down while another element is mid-drag.
    Rejected { dragging: FieldKind },
    Ignored,
}

/// Idle/dragging state machine for moving one element at a time.
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Starts a drag on the element whose on-screen geometry was hit.
    ///
    /// The offset is taken against the element's anchor rather than the left
    /// edge of the aligned glyph run, so the anchor keeps tracking the pointer
    /// whatever the alignment.
    pub fn pointer_down(&mut self, hit: &DisplayGeometry, pointer: Point) -> PointerOutcome {
        if let DragState::Dragging(session) = self.state {
            return PointerOutcome::Rejected {
                dragging: session.element,
            };
        }
        if !pointer.is_finite() {
            return PointerOutcome::Ignored;
        }

        // pointer relative to the run's left edge, shifted back onto the anchor
        let from_run = Point::new(pointer.x - hit.left, pointer.y - hit.anchor_y);
        let offset = Point::new(from_run.x + hit.shift(), from_run.y);

        self.state = DragState::Dragging(DragSession {
            element: hit.id,
            offset,
        });
        debug!(element = %hit.id, "drag started");
        PointerOutcome::Started { element: hit.id }
    }

    /// Moves the dragged element so its anchor sits at `pointer - offset`,
    /// written back in base space. Anything that cannot be applied is a no-op.
    pub fn pointer_move(
        &self,
        elements: &mut [TextElement],
        pointer: Point,
        scale: f64,
    ) -> PointerOutcome {
        let DragState::Dragging(session) = self.state else {
            return PointerOutcome::Ignored;
        };
        if !pointer.is_finite() {
            return PointerOutcome::Ignored;
        }

        let screen_x = pointer.x - session.offset.x;
        let screen_y = pointer.y - session.offset.y;
        let (Some(x), Some(y)) = (to_base(screen_x, scale), to_base(screen_y, scale)) else {
            return PointerOutcome::Ignored;
        };
        let Some(element) = elements.iter_mut().find(|e| e.id == session.element) else {
            debug!(element = %session.element, "dragged element is gone");
            return PointerOutcome::Ignored;
        };

        element.x = x;
        element.y = y;
        PointerOutcome::Moved {
            element: session.element,
            x,
            y,
        }
    }

    /// Always returns to idle, wherever the pointer was released.
    pub fn pointer_up(&mut self) -> PointerOutcome {
        let released = match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => {
                debug!(element = %session.element, "drag ended");
                Some(session.element)
            }
            DragState::Idle => None,
        };
        PointerOutcome::Ended { element: released }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::display::project;
    use crate::model::{default_elements, FontSpec, TextAlign};

    fn fixed(_: &str, _: FontSpec, _: f64) -> f64 {
        140.0
    }

    fn name_element() -> TextElement {
        default_elements().remove(0)
    }

    #[test]
    fn test_offset_references_anchor_not_run_corner() {
        let el = name_element();
        let geom = project(&el, "Alice", 1.0, &fixed);
        let mut drag = DragController::new();
        drag.pointer_down(&geom, Point::new(340.0, 290.0));

        let DragState::Dragging(session) = drag.state() else {
            panic!("expected dragging");
        };
        assert_eq!(session.offset, Point::new(-60.0, 16.0));
    }

    #[test]
    fn test_drag_moves_anchor_with_pointer() {
        let mut elements = default_elements();
        let geom = project(&elements[0], "Alice", 1.0, &fixed);
        let mut drag = DragController::new();
        drag.pointer_down(&geom, Point::new(410.0, 280.0));

        let out = drag.pointer_move(&mut elements, Point::new(460.0, 300.0), 1.0);
        assert_eq!(
            out,
            PointerOutcome::Moved {
                element: FieldKind::Name,
                x: 450.0,
                y: 294.0
            }
        );
        assert_eq!((elements[0].x, elements[0].y), (450.0, 294.0));
    }

    #[test]
    fn test_drag_writes_back_in_base_space() {
        let mut elements = default_elements();
        let scale = 1.5;
        let geom = project(&elements[2], "19/1/2026", scale, &fixed);
        let mut drag = DragController::new();
        let grab = Point::new(geom.anchor_x + 3.0, geom.anchor_y + 2.0);
        drag.pointer_down(&geom, grab);

        drag.pointer_move(&mut elements, Point::new(grab.x + 30.0, grab.y - 15.0), scale);
        assert!((elements[2].x - (397.0 + 20.0)).abs() < 1e-9);
        assert!((elements[2].y - (431.0 - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_right_aligned_drag_keeps_anchor_under_pointer() {
        let mut elements = default_elements();
        elements[1].text_align = TextAlign::Right;
        let geom = project(&elements[1], "NO", 1.0, &fixed);
        let mut drag = DragController::new();
        drag.pointer_down(&geom, Point::new(geom.anchor_x, geom.anchor_y));

        drag.pointer_move(&mut elements, Point::new(100.0, 50.0), 1.0);
        assert_eq!((elements[1].x, elements[1].y), (100.0, 50.0));
    }

    #[test]
    fn test_second_pointer_down_is_rejected() {
        let elements = default_elements();
        let a = project(&elements[0], "A", 1.0, &fixed);
        let b = project(&elements[1], "B", 1.0, &fixed);
        let mut drag = DragController::new();
        drag.pointer_down(&a, Point::new(400.0, 280.0));

        let out = drag.pointer_down(&b, Point::new(408.0, 220.0));
        assert_eq!(
            out,
            PointerOutcome::Rejected {
                dragging: FieldKind::Name
            }
        );
        let DragState::Dragging(session) = drag.state() else {
            panic!("expected dragging");
        };
        assert_eq!(session.element, FieldKind::Name);
    }

    #[test]
    fn test_pointer_up_always_returns_to_idle() {
        let mut drag = DragController::new();
        assert_eq!(drag.pointer_up(), PointerOutcome::Ended { element: None });

        let geom = project(&name_element(), "A", 1.0, &fixed);
        drag.pointer_down(&geom, Point::new(400.0, 280.0));
        assert!(matches!(drag.state(), DragState::Dragging(_)));
        assert_eq!(
            drag.pointer_up(),
            PointerOutcome::Ended {
                element: Some(FieldKind::Name)
            }
        );
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn test_moves_while_idle_or_degenerate_are_noops() {
        let mut elements = default_elements();
        let before = elements.clone();
        let mut drag = DragController::new();
        assert_eq!(
            drag.pointer_move(&mut elements, Point::new(1.0, 1.0), 1.0),
            PointerOutcome::Ignored
        );

        let geom = project(&elements[0], "A", 1.0, &fixed);
        drag.pointer_down(&geom, Point::new(400.0, 280.0));
        assert_eq!(
            drag.pointer_move(&mut elements, Point::new(1.0, 1.0), 0.0),
            PointerOutcome::Ignored
        );
        assert_eq!(
            drag.pointer_move(&mut elements, Point::new(f64::NAN, 1.0), 1.0),
            PointerOutcome::Ignored
        );
        assert_eq!(
            drag.pointer_move(&mut elements[1..], Point::new(5.0, 5.0), 1.0),
            PointerOutcome::Ignored
        );
        assert_eq!(elements, before);
    }
}
