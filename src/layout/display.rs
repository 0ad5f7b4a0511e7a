use serde::Serialize;

use super::align::{align_run, AlignBox, TextMeasure};
use crate::model::{FieldKind, TextAlign, TextElement, BASE_WIDTH};

/// Editor zoom in whole percent, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Zoom(u16);

impl Zoom {
    pub const MIN: u16 = 50;
    pub const MAX: u16 = 150;
    pub const STEP: u16 = 10;
    pub const DEFAULT: u16 = 100;

    pub fn new(percent: i64) -> Self {
        let clamped = percent.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Zoom(clamped as u16)
    }

    pub fn percent(&self) -> u16 {
        self.0
    }

    pub fn zoom_in(self) -> Self {
        Self::new(i64::from(self.0) + i64::from(Self::STEP))
    }

    pub fn zoom_out(self) -> Self {
        Self::new(i64::from(self.0) - i64::from(Self::STEP))
    }

    /// Width of the rendered page in screen pixels.
    pub fn pixel_width(&self) -> f64 {
        BASE_WIDTH * f64::from(self.0) / 100.0
    }

    /// Base-space to screen-pixel factor.
    pub fn scale(&self) -> f64 {
        self.pixel_width() / BASE_WIDTH
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Zoom(Self::DEFAULT)
    }
}

/// Extra grab area around the glyph run, in screen pixels.
const HIT_PAD_X: f64 = 8.0;
const HIT_PAD_Y: f64 = 4.0;
/// CSS `line-height: normal` is close to 1.2 em for the offered families.
const LINE_HEIGHT: f64 = 1.2;

/// On-screen geometry of one element at the current zoom.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayGeometry {
    pub id: FieldKind,
    pub content: String,
    /// Element anchor (`x * scale`, `y * scale`).
    pub anchor_x: f64,
    pub anchor_y: f64,
    /// Point the run is aligned on: box start, middle or end. The browser
    /// places text here and lets its own font metrics do the shifting.
    pub align_x: f64,
    /// Left edge of the glyph run after alignment.
    pub left: f64,
    pub text_width: f64,
    pub box_width: f64,
    pub font_size: f64,
    pub text_align: TextAlign,
    pub color: String,
}

impl DisplayGeometry {
    /// Horizontal distance from the anchor to where the glyph run starts.
    pub fn shift(&self) -> f64 {
        self.left - self.anchor_x
    }

    /// Whether a screen point falls on the element's glyph run or its box.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        let start = self.left.min(self.anchor_x);
        let end = (self.left + self.text_width).max(self.anchor_x + self.box_width);
        let bottom = self.anchor_y + self.font_size * LINE_HEIGHT;

        px >= start - HIT_PAD_X
            && px <= end + HIT_PAD_X
            && py >= self.anchor_y - HIT_PAD_Y
            && py <= bottom + HIT_PAD_Y
    }
}

/// Projects a base-space element onto the screen at `scale`. No Y flip: screen
/// and base space both grow downward from the top edge.
pub fn project(
    element: &TextElement,
    content: &str,
    scale: f64,
    measure: &dyn TextMeasure,
) -> DisplayGeometry {
    let font_size = element.font_size * scale;
    let bounds = AlignBox::new(element.x * scale, element.width * scale);
    let run = align_run(
        bounds,
        content,
        element.font(),
        font_size,
        element.text_align,
        measure,
    );

    DisplayGeometry {
        id: element.id,
        content: content.to_string(),
        anchor_x: bounds.origin,
        anchor_y: element.y * scale,
        align_x: bounds.anchor(element.text_align),
        left: run.left,
        text_width: run.width,
        box_width: bounds.width,
        font_size,
        text_align: element.text_align,
        color: element.color.clone(),
    }
}

/// Converts a screen coordinate back to base space.
pub fn to_base(display_value: f64, scale: f64) -> Option<f64> {
    if scale.is_finite() && scale > 0.0 {
        Some(display_value / scale)
    } else {
        None
    }
}
