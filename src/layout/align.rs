use crate::model::{FontSpec, TextAlign};

/// Width measurement supplied by a renderer. The editor and the PDF writer
/// measure with different metrics but share the alignment arithmetic below.
pub trait TextMeasure {
    /// Advance width of `text` set in `font` at `font_size`, in the caller's units.
    fn text_width(&self, text: &str, font: FontSpec, font_size: f64) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, FontSpec, f64) -> f64,
{
    fn text_width(&self, text: &str, font: FontSpec, font_size: f64) -> f64 {
        self(text, font, font_size)
    }
}

/// Left edge of a glyph run whose anchor is `anchor_x`.
///
/// `center` puts the run's midpoint on the anchor, `right` its end.
pub fn resolve_left_edge(anchor_x: f64, measured_width: f64, align: TextAlign) -> f64 {
    match align {
        TextAlign::Left => anchor_x,
        TextAlign::Center => anchor_x - measured_width / 2.0,
        TextAlign::Right => anchor_x - measured_width,
    }
}

/// Horizontal extent an element aligns within, already in target-space units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignBox {
    pub origin: f64,
    pub width: f64,
}

impl AlignBox {
    pub fn new(origin: f64, width: f64) -> Self {
        Self {
            origin,
            width: width.max(0.0),
        }
    }

    /// The point the glyph run is pinned to: box start, middle or end.
    pub fn anchor(&self, align: TextAlign) -> f64 {
        match align {
            TextAlign::Left => self.origin,
            TextAlign::Center => self.origin + self.width / 2.0,
            TextAlign::Right => self.origin + self.width,
        }
    }

    pub fn left_edge(&self, measured_width: f64, align: TextAlign) -> f64 {
        resolve_left_edge(self.anchor(align), measured_width, align)
    }
}

/// Measured width and resolved left edge of one glyph run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRun {
    pub left: f64,
    pub width: f64,
}

/// Measures `text` with `measure` and aligns it inside `bounds`.
pub fn align_run(
    bounds: AlignBox,
    text: &str,
    font: FontSpec,
    font_size: f64,
    align: TextAlign,
    measure: &dyn TextMeasure,
) -> AlignedRun {
    let width = measure.text_width(text, font, font_size).max(0.0);
    AlignedRun {
        left: bounds.left_edge(width, align),
        width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FontFamily, FontWeight};

    fn spec() -> FontSpec {
        FontSpec {
            family: FontFamily::Arial,
            weight: FontWeight::Normal,
        }
    }

    #[test]
    fn test_left_edge_for_each_alignment() {
        for &(x, w) in &[(0.0, 0.0), (400.0, 140.0), (-12.5, 3.0), (1e6, 0.25)] {
            assert_eq!(resolve_left_edge(x, w, TextAlign::Left), x);
            assert_eq!(resolve_left_edge(x, w, TextAlign::Center), x - w / 2.0);
            assert_eq!(resolve_left_edge(x, w, TextAlign::Right), x - w);
        }
    }

    #[test]
    fn test_zero_width_box_is_the_anchor() {
        let b = AlignBox::new(400.0, 0.0);
        assert_eq!(b.left_edge(140.0, TextAlign::Center), 330.0);
        assert_eq!(b.left_edge(140.0, TextAlign::Right), 260.0);
    }

    #[test]
    fn test_box_relative_alignment() {
        let b = AlignBox::new(100.0, 200.0);
        assert_eq!(b.left_edge(50.0, TextAlign::Left), 100.0);
        // run midpoint lands on the box midpoint
        assert_eq!(b.left_edge(50.0, TextAlign::Center) + 25.0, 200.0);
        // run end lands on the box end
        assert_eq!(b.left_edge(50.0, TextAlign::Right) + 50.0, 300.0);
    }

    #[test]
    fn test_negative_box_width_is_clamped() {
        assert_eq!(AlignBox::new(10.0, -5.0).width, 0.0);
    }

    #[test]
    fn test_align_run_uses_injected_measure() {
        let per_char = |text: &str, _: FontSpec, size: f64| text.chars().count() as f64 * size * 0.5;
        let run = align_run(
            AlignBox::new(400.0, 0.0),
            "Alice",
            spec(),
            56.0,
            TextAlign::Center,
            &per_char,
        );
        assert_eq!(run.width, 140.0);
        assert_eq!(run.left, 330.0);
    }

    #[test]
    fn test_renderers_share_arithmetic_with_different_metrics() {
        let screen = |_: &str, _: FontSpec, _: f64| 141.0;
        let pdf = |_: &str, _: FontSpec, _: f64| 140.0;
        let b = AlignBox::new(400.0, 0.0);
        let a = align_run(b, "Alice", spec(), 55.0, TextAlign::Center, &screen);
        let c = align_run(b, "Alice", spec(), 55.0, TextAlign::Center, &pdf);
        assert_eq!(a.left + a.width / 2.0, c.left + c.width / 2.0);
        assert!((a.left - c.left).abs() <= 0.5);
    }
}
