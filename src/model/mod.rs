// Coordinate model shared by the on-screen editor and the PDF renderer.
//
// All geometry is authored in base space: a virtual canvas 800 units wide with
// its vertical origin at the top edge.
mod color;

pub use color::Rgb;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width of the virtual canvas every element is authored against.
pub const BASE_WIDTH: f64 = 800.0;

/// The certificate fields an element can display. Also used as the element id,
/// since each field is placed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Name,
    CertNumber,
    IssueDate,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CertNumber => "certNumber",
            Self::IssueDate => "issueDate",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Recipient Name",
            Self::CertNumber => "Certificate Number",
            Self::IssueDate => "Issue Date",
        }
    }

    /// Text shown in the editor while the field is still empty.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Name => "Recipient Name",
            Self::CertNumber => "NO: 13.024/IMPCT/V/2025",
            Self::IssueDate => "19 Januari 2026",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "certNumber" => Ok(Self::CertNumber),
            "issueDate" => Ok(Self::IssueDate),
            other => Err(ModelError::UnknownField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Only `Bold` changes font selection; `Light` renders like `Normal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Bold,
    #[default]
    Normal,
    Light,
}

impl FontWeight {
    pub fn is_bold(&self) -> bool {
        matches!(self, Self::Bold)
    }
}

/// Font families offered by the editor. The first five map onto PDF standard
/// fonts; `Poppins` and `Montserrat` are embedded from font files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Arial,
    #[serde(rename = "Times New Roman")]
    TimesNewRoman,
    #[serde(rename = "Courier New")]
    CourierNew,
    Georgia,
    Verdana,
    Poppins,
    Montserrat,
    #[serde(other)]
    Unrecognized,
}

impl FontFamily {
    pub const ALL: [FontFamily; 7] = [
        Self::Arial,
        Self::TimesNewRoman,
        Self::CourierNew,
        Self::Georgia,
        Self::Verdana,
        Self::Poppins,
        Self::Montserrat,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Arial => "Arial",
            Self::TimesNewRoman => "Times New Roman",
            Self::CourierNew => "Courier New",
            Self::Georgia => "Georgia",
            Self::Verdana => "Verdana",
            Self::Poppins => "Poppins",
            Self::Montserrat => "Montserrat",
            Self::Unrecognized => "Unrecognized",
        }
    }
}

/// Family and weight, everything a width measurement needs besides the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub family: FontFamily,
    pub weight: FontWeight,
}

/// One placeable field. `x`/`y` locate the anchor in base space: `x` is the
/// start of the element's alignment box and `y` its top edge. With a zero
/// `width` the box collapses onto the anchor itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: FieldKind,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    #[serde(default)]
    pub font_family: FontFamily,
    pub color: String,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub font_weight: FontWeight,
    /// Nominal box width used for alignment. Text never wraps.
    #[serde(default)]
    pub width: f64,
}

impl TextElement {
    pub fn font(&self) -> FontSpec {
        FontSpec {
            family: self.font_family,
            weight: self.font_weight,
        }
    }

    pub fn fill(&self) -> Rgb {
        Rgb::from_hex(&self.color)
    }

    pub fn apply(&mut self, patch: ElementPatch) -> Result<(), ModelError> {
        patch.validate()?;

        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(family) = patch.font_family {
            self.font_family = family;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(align) = patch.text_align {
            self.text_align = align;
        }
        if let Some(weight) = patch.font_weight {
            self.font_weight = weight;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        Ok(())
    }
}

/// Partial update of a [`TextElement`]'s geometry or style.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub font_size: Option<f64>,
    pub font_family: Option<FontFamily>,
    pub color: Option<String>,
    pub text_align: Option<TextAlign>,
    pub font_weight: Option<FontWeight>,
    pub width: Option<f64>,
}

impl ElementPatch {
    fn validate(&self) -> Result<(), ModelError> {
        for (field, value) in [("x", self.x), ("y", self.y)] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(ModelError::InvalidValue(field));
            }
        }
        if self.font_size.is_some_and(|s| !s.is_finite() || s <= 0.0) {
            return Err(ModelError::InvalidValue("fontSize"));
        }
        if self.width.is_some_and(|w| !w.is_finite() || w < 0.0) {
            return Err(ModelError::InvalidValue("width"));
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Invalid value for {0}")]
    InvalidValue(&'static str),
}

/// Per-recipient certificate content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateData {
    pub recipient_name: String,
    /// Formatted as `NO: <major>.<minor>/<suffix>`.
    pub certificate_number: String,
    pub issue_date: String,
}

impl CertificateData {
    /// Empty recipient, the configured starting number and today's date
    /// rendered as `"<place>, d/m/yyyy"`.
    pub fn initial(certificate_number: &str, issue_place: &str, today: NaiveDate) -> Self {
        Self {
            recipient_name: String::new(),
            certificate_number: certificate_number.to_string(),
            issue_date: format!("{}, {}", issue_place, today.format("%-d/%-m/%Y")),
        }
    }

    pub fn text_for(&self, kind: FieldKind) -> &str {
        match kind {
            FieldKind::Name => &self.recipient_name,
            FieldKind::CertNumber => &self.certificate_number,
            FieldKind::IssueDate => &self.issue_date,
        }
    }

    /// Copy for one bulk recipient: everything shared except name and number.
    pub fn for_recipient(&self, recipient_name: &str, certificate_number: &str) -> Self {
        Self {
            recipient_name: recipient_name.to_string(),
            certificate_number: certificate_number.to_string(),
            issue_date: self.issue_date.clone(),
        }
    }
}

/// Starting layout for a fresh session.
pub fn default_elements() -> Vec<TextElement> {
    let element = |kind, x, y, font_size, font_family, font_weight| TextElement {
        id: kind,
        kind,
        x,
        y,
        font_size,
        font_family,
        color: "#02316a".to_string(),
        text_align: TextAlign::Center,
        font_weight,
        width: 0.0,
    };

    vec![
        element(FieldKind::Name, 400.0, 274.0, 55.0, FontFamily::Poppins, FontWeight::Bold),
        element(
            FieldKind::CertNumber,
            408.0,
            215.0,
            22.0,
            FontFamily::Montserrat,
            FontWeight::Normal,
        ),
        element(
            FieldKind::IssueDate,
            397.0,
            431.0,
            13.0,
            FontFamily::Montserrat,
            FontWeight::Bold,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_json_uses_editor_field_names() {
        let json = serde_json::json!({
            "id": "certNumber",
            "type": "certNumber",
            "x": 408.0,
            "y": 215.0,
            "fontSize": 22.0,
            "fontFamily": "Times New Roman",
            "color": "#02316a",
            "textAlign": "right",
            "fontWeight": "light",
            "width": 120.0
        });
        let el: TextElement = serde_json::from_value(json).unwrap();
        assert_eq!(el.kind, FieldKind::CertNumber);
        assert_eq!(el.font_family, FontFamily::TimesNewRoman);
        assert_eq!(el.text_align, TextAlign::Right);
        assert_eq!(el.font_weight, FontWeight::Light);
        assert!(!el.font_weight.is_bold());
    }

    #[test]
    fn test_missing_style_fields_default() {
        let json = serde_json::json!({
            "id": "name", "type": "name", "x": 1.0, "y": 2.0,
            "fontSize": 10.0, "fontFamily": "Comic Sans", "color": "#000000"
        });
        let el: TextElement = serde_json::from_value(json).unwrap();
        assert_eq!(el.font_family, FontFamily::Unrecognized);
        assert_eq!(el.text_align, TextAlign::Left);
        assert_eq!(el.font_weight, FontWeight::Normal);
        assert_eq!(el.width, 0.0);
    }

    #[test]
    fn test_field_kind_parse() {
        assert_eq!("issueDate".parse::<FieldKind>(), Ok(FieldKind::IssueDate));
        assert!("signature".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_patch_applies_only_given_fields() {
        let mut el = default_elements().remove(0);
        el.apply(ElementPatch {
            font_size: Some(40.0),
            text_align: Some(TextAlign::Left),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(el.font_size, 40.0);
        assert_eq!(el.text_align, TextAlign::Left);
        assert_eq!(el.x, 400.0);
        assert_eq!(el.font_family, FontFamily::Poppins);
    }

    #[test]
    fn test_patch_rejects_bad_geometry() {
        let mut el = default_elements().remove(0);
        let before = el.clone();
        let err = el
            .apply(ElementPatch {
                x: Some(10.0),
                font_size: Some(0.0),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, ModelError::InvalidValue("fontSize"));
        assert_eq!(el, before);
    }

    #[test]
    fn test_initial_certificate_data() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
        let data = CertificateData::initial("NO: 13.024/IMPCT/V/2025", "Jakarta", today);
        assert_eq!(data.issue_date, "Jakarta, 19/1/2026");
        assert!(data.recipient_name.is_empty());
        assert_eq!(data.text_for(FieldKind::CertNumber), "NO: 13.024/IMPCT/V/2025");
    }

    #[test]
    fn test_for_recipient_keeps_issue_date() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        let data = CertificateData::initial("NO: 1.001/X", "Bandung", today);
        let copy = data.for_recipient("Jane", "NO: 1.002/X");
        assert_eq!(copy.recipient_name, "Jane");
        assert_eq!(copy.certificate_number, "NO: 1.002/X");
        assert_eq!(copy.issue_date, data.issue_date);
    }
}
