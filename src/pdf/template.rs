use lopdf::{Dictionary, Document, Object, ObjectId};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template is empty")]
    Empty,
    #[error("Failed to parse PDF template: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("PDF template has no pages")]
    NoPages,
    #[error("Template page has no usable MediaBox")]
    NoMediaBox,
}

/// A single-page PDF template. Bytes are shared and never modified; every
/// export parses its own copy of the document.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    bytes: Arc<Vec<u8>>,
    pub page_width: f64,
    pub page_height: f64,
}

impl Template {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, TemplateError> {
        if bytes.is_empty() {
            return Err(TemplateError::Empty);
        }
        let doc = Document::load_mem(&bytes)?;
        let page_id = first_page(&doc)?;
        let (page_width, page_height) = page_dimensions(&doc, page_id)?;

        Ok(Self {
            name: name.into(),
            bytes: Arc::new(bytes),
            page_width,
            page_height,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Fresh in-memory document for one export.
    pub fn open(&self) -> Result<(Document, ObjectId), TemplateError> {
        let doc = Document::load_mem(&self.bytes)?;
        let page_id = first_page(&doc)?;
        Ok((doc, page_id))
    }
}

/// The template page. Further pages, if any, are carried through untouched.
pub fn first_page(doc: &Document) -> Result<ObjectId, TemplateError> {
    doc.get_pages()
        .into_iter()
        .next()
        .map(|(_, id)| id)
        .ok_or(TemplateError::NoPages)
}

/// Page width and height in points, following `Parent` links for an
/// inherited MediaBox.
pub fn page_dimensions(doc: &Document, page_id: ObjectId) -> Result<(f64, f64), TemplateError> {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let dict = doc.get_object(id).and_then(Object::as_dict)?;
        if let Some(size) = media_box(doc, dict) {
            return Ok(size);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Err(TemplateError::NoMediaBox)
}

fn media_box(doc: &Document, dict: &Dictionary) -> Option<(f64, f64)> {
    let raw = dict.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let arr = resolved.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let llx = number(&arr[0])?;
    let lly = number(&arr[1])?;
    let urx = number(&arr[2])?;
    let ury = number(&arr[3])?;
    let (w, h) = ((urx - llx).abs(), (ury - lly).abs());
    (w > 0.0 && h > 0.0).then_some((w, h))
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

/// Builds a blank one-page PDF of the given size for tests.
#[cfg(test)]
pub(crate) fn blank_pdf(width: i64, height: i64) -> Vec<u8> {
    use lopdf::dictionary;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, b"0 0 1 rg".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {},
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}
