// Certificate PDF rendering.
// Draws the session's text elements onto a copy of the template page with lopdf.
pub mod fonts;
pub mod metrics;
pub mod template;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout::{align_run, AlignBox, TextMeasure};
use crate::model::{CertificateData, FieldKind, FontSpec, Rgb, TextElement, BASE_WIDTH};
use fonts::{EmbeddedFont, FontChoice, FontLibrary, ResolvedFont};
use template::{Template, TemplateError};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Failed to update PDF: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Failed to write PDF: {0}")]
    Write(String),
}

/// Where and how one element's text was drawn, in PDF points.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub element: FieldKind,
    pub text: String,
    pub font: FontChoice,
    pub font_size: f64,
    /// Left edge of the glyph run.
    pub x: f64,
    /// Baseline, measured up from the bottom of the page.
    pub y: f64,
    pub width: f64,
    pub color: Rgb,
}

#[derive(Debug)]
pub struct RenderedCertificate {
    pub bytes: Vec<u8>,
    pub placements: Vec<TextPlacement>,
}

/// Base-space to PDF-point factor. It is tied to the width the editor was
/// showing when the export started, not to the fixed base width.
pub fn export_scale(page_width: f64, canvas_width: f64) -> f64 {
    if canvas_width.is_finite() && canvas_width > 0.0 {
        page_width / canvas_width
    } else {
        warn!(canvas_width, "unusable canvas width, scaling against the base width");
        page_width / BASE_WIDTH
    }
}

/// Run geometry in PDF space: `(left, baseline, font size, measured width)`.
///
/// The Y axis flips (PDF origin is bottom-left) and a full font size is
/// dropped below the element's top edge to approximate the baseline.
pub fn layout_text(
    element: &TextElement,
    text: &str,
    scale: f64,
    page_height: f64,
    measure: &dyn TextMeasure,
) -> (f64, f64, f64, f64) {
    let font_size = element.font_size * scale;
    let bounds = AlignBox::new(element.x * scale, element.width * scale);
    let run = align_run(
        bounds,
        text,
        element.font(),
        font_size,
        element.text_align,
        measure,
    );
    let y = page_height - element.y * scale - font_size;
    (run.left, y, font_size, run.width)
}

/// Renders one certificate. The template bytes are re-parsed, so the shared
/// template is never touched.
pub fn render_certificate(
    template: &Template,
    elements: &[TextElement],
    data: &CertificateData,
    canvas_width: f64,
    fonts: &FontLibrary,
) -> Result<RenderedCertificate, RenderError> {
    let (mut doc, page_id) = template.open()?;
    let scale = export_scale(template.page_width, canvas_width);

    let mut runs: Vec<(TextPlacement, ResolvedFont)> = Vec::new();
    for element in elements {
        let text = data.text_for(element.kind);
        if text.is_empty() {
            continue;
        }

        let font = fonts.resolve(element.font());
        let metric = |t: &str, _: FontSpec, size: f64| font.text_width(t, size);
        let (x, y, font_size, width) =
            layout_text(element, text, scale, template.page_height, &metric);

        runs.push((
            TextPlacement {
                element: element.id,
                text: text.to_string(),
                font: font.choice(),
                font_size,
                x,
                y,
                width,
                color: element.fill(),
            },
            font,
        ));
    }

    if !runs.is_empty() {
        draw_runs(&mut doc, page_id, &runs)?;
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RenderError::Write(e.to_string()))?;

    debug!(
        runs = runs.len(),
        scale,
        size = bytes.len(),
        "rendered certificate"
    );
    Ok(RenderedCertificate {
        bytes,
        placements: runs.into_iter().map(|(p, _)| p).collect(),
    })
}

fn draw_runs(
    doc: &mut Document,
    page_id: ObjectId,
    runs: &[(TextPlacement, ResolvedFont)],
) -> Result<(), RenderError> {
    let resources = inherited_resources(doc, page_id)?;
    let taken = font_names(doc, &resources);

    // one resource per distinct font, named clear of the template's own
    let mut installed: Vec<(FontChoice, String, ResolvedFont)> = Vec::new();
    let mut counter = 0;
    for (_, font) in runs {
        if installed.iter().any(|(choice, _, _)| *choice == font.choice()) {
            continue;
        }
        let name = loop {
            counter += 1;
            let candidate = format!("CG{}", counter);
            if !taken.contains(candidate.as_bytes()) {
                break candidate;
            }
        };
        installed.push((font.choice(), name, font.clone()));
    }

    let mut operations = Vec::new();
    for (placement, font) in runs {
        let Some((_, name, _)) = installed.iter().find(|(c, _, _)| *c == font.choice()) else {
            continue;
        };
        let format = match font {
            ResolvedFont::Standard(_) => StringFormat::Literal,
            ResolvedFont::Embedded(_) => StringFormat::Hexadecimal,
        };
        let Rgb { r, g, b } = placement.color;

        operations.extend([
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(name.as_bytes().to_vec()), real(placement.font_size)],
            ),
            Operation::new("rg", vec![real(r), real(g), real(b)]),
            Operation::new("Td", vec![real(placement.x), real(placement.y)]),
            Operation::new(
                "Tj",
                vec![Object::String(font.encode(&placement.text), format)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }
    let overlay = Content { operations }
        .encode()
        .map_err(|e| RenderError::Write(e.to_string()))?;

    let mut font_refs = Vec::with_capacity(installed.len());
    for (choice, name, font) in &installed {
        let id = match font {
            ResolvedFont::Standard(std_font) => doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => std_font.pdf_name(),
                "Encoding" => "WinAnsiEncoding",
            }),
            ResolvedFont::Embedded(embedded) => {
                let text: String = runs
                    .iter()
                    .filter(|(_, f)| f.choice() == *choice)
                    .map(|(p, _)| p.text.as_str())
                    .collect();
                add_embedded_font(doc, embedded, &text)
            }
        };
        font_refs.push((name.clone(), id));
    }

    install_fonts(doc, page_id, resources, &font_refs)?;
    wrap_page_contents(doc, page_id, overlay)?;
    Ok(())
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Embeds a TrueType program as a Type0 font with Identity-H encoding.
fn add_embedded_font(doc: &mut Document, font: &EmbeddedFont, used_text: &str) -> ObjectId {
    let data = font.data().to_vec();
    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => data.len() as i64 },
        data,
    ));

    let bbox = font.bbox().map(|v| Object::Integer(i64::from(v))).to_vec();
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(font.postscript_name.as_bytes().to_vec()),
        "Flags" => 32,
        "FontBBox" => bbox,
        "ItalicAngle" => 0,
        "Ascent" => i64::from(font.ascent()),
        "Descent" => i64::from(font.descent()),
        "CapHeight" => i64::from(font.cap_height()),
        "StemV" => if font.bold { 120 } else { 80 },
        "FontFile2" => file_id,
    });

    let used = font.used_glyphs(used_text);
    let mut widths = Vec::with_capacity(used.len() * 2);
    for (gid, _) in &used {
        widths.push(Object::Integer(i64::from(*gid)));
        widths.push(Object::Array(vec![Object::Integer(i64::from(font.glyph_width(*gid)))]));
    }

    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => Object::Name(font.postscript_name.as_bytes().to_vec()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => i64::from(font.glyph_width(0)),
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode_id = doc.add_object(Stream::new(
        dictionary! {},
        to_unicode_cmap(&used).into_bytes(),
    ));

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(font.postscript_name.as_bytes().to_vec()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![cid_font_id.into()],
        "ToUnicode" => to_unicode_id,
    })
}

/// Glyph-to-Unicode map so drawn text stays searchable and copyable.
fn to_unicode_cmap(used: &[(u16, char)]) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );

    // at most 100 entries per bfchar block
    for chunk in used.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, ch) in chunk {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

/// The page's effective Resources, resolved and copied, following `Parent`
/// links when the page inherits them.
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, lopdf::Error> {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let dict = doc.get_object(id).and_then(Object::as_dict)?;
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(res)) => return Ok(res.clone()),
            Ok(Object::Reference(res_id)) => {
                return doc.get_object(*res_id).and_then(Object::as_dict).cloned();
            }
            _ => {}
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(Dictionary::new())
}

fn font_dict(doc: &Document, resources: &Dictionary) -> Dictionary {
    match resources.get(b"Font") {
        Ok(Object::Dictionary(fonts)) => fonts.clone(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_dict)
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

fn font_names(doc: &Document, resources: &Dictionary) -> HashSet<Vec<u8>> {
    font_dict(doc, resources)
        .iter()
        .map(|(name, _)| name.clone())
        .collect()
}

/// Writes the resources back onto the page itself with the new fonts added.
fn install_fonts(
    doc: &mut Document,
    page_id: ObjectId,
    mut resources: Dictionary,
    fonts: &[(String, ObjectId)],
) -> Result<(), lopdf::Error> {
    let mut font_entries = font_dict(doc, &resources);
    for (name, id) in fonts {
        font_entries.set(name.as_bytes().to_vec(), *id);
    }
    resources.set("Font", font_entries);

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)?
        .set("Resources", resources);
    Ok(())
}

/// Brackets the template's content in `q`/`Q` and appends the overlay, so
/// whatever graphics state the template leaves behind cannot shift our text.
fn wrap_page_contents(
    doc: &mut Document,
    page_id: ObjectId,
    overlay: Vec<u8>,
) -> Result<(), lopdf::Error> {
    let existing: Vec<Object> = {
        let page = doc.get_object(page_id).and_then(Object::as_dict)?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let mut body = b"\nQ\n".to_vec();
    body.extend(overlay);
    let overlay_id = doc.add_object(Stream::new(dictionary! {}, body));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)?
        .set("Contents", contents);
    Ok(())
}
