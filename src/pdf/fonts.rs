// Font selection, embedded font programs and the font library that loads them.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, warn};

use super::metrics::{encode_win_ansi, StandardFont};
use crate::layout::TextMeasure;
use crate::model::{FontFamily, FontSpec};

/// Families shipped as TrueType programs and embedded into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddedFamily {
    Poppins,
    Montserrat,
}

impl EmbeddedFamily {
    pub const ALL: [EmbeddedFamily; 2] = [Self::Poppins, Self::Montserrat];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Poppins => "Poppins",
            Self::Montserrat => "Montserrat",
        }
    }

    /// `Poppins-Bold.ttf`, `Montserrat-Regular.ttf`, ...
    pub fn file_name(&self, bold: bool) -> String {
        let variant = if bold { "Bold" } else { "Regular" };
        format!("{}-{}.ttf", self.name(), variant)
    }
}

/// Where the glyphs for a `(family, weight)` pair come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontChoice {
    Standard(StandardFont),
    Embedded { family: EmbeddedFamily, bold: bool },
}

/// The font selection table. Every family the editor offers is covered;
/// unknown families use Helvetica.
pub fn select_font(spec: FontSpec) -> FontChoice {
    let bold = spec.weight.is_bold();
    let standard = |regular: StandardFont| {
        FontChoice::Standard(if bold { regular.bold() } else { regular })
    };

    match spec.family {
        FontFamily::Arial | FontFamily::Verdana => standard(StandardFont::Helvetica),
        FontFamily::TimesNewRoman | FontFamily::Georgia => standard(StandardFont::TimesRoman),
        FontFamily::CourierNew => standard(StandardFont::Courier),
        FontFamily::Poppins => FontChoice::Embedded {
            family: EmbeddedFamily::Poppins,
            bold,
        },
        FontFamily::Montserrat => FontChoice::Embedded {
            family: EmbeddedFamily::Montserrat,
            bold,
        },
        FontFamily::Unrecognized => standard(StandardFont::Helvetica),
    }
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("Failed to read font file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse font file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// A parsed TrueType program with the metrics needed to measure, encode and
/// describe it in a PDF.
#[derive(Debug)]
pub struct EmbeddedFont {
    pub family: EmbeddedFamily,
    pub bold: bool,
    pub postscript_name: String,
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
    glyph_ids: HashMap<char, u16>,
    advances: HashMap<u16, u16>,
}

impl EmbeddedFont {
    pub fn from_data(family: EmbeddedFamily, bold: bool, data: Vec<u8>) -> Result<Self, String> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| e.to_string())?;
        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return Err("font reports zero units per em".to_string());
        }

        let mut glyph_ids = HashMap::new();
        let mut advances = HashMap::new();
        advances.insert(0, face.glyph_hor_advance(ttf_parser::GlyphId(0)).unwrap_or(0));
        for code in 0x20u32..=0xFFFF {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(gid) = face.glyph_index(ch) {
                glyph_ids.insert(ch, gid.0);
                advances
                    .entry(gid.0)
                    .or_insert_with(|| face.glyph_hor_advance(gid).unwrap_or(0));
            }
        }

        let postscript_name = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|n| n.to_string())
            .map(|n| n.chars().filter(|c| c.is_ascii_graphic()).collect::<String>())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| family.file_name(bold).trim_end_matches(".ttf").to_string());

        let bbox = face.global_bounding_box();
        Ok(Self {
            family,
            bold,
            postscript_name,
            units_per_em,
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            glyph_ids,
            advances,
            data: Arc::new(data),
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Glyph for `ch`, or `.notdef` (0) when the font lacks it.
    pub fn glyph_id(&self, ch: char) -> u16 {
        self.glyph_ids.get(&ch).copied().unwrap_or(0)
    }

    /// Advance of a glyph in 1/1000 em, the unit PDF width arrays use.
    pub fn glyph_width(&self, gid: u16) -> u32 {
        let advance = self.advances.get(&gid).copied().unwrap_or(0);
        self.to_pdf_units(i32::from(advance)) as u32
    }

    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text
            .chars()
            .map(|ch| self.glyph_width(self.glyph_id(ch)))
            .sum();
        f64::from(units) * font_size / 1000.0
    }

    /// Two-byte glyph ids, big-endian, for Identity-H.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .flat_map(|ch| self.glyph_id(ch).to_be_bytes())
            .collect()
    }

    /// `(glyph id, char)` pairs for the glyphs `text` uses, sorted by id.
    pub fn used_glyphs(&self, text: &str) -> Vec<(u16, char)> {
        let mut used: Vec<(u16, char)> = text.chars().map(|ch| (self.glyph_id(ch), ch)).collect();
        used.sort_unstable();
        used.dedup_by_key(|(gid, _)| *gid);
        used
    }

    pub fn ascent(&self) -> i32 {
        self.to_pdf_units(i32::from(self.ascender))
    }

    pub fn descent(&self) -> i32 {
        self.to_pdf_units(i32::from(self.descender))
    }

    pub fn cap_height(&self) -> i32 {
        self.to_pdf_units(i32::from(self.cap_height))
    }

    pub fn bbox(&self) -> [i32; 4] {
        self.bbox.map(|v| self.to_pdf_units(i32::from(v)))
    }

    fn to_pdf_units(&self, value: i32) -> i32 {
        value * 1000 / i32::from(self.units_per_em)
    }
}

/// A font ready to measure and encode text.
#[derive(Debug, Clone)]
pub enum ResolvedFont {
    Standard(StandardFont),
    Embedded(Arc<EmbeddedFont>),
}

impl ResolvedFont {
    pub fn choice(&self) -> FontChoice {
        match self {
            Self::Standard(font) => FontChoice::Standard(*font),
            Self::Embedded(font) => FontChoice::Embedded {
                family: font.family,
                bold: font.bold,
            },
        }
    }

    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        match self {
            Self::Standard(font) => font.text_width(text, font_size),
            Self::Embedded(font) => font.text_width(text, font_size),
        }
    }

    /// Bytes for a `Tj` operand in this font's encoding.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Standard(_) => encode_win_ansi(text),
            Self::Embedded(font) => font.encode(text),
        }
    }
}

type FontSlot = (EmbeddedFamily, bool);

/// Loads embeddable font programs from a directory on first use and keeps
/// them for the life of the process. Failed loads are remembered too, so a
/// missing file is reported once rather than on every measurement.
#[derive(Debug)]
pub struct FontLibrary {
    dir: PathBuf,
    cache: Mutex<HashMap<FontSlot, Option<Arc<EmbeddedFont>>>>,
}

impl FontLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Reads and parses one font file. Not cached.
    pub fn load(&self, family: EmbeddedFamily, bold: bool) -> Result<EmbeddedFont, FontError> {
        let path = self.dir.join(family.file_name(bold));
        let data = std::fs::read(&path).map_err(|source| FontError::Read {
            path: path.clone(),
            source,
        })?;
        EmbeddedFont::from_data(family, bold, data).map_err(|reason| FontError::Parse { path, reason })
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<FontSlot, Option<Arc<EmbeddedFont>>>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn cached(&self, family: EmbeddedFamily, bold: bool) -> Option<Arc<EmbeddedFont>> {
        if let Some(slot) = self.lock_cache().get(&(family, bold)) {
            return slot.clone();
        }

        // parsed without the lock held; a concurrent loader keeps whichever lands first
        let loaded = match self.load(family, bold) {
            Ok(font) => {
                debug!(family = family.name(), bold, "loaded embedded font");
                Some(Arc::new(font))
            }
            Err(e) => {
                warn!("{}; falling back to Helvetica", e);
                None
            }
        };
        self.lock_cache()
            .entry((family, bold))
            .or_insert(loaded)
            .clone()
    }

    /// Loads every embeddable family and weight up front so request handlers
    /// never parse font files.
    pub fn preload(&self) {
        for family in EmbeddedFamily::ALL {
            for bold in [false, true] {
                self.cached(family, bold);
            }
        }
    }

    /// Resolves a family/weight pair to a usable font. Embedded families whose
    /// files are missing or broken degrade to Helvetica of the same weight.
    pub fn resolve(&self, spec: FontSpec) -> ResolvedFont {
        match select_font(spec) {
            FontChoice::Standard(font) => ResolvedFont::Standard(font),
            FontChoice::Embedded { family, bold } => match self.cached(family, bold) {
                Some(font) => ResolvedFont::Embedded(font),
                None if bold => ResolvedFont::Standard(StandardFont::HelveticaBold),
                None => ResolvedFont::Standard(StandardFont::Helvetica),
            },
        }
    }
}

impl TextMeasure for FontLibrary {
    fn text_width(&self, text: &str, font: FontSpec, font_size: f64) -> f64 {
        self.resolve(font).text_width(text, font_size)
    }
}

/// Looks for a TrueType file in the usual system font locations.
#[cfg(test)]
pub(crate) fn find_system_ttf() -> Option<PathBuf> {
    let dirs = [
        "/usr/share/fonts/truetype/dejavu",
        "/usr/share/fonts/truetype/liberation",
        "/usr/share/fonts/TTF",
        "/Library/Fonts",
    ];
    dirs.iter()
        .filter_map(|d| std::fs::read_dir(d).ok())
        .flat_map(|entries| entries.filter_map(Result::ok))
        .map(|e| e.path())
        .find(|p| p.extension().is_some_and(|ext| ext == "ttf"))
}
