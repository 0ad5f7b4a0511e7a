// Standard font metrics (AFM advance widths, 1/1000 em) and WinAnsi encoding.

/// The standard PDF fonts the editor's built-in families resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    pub fn bold(&self) -> Self {
        match self {
            Self::Helvetica | Self::HelveticaBold => Self::HelveticaBold,
            Self::TimesRoman | Self::TimesBold => Self::TimesBold,
            Self::Courier | Self::CourierBold => Self::CourierBold,
        }
    }

    /// Width of one WinAnsi-encoded byte in 1/1000 em.
    pub fn byte_width(&self, byte: u8) -> u16 {
        let table = match self {
            Self::Helvetica => &HELVETICA,
            Self::HelveticaBold => &HELVETICA_BOLD,
            Self::TimesRoman => &TIMES_ROMAN,
            Self::TimesBold => &TIMES_BOLD,
            Self::Courier | Self::CourierBold => return 600,
        };

        let ascii = match byte {
            0x20..=0x7E => byte,
            0xC0..=0xFF => match fold_accent(byte) {
                Some(base) => base,
                None => return DEFAULT_WIDTH,
            },
            _ => return DEFAULT_WIDTH,
        };
        table[usize::from(ascii - 0x20)]
    }

    /// Width of `text` in points once encoded, at `font_size`.
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = encode_win_ansi(text)
            .into_iter()
            .map(|b| u32::from(self.byte_width(b)))
            .sum();
        f64::from(units) * font_size / 1000.0
    }
}

const DEFAULT_WIDTH: u16 = 500;

/// Encodes text for a standard font. Characters outside WinAnsi become `?`,
/// control characters become spaces.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            c if c.is_control() => b' ',
            ' '..='~' | '\u{A0}'..='\u{FF}' => ch as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        })
        .collect()
}

/// Accented Latin-1 letters share their base letter's advance in these fonts.
fn fold_accent(byte: u8) -> Option<u8> {
    let base = match byte {
        0xC0..=0xC5 => b'A',
        0xC7 => b'C',
        0xC8..=0xCB => b'E',
        0xCC..=0xCF => b'I',
        0xD1 => b'N',
        0xD2..=0xD6 | 0xD8 => b'O',
        0xD9..=0xDC => b'U',
        0xDD => b'Y',
        0xE0..=0xE5 => b'a',
        0xE7 => b'c',
        0xE8..=0xEB => b'e',
        0xEC..=0xEF => b'i',
        0xF1 => b'n',
        0xF2..=0xF6 | 0xF8 => b'o',
        0xF9..=0xFC => b'u',
        0xFD | 0xFF => b'y',
        _ => return None,
    };
    Some(base)
}

// Printable ASCII, 0x20 through 0x7E.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_space_width() {
        let w = StandardFont::Helvetica.text_width(" ", 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_table_lookups_line_up() {
        assert_eq!(StandardFont::Helvetica.byte_width(b'A'), 667);
        assert_eq!(StandardFont::Helvetica.byte_width(b'i'), 222);
        assert_eq!(StandardFont::Helvetica.byte_width(b'~'), 584);
        assert_eq!(StandardFont::TimesBold.byte_width(b'W'), 1000);
        assert_eq!(StandardFont::TimesRoman.byte_width(b'z'), 444);
        assert_eq!(StandardFont::HelveticaBold.byte_width(b'@'), 975);
    }

    #[test]
    fn test_bold_is_wider() {
        let regular = StandardFont::Helvetica.text_width("Alice", 20.0);
        let bold = StandardFont::HelveticaBold.text_width("Alice", 20.0);
        assert!(bold > regular);
    }

    #[test]
    fn test_courier_is_monospaced() {
        let a = StandardFont::Courier.text_width("iiii", 10.0);
        let b = StandardFont::CourierBold.text_width("WWWW", 10.0);
        assert_eq!(a, 24.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_accented_letters_use_base_width() {
        let plain = StandardFont::TimesRoman.text_width("Jose", 10.0);
        let accented = StandardFont::TimesRoman.text_width("José", 10.0);
        assert_eq!(plain, accented);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Aé–"), vec![b'A', 0xE9, 0x96]);
        assert_eq!(encode_win_ansi("日\t"), vec![b'?', b' ']);
    }

    #[test]
    fn test_bold_variant_table() {
        assert_eq!(StandardFont::TimesRoman.bold(), StandardFont::TimesBold);
        assert_eq!(StandardFont::CourierBold.bold(), StandardFont::CourierBold);
    }
}
