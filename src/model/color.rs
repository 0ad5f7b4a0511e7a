use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

static HEX_COLOR: OnceLock<Regex> = OnceLock::new();

/// Fill color with each channel normalised to `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Parses `#rrggbb` (the `#` is optional, digits are case-insensitive).
    /// Anything else is drawn black.
    pub fn from_hex(hex: &str) -> Rgb {
        let re = HEX_COLOR.get_or_init(|| {
            Regex::new(r"(?i)^#?([a-f\d]{2})([a-f\d]{2})([a-f\d]{2})$")
                .expect("hex color pattern is valid")
        });

        let Some(caps) = re.captures(hex.trim()) else {
            return Rgb::BLACK;
        };
        let channel = |i: usize| {
            caps.get(i)
                .and_then(|m| u8::from_str_radix(m.as_str(), 16).ok())
                .map_or(0.0, |v| f64::from(v) / 255.0)
        };

        Rgb {
            r: channel(1),
            g: channel(2),
            b: channel(3),
        }
    }
}
