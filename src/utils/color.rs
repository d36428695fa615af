//! Color parsing and conversion utilities
//!
//! Background colors arrive as CSS-style strings from the color picker and the
//! preset swatches: `transparent`, hex notation or a handful of named colors.

use crate::{
    error::{RefineError, Result},
    types::{BackgroundColor, ColorValue},
};

/// Named colors accepted in addition to hex notation
const NAMED_COLORS: &[(&str, BackgroundColor)] = &[
    ("white", BackgroundColor { r: 255, g: 255, b: 255 }),
    ("black", BackgroundColor { r: 0, g: 0, b: 0 }),
    ("red", BackgroundColor { r: 255, g: 0, b: 0 }),
    ("lime", BackgroundColor { r: 0, g: 255, b: 0 }),
    ("green", BackgroundColor { r: 0, g: 128, b: 0 }),
    ("blue", BackgroundColor { r: 0, g: 0, b: 255 }),
    ("yellow", BackgroundColor { r: 255, g: 255, b: 0 }),
    ("cyan", BackgroundColor { r: 0, g: 255, b: 255 }),
    ("magenta", BackgroundColor { r: 255, g: 0, b: 255 }),
    ("gray", BackgroundColor { r: 128, g: 128, b: 128 }),
];

/// Preset swatches offered by the background picker, transparent first
pub const PRESET_COLORS: &[&str] = &[
    "transparent",
    "#ffffff",
    "#000000",
    "#ff0000",
    "#00ff00",
    "#0000ff",
    "#ffff00",
    "#00ffff",
    "#ff00ff",
    "#f3f4f6",
    "#d1d5db",
    "#9ca3af",
    "#4b5563",
    "#1f2937",
    "#fcd34d",
    "#f87171",
    "#60a5fa",
    "#34d399",
];

/// Utility for parsing and converting colors
pub struct ColorParser;

impl ColorParser {
    /// Parse a CSS-style color string
    ///
    /// Accepts `transparent`, `#RRGGBB`, `#RGB` and a few named colors,
    /// case-insensitively and ignoring surrounding whitespace.
    ///
    /// # Examples
    /// ```rust
    /// use bgrefine::{utils::ColorParser, ColorValue};
    ///
    /// assert!(ColorParser::parse("transparent")?.is_transparent());
    /// assert!(matches!(ColorParser::parse("#f00")?, ColorValue::Solid(_)));
    /// # Ok::<(), bgrefine::RefineError>(())
    /// ```
    pub fn parse(value: &str) -> Result<ColorValue> {
        let normalized = value.trim().to_ascii_lowercase();

        if normalized == "transparent" {
            return Ok(ColorValue::Transparent);
        }

        if let Some((_, color)) = NAMED_COLORS.iter().find(|(name, _)| *name == normalized) {
            return Ok(ColorValue::Solid(*color));
        }

        if normalized.starts_with('#') {
            return Self::parse_hex(&normalized).map(ColorValue::Solid);
        }

        Err(RefineError::invalid_color(format!(
            "'{}' is not a hex color, a named color or 'transparent'",
            value
        )))
    }

    /// Parse a hex color string to `BackgroundColor`
    ///
    /// Supports both #RRGGBB and #RGB formats, with or without the `#` prefix.
    pub fn parse_hex(hex: &str) -> Result<BackgroundColor> {
        let hex = hex.trim_start_matches('#');

        if !Self::is_valid_hex(hex) {
            return Err(RefineError::invalid_color(format!(
                "'#{}' must be in #RRGGBB or #RGB format",
                hex
            )));
        }

        let component = |range: std::ops::Range<usize>| -> Result<u8> {
            let digits = hex
                .get(range)
                .ok_or_else(|| RefineError::invalid_color(hex.to_string()))?;
            u8::from_str_radix(digits, 16).map_err(|_| RefineError::invalid_color(hex.to_string()))
        };

        if hex.len() == 6 {
            Ok(BackgroundColor::new(
                component(0..2)?,
                component(2..4)?,
                component(4..6)?,
            ))
        } else {
            // Expand #RGB to #RRGGBB
            Ok(BackgroundColor::new(
                component(0..1)? * 17,
                component(1..2)? * 17,
                component(2..3)? * 17,
            ))
        }
    }

    /// Convert `BackgroundColor` to hex string
    pub fn to_hex(color: &BackgroundColor, include_hash: bool) -> String {
        if include_hash {
            format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
        } else {
            format!("{:02x}{:02x}{:02x}", color.r, color.g, color.b)
        }
    }

    /// Validate hex color format without parsing
    pub fn is_valid_hex(hex: &str) -> bool {
        let hex = hex.trim_start_matches('#');

        if hex.len() != 3 && hex.len() != 6 {
            return false;
        }

        hex.chars().all(|c| c.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6_digit() {
        let red = ColorParser::parse_hex("#ff0000").unwrap();
        assert_eq!(red, BackgroundColor::new(255, 0, 0));

        let blue = ColorParser::parse_hex("0000ff").unwrap();
        assert_eq!(blue, BackgroundColor::new(0, 0, 255));
    }

    #[test]
    fn test_parse_hex_3_digit() {
        let white = ColorParser::parse_hex("#fff").unwrap();
        assert_eq!(white, BackgroundColor::white());

        let red = ColorParser::parse_hex("#f00").unwrap();
        assert_eq!(red, BackgroundColor::new(255, 0, 0));
    }

    #[test]
    fn test_parse_hex_invalid() {
        assert!(ColorParser::parse_hex("#gggggg").is_err());
        assert!(ColorParser::parse_hex("#ff").is_err());
        assert!(ColorParser::parse_hex("#fffffff").is_err());
    }

    #[test]
    fn test_parse_css_values() {
        assert_eq!(ColorParser::parse("transparent").unwrap(), ColorValue::Transparent);
        assert_eq!(ColorParser::parse("  Transparent ").unwrap(), ColorValue::Transparent);
        assert_eq!(
            ColorParser::parse("White").unwrap(),
            ColorValue::Solid(BackgroundColor::white())
        );
        assert_eq!(
            ColorParser::parse("#1F2937").unwrap(),
            ColorValue::Solid(BackgroundColor::new(0x1f, 0x29, 0x37))
        );
        assert!(ColorParser::parse("ff0000").is_err());
        assert!(ColorParser::parse("rgb(1,2,3)").is_err());
    }

    #[test]
    fn test_presets_all_parse() {
        for preset in PRESET_COLORS {
            assert!(ColorParser::parse(preset).is_ok(), "preset {preset} failed");
        }
        assert_eq!(PRESET_COLORS.first(), Some(&"transparent"));
    }

    #[test]
    fn test_to_hex() {
        let color = BackgroundColor::new(255, 128, 0);
        assert_eq!(ColorParser::to_hex(&color, true), "#ff8000");
        assert_eq!(ColorParser::to_hex(&color, false), "ff8000");
    }

    #[test]
    fn test_is_valid_hex() {
        assert!(ColorParser::is_valid_hex("#ffffff"));
        assert!(ColorParser::is_valid_hex("fff"));
        assert!(!ColorParser::is_valid_hex("#gggggg"));
        assert!(!ColorParser::is_valid_hex("#ff"));
    }
}
