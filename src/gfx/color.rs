//! sRGB color values as edited by the configurator panels
//!
//! Colors travel through the parameter registry as hex strings (`"#ff8800"`),
//! so this module owns parsing and formatting between the string form and the
//! float components stored on materials.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Error returned when a string is not a recognised hex color
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color '{0}', expected #rrggbb, #rgb or 0xrrggbb")]
pub struct ParseColorError(pub String);

/// RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from a packed `0xrrggbb` value
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Packs the color into `0xrrggbb`, clamping out-of-range components
    pub fn to_hex(&self) -> u32 {
        let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Lowercase six digit hex without prefix, e.g. `"ff8800"`
    pub fn to_hex_string(&self) -> String {
        format!("{:06x}", self.to_hex())
    }

    /// Hex string with a leading `#`, the form used by color parameters
    pub fn to_css(&self) -> String {
        format!("#{}", self.to_hex_string())
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_array(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_string()));
        }

        let expanded = match digits.len() {
            6 => digits.to_string(),
            // #rgb shorthand doubles every digit
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            _ => return Err(ParseColorError(s.to_string())),
        };

        u32::from_str_radix(&expanded, 16)
            .map(Color::from_hex)
            .map_err(|_| ParseColorError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_forms() {
        let long: Color = "#ff8800".parse().unwrap();
        let short: Color = "#f80".parse().unwrap();
        let bare: Color = "FF8800".parse().unwrap();
        let prefixed: Color = "0xff8800".parse().unwrap();

        assert_eq!(long.to_hex(), 0xff8800);
        assert_eq!(short.to_hex(), 0xff8800);
        assert_eq!(bare, long);
        assert_eq!(prefixed, long);
    }

    #[test]
    fn rejects_garbage() {
        assert!("#ff88".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
        assert!("".parse::<Color>().is_err());
    }

    #[test]
    fn formats_as_css_hex() {
        assert_eq!(Color::from_hex(0x1a2b3c).to_css(), "#1a2b3c");
        assert_eq!(Color::new(2.0, -1.0, 0.0).to_hex_string(), "ff0000");
    }
}
