//! Category to colour lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::token::TokenCategory;

/// An sRGB colour with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Builds an opaque colour from `0xRRGGBB`.
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }
}

/// Errors from parsing a colour string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("colour `{0}` must start with '#'")]
    MissingHash(String),

    #[error("colour `{0}` must have 6 or 8 hex digits")]
    BadLength(String),

    #[error("colour `{0}` contains a non-hex digit")]
    BadDigit(String),
}

impl FromStr for Color {
    type Err = ColorError;

    /// Parses `#RRGGBB` or `#RRGGBBAA`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(s.to_string()))?;
        if digits.len() != 6 && digits.len() != 8 {
            return Err(ColorError::BadLength(s.to_string()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorError::BadDigit(s.to_string()));
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
        let parse = || -> Result<Color, std::num::ParseIntError> {
            let a = if digits.len() == 8 { channel(6)? } else { 0xFF };
            Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, a))
        };
        parse().map_err(|_| ColorError::BadDigit(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 0xFF {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Per-category colours, indexed by [`TokenCategory::index`].
///
/// Categories without an entry render with the widget's default foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleMap {
    colors: [Option<Color>; TokenCategory::COUNT],
}

impl StyleMap {
    /// An empty map: every category uses the default foreground.
    pub fn empty() -> Self {
        Self {
            colors: [None; TokenCategory::COUNT],
        }
    }

    /// The built-in palette.
    pub fn default_palette() -> Self {
        let mut map = Self::empty();
        map.set(TokenCategory::NumericLiteral, Color::from_hex(0xFFEE98));
        map.set(TokenCategory::Keyword, Color::from_hex(0xFF6600));
        map.set(TokenCategory::Identifier, Color::from_hex(0xFFCC00));
        map.set(TokenCategory::StringLiteral, Color::from_hex(0x66FF00));
        map.set(TokenCategory::Comment, Color::from_hex(0xD174FF));
        map.set(TokenCategory::LineComment, Color::from_hex(0xD174FF));
        map.set(TokenCategory::Error, Color::from_hex(0xFF0000));
        map
    }

    /// Builds a map from user entries.
    ///
    /// No entries means the default palette; any entries replace it entirely.
    /// Later entries for the same category win.
    pub fn from_overrides<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (TokenCategory, Color)>,
    {
        let mut entries = entries.into_iter().peekable();
        if entries.peek().is_none() {
            return Self::default_palette();
        }

        let mut map = Self::empty();
        for (category, color) in entries {
            map.set(category, color);
        }
        map
    }

    /// Assigns `color` to `category`.
    pub fn set(&mut self, category: TokenCategory, color: Color) {
        self.colors[category.index()] = Some(color);
    }

    #[inline]
    pub fn get(&self, category: TokenCategory) -> Option<Color> {
        self.colors[category.index()]
    }

    /// Colour for `category`, or `fallback` when it has none.
    #[inline]
    pub fn color_or(&self, category: TokenCategory, fallback: Color) -> Color {
        self.get(category).unwrap_or(fallback)
    }

    /// Categories that have a colour, in category order.
    pub fn entries(&self) -> impl Iterator<Item = (TokenCategory, Color)> + '_ {
        TokenCategory::ALL
            .into_iter()
            .filter_map(|category| self.get(category).map(|color| (category, color)))
    }
}

impl Default for StyleMap {
    fn default() -> Self {
        Self::default_palette()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!("#FF6600".parse(), Ok(Color::rgb(0xFF, 0x66, 0x00)));
        assert_eq!("#d174ff80".parse(), Ok(Color::rgba(0xD1, 0x74, 0xFF, 0x80)));
        assert_eq!(
            "FF6600".parse::<Color>(),
            Err(ColorError::MissingHash("FF6600".into()))
        );
        assert_eq!(
            "#FFF".parse::<Color>(),
            Err(ColorError::BadLength("#FFF".into()))
        );
        assert_eq!(
            "#GG0000".parse::<Color>(),
            Err(ColorError::BadDigit("#GG0000".into()))
        );
    }

    #[test]
    fn test_display_round_trips() {
        assert_eq!(Color::from_hex(0x66FF00).to_string(), "#66FF00");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_string(), "#01020304");
    }

    #[test]
    fn test_serde_uses_hex_strings() {
        let json = serde_json::to_string(&Color::from_hex(0xFFEE98)).unwrap();
        assert_eq!(json, "\"#FFEE98\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::from_hex(0xFFEE98));
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }

    #[test]
    fn test_default_palette() {
        let map = StyleMap::default_palette();
        assert_eq!(map.get(TokenCategory::Keyword), Some(Color::from_hex(0xFF6600)));
        assert_eq!(map.get(TokenCategory::Comment), map.get(TokenCategory::LineComment));
        assert_eq!(map.get(TokenCategory::Operator), None);
        assert_eq!(map.get(TokenCategory::Other), None);
        assert_eq!(map.entries().count(), 7);
    }

    #[test]
    fn test_empty_overrides_use_default_palette() {
        assert_eq!(StyleMap::from_overrides([]), StyleMap::default_palette());
    }

    #[test]
    fn test_overrides_replace_palette() {
        let map = StyleMap::from_overrides([
            (TokenCategory::Keyword, Color::from_hex(0x0000FF)),
            (TokenCategory::Keyword, Color::from_hex(0x00FF00)),
        ]);

        assert_eq!(map.get(TokenCategory::Keyword), Some(Color::from_hex(0x00FF00)));
        assert_eq!(map.get(TokenCategory::Identifier), None);
        assert_eq!(
            map.color_or(TokenCategory::Identifier, Color::WHITE),
            Color::WHITE
        );
    }
}
