//! Caption styling types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default caption color (gold).
pub const DEFAULT_CAPTION_COLOR: &str = "#FFD700";

/// Characters per caption line.
pub const CAPTION_LINE_WIDTH: usize = 40;

/// A `#RRGGBB` color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Returns the color as `#RRGGBB` (uppercase).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the color in FFmpeg's `0xRRGGBB` notation.
    pub fn to_ffmpeg(&self) -> String {
        format!("0x{}", &self.0[1..])
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self(DEFAULT_CAPTION_COLOR.to_string())
    }
}

impl FromStr for HexColor {
    type Err = CaptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| CaptionParseError::InvalidColor(s.to_string()))?;
        let expanded = match digits.len() {
            6 => digits.to_string(),
            // #RGB shorthand
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            _ => return Err(CaptionParseError::InvalidColor(s.to_string())),
        };
        if !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CaptionParseError::InvalidColor(s.to_string()));
        }
        Ok(Self(format!("#{}", expanded.to_ascii_uppercase())))
    }
}

impl TryFrom<String> for HexColor {
    type Error = CaptionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vertical anchor of the caption block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPosition {
    Top,
    #[default]
    Center,
    Bottom,
}

impl CaptionPosition {
    /// Lenient parse: anything unrecognized anchors to the center.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => CaptionPosition::Top,
            "bottom" => CaptionPosition::Bottom,
            _ => CaptionPosition::Center,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionPosition::Top => "top",
            CaptionPosition::Center => "center",
            CaptionPosition::Bottom => "bottom",
        }
    }
}

impl fmt::Display for CaptionPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typographic mood of the caption.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FontMood {
    #[default]
    Bold,
    Playful,
    Elegant,
}

impl FontMood {
    /// Lenient parse: unrecognized moods use the bold family.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "playful" => FontMood::Playful,
            "elegant" => FontMood::Elegant,
            _ => FontMood::Bold,
        }
    }

    /// Font family used to render this mood.
    pub fn font_family(&self) -> &'static str {
        match self {
            FontMood::Bold => "Arial",
            FontMood::Playful => "Comic Sans MS",
            FontMood::Elegant => "Georgia",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FontMood::Bold => "bold",
            FontMood::Playful => "playful",
            FontMood::Elegant => "elegant",
        }
    }
}

impl fmt::Display for FontMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caption style for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CaptionStyle {
    pub color: HexColor,
    pub position: CaptionPosition,
    pub font_mood: FontMood,
}

impl CaptionStyle {
    /// Whether this is the fixed fallback style.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Error)]
pub enum CaptionParseError {
    #[error("Invalid hex color: {0}")]
    InvalidColor(String),
}

/// Reflow caption text into lines of at most `width` characters.
///
/// Words are kept whole where possible; a word longer than `width` is split.
pub fn wrap_caption(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        if word.is_empty() {
            continue;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}
