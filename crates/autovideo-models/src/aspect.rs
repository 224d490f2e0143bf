//! Output aspect ratio and frame geometry.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pixel dimensions of an output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true when the frame is taller than it is wide.
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Supported output aspect ratios.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
pub enum AspectRatio {
    /// 16:9 landscape, rendered at 1920x1080
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait, rendered at 1080x1920
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub const ALL: &'static [AspectRatio] = &[AspectRatio::Landscape, AspectRatio::Portrait];

    /// Target frame size for this aspect ratio.
    pub const fn frame_size(&self) -> FrameSize {
        match self {
            AspectRatio::Landscape => FrameSize::new(1920, 1080),
            AspectRatio::Portrait => FrameSize::new(1080, 1920),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            other => Err(AspectRatioParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unsupported aspect ratio: {0}, expected '16:9' or '9:16'")]
pub struct AspectRatioParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_sizes() {
        assert_eq!(AspectRatio::Landscape.frame_size(), FrameSize::new(1920, 1080));
        assert_eq!(AspectRatio::Portrait.frame_size(), FrameSize::new(1080, 1920));
        assert!(AspectRatio::Portrait.frame_size().is_portrait());
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape);
        assert_eq!(" 9:16 ".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert!("4:3".parse::<AspectRatio>().is_err());
        assert_eq!(AspectRatio::Portrait.to_string(), "9:16");
    }

    #[test]
    fn test_serde_uses_ratio_strings() {
        let json = serde_json::to_string(&AspectRatio::Portrait).unwrap();
        assert_eq!(json, "\"9:16\"");
        let parsed: AspectRatio = serde_json::from_str("\"16:9\"").unwrap();
        assert_eq!(parsed, AspectRatio::Landscape);
    }
}
