//! Per-scene visual assets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// An RGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// FFmpeg color notation (`0xRRGGBB`).
    pub fn to_ffmpeg(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Dark slate used when no other visual can be sourced.
pub const PLACEHOLDER_COLOR: Rgb = Rgb(20, 20, 30);

/// Which rung of the sourcing ladder produced a visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisualKind {
    Stock,
    AiImage,
    Placeholder,
}

impl VisualKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualKind::Stock => "stock",
            VisualKind::AiImage => "ai_image",
            VisualKind::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for VisualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The visual chosen for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualAsset {
    /// Downloaded stock footage
    Stock {
        source_url: String,
        local_path: PathBuf,
    },
    /// Generated still image
    AiImage { prompt: String, local_path: PathBuf },
    /// Flat color fill
    ColorPlaceholder { color: Rgb },
}

impl VisualAsset {
    pub fn placeholder() -> Self {
        VisualAsset::ColorPlaceholder {
            color: PLACEHOLDER_COLOR,
        }
    }

    pub fn kind(&self) -> VisualKind {
        match self {
            VisualAsset::Stock { .. } => VisualKind::Stock,
            VisualAsset::AiImage { .. } => VisualKind::AiImage,
            VisualAsset::ColorPlaceholder { .. } => VisualKind::Placeholder,
        }
    }

    /// Local media file backing this asset, if any.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            VisualAsset::Stock { local_path, .. } | VisualAsset::AiImage { local_path, .. } => {
                Some(local_path)
            }
            VisualAsset::ColorPlaceholder { .. } => None,
        }
    }

    /// Whether the asset is a still image that must be held for the scene.
    pub fn is_still(&self) -> bool {
        matches!(self, VisualAsset::AiImage { .. })
    }
}
