//! Caption styling.

use autovideo_ai::LanguageModel;
use autovideo_models::{wrap_caption, CaptionPosition, CaptionStyle, FontMood, HexColor};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::StylingFailure;

/// Prompt asking the model for a caption style.
pub fn styling_prompt(text: &str, genre: &str) -> String {
    format!(
        "Analyze this sentence for a video in the '{genre}' genre: \"{text}\" \
         Determine the best subtitle styling. Respond ONLY with a JSON object (no markdown) \
         with these keys: \
         - \"color\": Hex code (e.g., #FFFFFF) that contrasts well with the mood. \
         - \"position\": \"center\", \"bottom\", or \"top\". \
         - \"font_mood\": \"bold\", \"playful\", or \"elegant\"."
    )
}

/// Read a style out of the model's JSON answer.
///
/// `color` and `position` are required; `font_mood` defaults to bold.
/// Unknown positions and moods map to their defaults.
pub fn parse_style(value: &Value) -> Result<CaptionStyle, StylingFailure> {
    let object = value
        .as_object()
        .ok_or_else(|| StylingFailure::Malformed("expected a JSON object".into()))?;

    let color = object
        .get("color")
        .and_then(Value::as_str)
        .ok_or_else(|| StylingFailure::Malformed("missing color".into()))?;
    let color: HexColor = color
        .parse()
        .map_err(|e| StylingFailure::Malformed(format!("{e}")))?;

    let position = object
        .get("position")
        .and_then(Value::as_str)
        .ok_or_else(|| StylingFailure::Malformed("missing position".into()))?;

    let font_mood = object
        .get("font_mood")
        .and_then(Value::as_str)
        .map(FontMood::parse_lenient)
        .unwrap_or_default();

    Ok(CaptionStyle {
        color,
        position: CaptionPosition::parse_lenient(position),
        font_mood,
    })
}

/// Caption text reflowed to `width` characters per line.
pub fn caption_text(text: &str, width: usize) -> String {
    wrap_caption(text, width).join("\n")
}

/// Derives caption styles from the language model, when one is configured.
#[derive(Clone, Default)]
pub struct CaptionStyler {
    model: Option<Arc<dyn LanguageModel>>,
}

impl CaptionStyler {
    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { model }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Ask the model for a style. Callers fall back to the default on error.
    pub async fn style(&self, text: &str, genre: &str) -> Result<CaptionStyle, StylingFailure> {
        let model = self.model.as_ref().ok_or(StylingFailure::NotConfigured)?;
        let value = model.complete_json(&styling_prompt(text, genre)).await?;
        let style = parse_style(&value)?;
        debug!(
            color = %style.color,
            position = style.position.as_str(),
            font_mood = style.font_mood.as_str(),
            "Caption style derived"
        );
        Ok(style)
    }
}
