//! FFmpeg filter construction for scene rendering.

use autovideo_models::caption::CAPTION_LINE_WIDTH;
use autovideo_models::{AspectRatio, CaptionPosition, CaptionStyle, FrameSize, Rgb};
use std::path::Path;

/// Horizontal room kept free around caption lines, in pixels.
pub const CAPTION_SIDE_PADDING: u32 = 200;
/// Distance from the frame edge for top and bottom captions.
pub const CAPTION_EDGE_MARGIN: u32 = 60;
/// Caption outline width.
pub const CAPTION_BORDER_WIDTH: u32 = 3;
/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.55;

/// Scale to cover the frame (aspect preserved), then crop to size.
///
/// The crop is horizontally centered and anchored at the top edge.
pub fn cover_crop(frame: FrameSize) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}:(iw-{w})/2:0,setsar=1",
        w = frame.width,
        h = frame.height
    )
}

/// Lavfi source for a flat color frame.
pub fn color_source(color: Rgb, frame: FrameSize, fps: u32, duration: f64) -> String {
    format!(
        "color=c={}:s={}:r={}:d={:.3}",
        color.to_ffmpeg(),
        frame,
        fps,
        duration
    )
}

/// Caption font size for an aspect ratio, reduced when a full line would not fit.
pub fn caption_font_size(aspect: AspectRatio) -> u32 {
    let base = match aspect {
        AspectRatio::Landscape => 80,
        AspectRatio::Portrait => 60,
    };
    let frame = aspect.frame_size();
    let usable = frame.width.saturating_sub(CAPTION_SIDE_PADDING) as f64;
    let fitting = (usable / (CAPTION_LINE_WIDTH as f64 * GLYPH_WIDTH_RATIO)).floor() as u32;
    base.min(fitting).max(1)
}

/// Vertical placement expression for a caption block.
fn caption_y(position: CaptionPosition) -> String {
    match position {
        CaptionPosition::Top => CAPTION_EDGE_MARGIN.to_string(),
        CaptionPosition::Center => "(h-text_h)/2".to_string(),
        CaptionPosition::Bottom => format!("h-text_h-{}", CAPTION_EDGE_MARGIN),
    }
}

/// `drawtext` filter reading caption text from a file.
///
/// Text comes from a file with expansion disabled so script punctuation never
/// needs escaping.
pub fn caption_drawtext(text_file: &Path, style: &CaptionStyle, font_size: u32) -> String {
    format!(
        "drawtext=textfile={file}:expansion=none:font={font}:fontsize={size}:\
         fontcolor={color}:borderw={border}:bordercolor=black:line_spacing={spacing}:\
         x=(w-text_w)/2:y={y}",
        file = quote_filter_value(&text_file.to_string_lossy()),
        font = quote_filter_value(style.font_mood.font_family()),
        size = font_size,
        color = style.color.to_ffmpeg(),
        border = CAPTION_BORDER_WIDTH,
        spacing = font_size / 4,
        y = caption_y(style.position),
    )
}

/// Single-quote a filter option value.
pub fn quote_filter_value(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// `tpad` filter holding the last frame for `seconds`.
pub fn hold_last_frame(seconds: f64) -> String {
    format!("tpad=stop_mode=clone:stop_duration={:.3}", seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autovideo_models::{FontMood, HexColor};
    use std::path::PathBuf;

    #[test]
    fn test_cover_crop_landscape() {
        let filter = cover_crop(FrameSize::new(1920, 1080));
        assert_eq!(
            filter,
            "scale=1920:1080:force_original_aspect_ratio=increase,crop=1920:1080:(iw-1920)/2:0,setsar=1"
        );
    }

    #[test]
    fn test_color_source() {
        let src = color_source(Rgb(20, 20, 30), FrameSize::new(1080, 1920), 24, 2.0);
        assert_eq!(src, "color=c=0x14141E:s=1080x1920:r=24:d=2.000");
    }

    #[test]
    fn test_font_size_fits_caption_width() {
        for aspect in AspectRatio::ALL {
            let size = caption_font_size(*aspect);
            let line_px = CAPTION_LINE_WIDTH as f64 * GLYPH_WIDTH_RATIO * size as f64;
            assert!(line_px <= (aspect.frame_size().width - CAPTION_SIDE_PADDING) as f64);
        }
        assert!(caption_font_size(AspectRatio::Landscape) <= 80);
        assert!(caption_font_size(AspectRatio::Portrait) <= 60);
        assert!(caption_font_size(AspectRatio::Landscape) > caption_font_size(AspectRatio::Portrait));
    }

    #[test]
    fn test_caption_drawtext_default_style() {
        let filter = caption_drawtext(&PathBuf::from("/tmp/job/caption_000.txt"), &CaptionStyle::default(), 78);
        assert!(filter.starts_with("drawtext=textfile='/tmp/job/caption_000.txt'"));
        assert!(filter.contains("font='Arial'"));
        assert!(filter.contains("fontcolor=0xFFD700"));
        assert!(filter.contains("borderw=3:bordercolor=black"));
        assert!(filter.contains("x=(w-text_w)/2:y=(h-text_h)/2"));
    }

    #[test]
    fn test_caption_positions() {
        let style = CaptionStyle {
            color: "#FFFFFF".parse::<HexColor>().unwrap(),
            position: CaptionPosition::Bottom,
            font_mood: FontMood::Playful,
        };
        let filter = caption_drawtext(Path::new("c.txt"), &style, 40);
        assert!(filter.contains("y=h-text_h-60"));
        assert!(filter.contains("font='Comic Sans MS'"));
        assert_eq!(caption_y(CaptionPosition::Top), "60");
    }

    #[test]
    fn test_quote_filter_value() {
        assert_eq!(quote_filter_value("a:b"), "'a:b'");
        assert_eq!(quote_filter_value("it's"), "'it'\\''s'");
    }

    #[test]
    fn test_hold_last_frame() {
        assert_eq!(hold_last_frame(0.25), "tpad=stop_mode=clone:stop_duration=0.250");
    }
}
