//! Hardware classification and final-encode profiles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Output frame rate for every rendered clip and the final encode.
pub const OUTPUT_FPS: u32 = 24;
/// Audio codec of the final output
pub const OUTPUT_AUDIO_CODEC: &str = "aac";
/// Pixel format of the final output
pub const OUTPUT_PIXEL_FORMAT: &str = "yuv420p";
/// Software fallback codec
pub const SOFTWARE_CODEC: &str = "libx264";
/// Software fallback preset
pub const SOFTWARE_PRESET: &str = "ultrafast";

pub const NVENC_CODEC: &str = "h264_nvenc";
pub const AMF_CODEC: &str = "h264_amf";
pub const QSV_CODEC: &str = "h264_qsv";

/// Detected graphics device class.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    #[default]
    Cpu,
    GpuNvidia,
    GpuAmd,
    GpuIntel,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Cpu => "cpu",
            DeviceClass::GpuNvidia => "gpu_nvidia",
            DeviceClass::GpuAmd => "gpu_amd",
            DeviceClass::GpuIntel => "gpu_intel",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-time hardware probe result for a job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct HardwareProfile {
    pub device: DeviceClass,
    /// Encoder names reported by `ffmpeg -encoders`
    pub encoders: BTreeSet<String>,
}

impl HardwareProfile {
    pub fn new(device: DeviceClass, encoders: BTreeSet<String>) -> Self {
        Self { device, encoders }
    }

    /// CPU-only profile with no hardware encoders.
    pub fn cpu_only() -> Self {
        Self::default()
    }

    pub fn has_encoder(&self, name: &str) -> bool {
        self.encoders.contains(name)
    }
}

/// Encoder family of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EncoderFamily {
    Nvenc,
    Amf,
    Qsv,
    Software,
}

impl EncoderFamily {
    pub fn is_hardware(&self) -> bool {
        !matches!(self, EncoderFamily::Software)
    }
}

/// Codec and parameters for the final encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingProfile {
    pub family: EncoderFamily,
    /// Video codec (e.g., "h264_nvenc", "libx264")
    pub codec: String,
    /// Codec-specific rate control arguments
    pub params: Vec<String>,
    pub audio_codec: String,
    pub fps: u32,
    pub pixel_format: String,
}

impl EncodingProfile {
    fn with(family: EncoderFamily, codec: &str, params: &[&str]) -> Self {
        Self {
            family,
            codec: codec.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            audio_codec: OUTPUT_AUDIO_CODEC.to_string(),
            fps: OUTPUT_FPS,
            pixel_format: OUTPUT_PIXEL_FORMAT.to_string(),
        }
    }

    pub fn nvenc() -> Self {
        Self::with(
            EncoderFamily::Nvenc,
            NVENC_CODEC,
            &["-preset", "p1", "-rc", "constqp", "-qp", "28"],
        )
    }

    pub fn amf() -> Self {
        Self::with(
            EncoderFamily::Amf,
            AMF_CODEC,
            &["-usage", "transcoding", "-rc", "cqp", "-qp_i", "28"],
        )
    }

    pub fn qsv() -> Self {
        Self::with(
            EncoderFamily::Qsv,
            QSV_CODEC,
            &["-global_quality", "28", "-preset", "veryfast"],
        )
    }

    pub fn software() -> Self {
        Self::with(EncoderFamily::Software, SOFTWARE_CODEC, &["-preset", SOFTWARE_PRESET])
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), self.codec.clone()];
        args.extend(self.params.iter().cloned());
        args.extend_from_slice(&[
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
            "-r".to_string(),
            self.fps.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
        ]);
        args
    }
}
