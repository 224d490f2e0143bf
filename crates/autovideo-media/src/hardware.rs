//! Graphics hardware and encoder discovery.

use async_trait::async_trait;
use autovideo_models::{DeviceClass, HardwareProfile};
use std::collections::BTreeSet;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Source of hardware facts for encoder selection.
#[async_trait]
pub trait HardwareProbe: Send + Sync {
    /// Classify the primary graphics device.
    async fn detect_device_class(&self) -> DeviceClass;

    /// Encoder names the local FFmpeg build offers.
    async fn available_encoders(&self) -> BTreeSet<String>;

    /// Probe both facts once.
    async fn profile(&self) -> HardwareProfile {
        let (device, encoders) =
            tokio::join!(self.detect_device_class(), self.available_encoders());
        let profile = HardwareProfile::new(device, encoders);
        info!(
            device = %profile.device,
            encoder_count = profile.encoders.len(),
            "Hardware profile detected"
        );
        profile
    }
}

/// Probe using `nvidia-smi`, the platform device listing and `ffmpeg -encoders`.
#[derive(Debug, Clone)]
pub struct SystemHardwareProbe {
    ffmpeg_binary: String,
}

impl Default for SystemHardwareProbe {
    fn default() -> Self {
        Self {
            ffmpeg_binary: "ffmpeg".to_string(),
        }
    }
}

impl SystemHardwareProbe {
    pub fn new() -> Self {
        Self::default()
    }

    async fn platform_listing(&self) -> Option<String> {
        if cfg!(target_os = "windows") {
            command_stdout("wmic", &["path", "win32_VideoController", "get", "name"]).await
        } else if cfg!(target_os = "macos") {
            command_stdout("system_profiler", &["SPDisplaysDataType"]).await
        } else {
            command_stdout("lspci", &[]).await.map(|out| display_controller_lines(&out))
        }
    }
}

#[async_trait]
impl HardwareProbe for SystemHardwareProbe {
    async fn detect_device_class(&self) -> DeviceClass {
        if let Some(out) = command_stdout("nvidia-smi", &["-L"]).await {
            if out.to_lowercase().contains("gpu") {
                debug!("nvidia-smi reported a GPU");
                return DeviceClass::GpuNvidia;
            }
        }

        match self.platform_listing().await {
            Some(listing) => classify_gpu_listing(&listing),
            None => DeviceClass::Cpu,
        }
    }

    async fn available_encoders(&self) -> BTreeSet<String> {
        command_stdout(&self.ffmpeg_binary, &["-hide_banner", "-encoders"])
            .await
            .map(|out| parse_encoder_list(&out))
            .unwrap_or_default()
    }
}

/// Run a command and return stdout when it exits successfully.
async fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        debug!(program, status = %output.status, "Hardware listing command failed");
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Keep only display controller rows of `lspci` output.
///
/// Host bridges name the CPU vendor and must not be read as a GPU.
fn display_controller_lines(lspci: &str) -> String {
    lspci
        .lines()
        .filter(|l| {
            let l = l.to_lowercase();
            l.contains("vga") || l.contains("3d controller") || l.contains("display controller")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classify a device listing by vendor keywords.
pub fn classify_gpu_listing(listing: &str) -> DeviceClass {
    let text = listing.to_lowercase();
    if text.contains("nvidia") {
        DeviceClass::GpuNvidia
    } else if text.contains("amd") || text.contains("radeon") {
        DeviceClass::GpuAmd
    } else if text.contains("intel")
        && ["iris", "arc", "uhd", "hd graphics"].iter().any(|k| text.contains(k))
    {
        DeviceClass::GpuIntel
    } else {
        DeviceClass::Cpu
    }
}

/// Parse encoder names from `ffmpeg -encoders` output.
pub fn parse_encoder_list(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            (flags.len() == 6).then(|| name.to_string())
        })
        .collect()
}
