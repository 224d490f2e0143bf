//! Narration and background music mixing.

use std::path::PathBuf;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Codec of the mixed intermediate track.
const MIX_CODEC: &str = "pcm_s16le";

/// How the music is fitted to the narration length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicFit {
    /// Music is shorter; repeat it
    Loop,
    /// Music is at least as long; cut it
    Trim,
}

impl MusicFit {
    pub fn for_durations(music: f64, target: f64) -> Self {
        if music < target {
            MusicFit::Loop
        } else {
            MusicFit::Trim
        }
    }
}

/// Background music to lay under the narration.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundMusic {
    pub path: PathBuf,
    /// Probed music duration in seconds
    pub duration: f64,
    /// Gain applied to the music (0..=1)
    pub volume: f64,
}

/// Inputs for one mix.
#[derive(Debug, Clone, PartialEq)]
pub struct MixRequest {
    pub narration: PathBuf,
    pub music: Option<BackgroundMusic>,
    /// Total duration of the mixed track
    pub duration: f64,
    pub output: PathBuf,
}

/// Build the mix command; `None` when there is nothing to mix.
pub fn build_mix_command(req: &MixRequest) -> Option<FfmpegCommand> {
    let music = req.music.as_ref()?;
    let volume = music.volume.clamp(0.0, 1.0);

    let cmd = FfmpegCommand::new(&req.output)
        .operation("audio_mix")
        .input(&req.narration);
    let cmd = match MusicFit::for_durations(music.duration, req.duration) {
        MusicFit::Loop => cmd.looped_input(&music.path),
        MusicFit::Trim => cmd.input(&music.path),
    };

    let graph = format!(
        "[1:a]atrim=0:{d:.3},asetpts=PTS-STARTPTS,volume={v:.3}[bg];\
         [0:a][bg]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[aout]",
        d = req.duration,
        v = volume
    );

    Some(
        cmd.filter_complex(graph)
            .map("[aout]")
            .duration(req.duration)
            .audio_codec(MIX_CODEC),
    )
}

/// Mix narration with optional music.
///
/// Returns the narration path unchanged when there is no music.
pub async fn mix_audio(runner: &FfmpegRunner, req: &MixRequest) -> MediaResult<PathBuf> {
    let Some(cmd) = build_mix_command(req) else {
        return Ok(req.narration.clone());
    };
    runner.run(&cmd).await?;
    debug!(output = %req.output.display(), "Mixed background music under narration");
    Ok(req.output.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(music: Option<BackgroundMusic>) -> MixRequest {
        MixRequest {
            narration: PathBuf::from("/tmp/job/narration.mp3"),
            music,
            duration: 10.0,
            output: PathBuf::from("/tmp/job/mixed.wav"),
        }
    }

    #[test]
    fn test_music_fit() {
        assert_eq!(MusicFit::for_durations(4.0, 10.0), MusicFit::Loop);
        assert_eq!(MusicFit::for_durations(10.0, 10.0), MusicFit::Trim);
        assert_eq!(MusicFit::for_durations(30.0, 10.0), MusicFit::Trim);
    }

    #[test]
    fn test_no_music_no_command() {
        assert!(build_mix_command(&request(None)).is_none());
    }

    #[tokio::test]
    async fn test_no_music_passes_narration_through() {
        let out = mix_audio(&FfmpegRunner::new(), &request(None)).await.unwrap();
        assert_eq!(out, PathBuf::from("/tmp/job/narration.mp3"));
    }

    #[test]
    fn test_short_music_is_looped_and_scaled() {
        let cmd = build_mix_command(&request(Some(BackgroundMusic {
            path: PathBuf::from("/tmp/job/music.mp3"),
            duration: 4.0,
            volume: 0.2,
        })))
        .unwrap();
        let args = cmd.build_args().join(" ");
        assert!(args.contains("-stream_loop -1 -i /tmp/job/music.mp3"));
        assert!(args.contains("volume=0.200"));
        assert!(args.contains("amix=inputs=2:duration=first:dropout_transition=0:normalize=0"));
        assert!(args.contains("-map [aout] -t 10.000 -c:a pcm_s16le"));
    }

    #[test]
    fn test_long_music_is_trimmed_and_volume_clamped() {
        let cmd = build_mix_command(&request(Some(BackgroundMusic {
            path: PathBuf::from("/tmp/job/music.mp3"),
            duration: 60.0,
            volume: 3.0,
        })))
        .unwrap();
        let args = cmd.build_args().join(" ");
        assert!(!args.contains("-stream_loop"));
        assert!(args.contains("atrim=0:10.000"));
        assert!(args.contains("volume=1.000"));
    }
}
