use crate::error::AudioError;
use crate::resample::resample_mono_f32;
use crate::wav::{DecodedAudio, decode_wav, is_wav};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

pub const TARGET_SAMPLE_RATE_HZ: u32 = 16_000;

pub const FFMPEG_ENV: &str = "SCREENGUIDE_FFMPEG";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Converts uploaded recordings to mono 16 kHz PCM.
///
/// Well-formed WAV input is decoded in process; anything else (m4a, 3gp, ogg,
/// webm, ...) goes through an `ffmpeg` subprocess inside a private temp dir that
/// is removed when the call returns.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// `$SCREENGUIDE_FFMPEG` when set, otherwise `ffmpeg` from `PATH`.
    pub fn from_env() -> Self {
        match std::env::var(FFMPEG_ENV) {
            Ok(v) if !v.trim().is_empty() => Self::new(v.trim()),
            _ => Self::default(),
        }
    }

    pub async fn to_mono_16k(
        &self,
        bytes: &[u8],
        file_name_hint: Option<&str>,
    ) -> Result<DecodedAudio, AudioError> {
        if bytes.is_empty() {
            return Err(AudioError::Empty);
        }

        if is_wav(bytes) {
            match decode_wav(bytes) {
                Ok(decoded) => return to_target_rate(decoded),
                Err(e) => log::debug!("in-process wav decode failed, using ffmpeg: {e}"),
            }
        }

        let decoded = self.run_ffmpeg(bytes, file_name_hint).await?;
        to_target_rate(decoded)
    }

    async fn run_ffmpeg(
        &self,
        bytes: &[u8],
        file_name_hint: Option<&str>,
    ) -> Result<DecodedAudio, AudioError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join(format!("input.{}", extension_hint(file_name_hint)));
        let output = dir.path().join("output.wav");
        tokio::fs::write(&input, bytes).await?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-y")
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(&input)
            .args(["-vn", "-ac", "1", "-ar"])
            .arg(TARGET_SAMPLE_RATE_HZ.to_string())
            .args(["-f", "wav"])
            .arg(&output)
            .kill_on_drop(true);

        let run = tokio::time::timeout(self.timeout, cmd.output()).await;
        let out = match run {
            Ok(Ok(out)) => out,
            Ok(Err(source)) => {
                return Err(AudioError::Spawn {
                    binary: self.binary.display().to_string(),
                    source,
                });
            }
            Err(_) => return Err(AudioError::Timeout(self.timeout.as_secs())),
        };

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(AudioError::Ffmpeg {
                status: out.status.to_string(),
                stderr: stderr.trim().chars().take(512).collect(),
            });
        }

        let wav = tokio::fs::read(&output).await?;
        decode_wav(&wav)
    }
}

fn to_target_rate(decoded: DecodedAudio) -> Result<DecodedAudio, AudioError> {
    if decoded.sample_rate_hz == TARGET_SAMPLE_RATE_HZ {
        return Ok(decoded);
    }
    let samples = resample_mono_f32(
        &decoded.samples,
        decoded.sample_rate_hz,
        TARGET_SAMPLE_RATE_HZ,
    )
    .map_err(|e| AudioError::Resample(format!("{e:#}")))?;
    Ok(DecodedAudio {
        sample_rate_hz: TARGET_SAMPLE_RATE_HZ,
        samples,
    })
}

// Only a format hint for ffmpeg; never a path component from the client.
fn extension_hint(file_name: Option<&str>) -> String {
    file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::encode_wav_mono_pcm16;

    #[test]
    fn extension_hint_is_sanitized() {
        assert_eq!(extension_hint(Some("voice.M4A")), "m4a");
        assert_eq!(extension_hint(Some("../../etc/passwd")), "bin");
        assert_eq!(extension_hint(Some("a.tar/../x")), "bin");
        assert_eq!(extension_hint(None), "bin");
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let err = FfmpegTranscoder::default().to_mono_16k(&[], None).await.unwrap_err();
        assert!(matches!(err, AudioError::Empty));
    }

    #[tokio::test]
    async fn wav_at_target_rate_skips_ffmpeg() {
        let wav = encode_wav_mono_pcm16(&[0.1; 1600], TARGET_SAMPLE_RATE_HZ);
        // A missing binary proves the subprocess path is never taken.
        let t = FfmpegTranscoder::new("/nonexistent/ffmpeg");
        let out = t.to_mono_16k(&wav, Some("voice.wav")).await.unwrap();
        assert_eq!(out.sample_rate_hz, TARGET_SAMPLE_RATE_HZ);
        assert_eq!(out.samples.len(), 1600);
    }

    #[tokio::test]
    async fn wav_at_other_rate_is_resampled() {
        let wav = encode_wav_mono_pcm16(&vec![0.0; 8_000], 8_000);
        let t = FfmpegTranscoder::new("/nonexistent/ffmpeg");
        let out = t.to_mono_16k(&wav, None).await.unwrap();
        assert_eq!(out.sample_rate_hz, TARGET_SAMPLE_RATE_HZ);
        assert!(out.samples.len() > 14_000);
    }

    #[tokio::test]
    async fn missing_binary_reports_spawn_error() {
        let t = FfmpegTranscoder::new("/nonexistent/ffmpeg");
        let err = t
            .to_mono_16k(b"\x00\x00\x00\x18ftypM4A ", Some("voice.m4a"))
            .await
            .unwrap_err();
        assert!(matches!(err, AudioError::Spawn { .. }), "{err}");
    }
}
