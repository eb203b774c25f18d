use anyhow::Context;
use screenguide_audio::FfmpegTranscoder;
use screenguide_engine::traits::{AudioInput, AudioTranscoder, AudioUpload};

/// Engine adapter over the ffmpeg/WAV transcoder.
#[derive(Debug, Clone, Default)]
pub struct FfmpegAudioTranscoder {
    inner: FfmpegTranscoder,
}

impl FfmpegAudioTranscoder {
    pub fn new(inner: FfmpegTranscoder) -> Self {
        Self { inner }
    }

    pub fn from_env() -> Self {
        Self::new(FfmpegTranscoder::from_env())
    }
}

#[async_trait::async_trait]
impl AudioTranscoder for FfmpegAudioTranscoder {
    async fn to_mono_16k(&self, upload: &AudioUpload) -> anyhow::Result<AudioInput> {
        let decoded = self
            .inner
            .to_mono_16k(&upload.bytes, upload.file_name.as_deref())
            .await
            .with_context(|| {
                format!(
                    "transcode upload ({} bytes, {})",
                    upload.bytes.len(),
                    upload.content_type.as_deref().unwrap_or("unknown type")
                )
            })?;
        Ok(AudioInput {
            sample_rate_hz: decoded.sample_rate_hz,
            samples: decoded.samples,
        })
    }
}
