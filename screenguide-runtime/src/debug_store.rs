use anyhow::Context;
use screenguide_audio::encode_wav_mono_pcm16;
use screenguide_core::config::DebugConfig;
use screenguide_core::types::ScreenRepresentation;
use screenguide_engine::error::AssistError;
use screenguide_engine::session::AssistOutcome;
use screenguide_engine::traits::AudioUpload;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static STAMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Persists every request's inputs and results for offline inspection.
///
/// Write failures are logged and swallowed: a full disk must not fail a request.
#[derive(Debug, Clone)]
pub struct DebugStore {
    dir: PathBuf,
}

impl DebugStore {
    pub fn at_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(cfg: &DebugConfig) -> Option<Self> {
        cfg.enabled.then(|| Self::at_dir(&cfg.dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Per-request file suffix, e.g. `20240513_142501_123_0007`.
    ///
    /// The trailing sequence number keeps stamps unique within one process.
    pub fn new_stamp() -> String {
        let seq = STAMP_SEQ.fetch_add(1, Ordering::Relaxed);
        format!("{}_{seq:04}", chrono::Local::now().format("%Y%m%d_%H%M%S_%3f"))
    }

    pub async fn record_request(
        &self,
        stamp: &str,
        audio: &AudioUpload,
        screen: &ScreenRepresentation,
    ) {
        if let Err(e) = self.try_record_request(stamp, audio, screen).await {
            log::warn!("debug store: failed to save request {stamp}: {e:#}");
        }
    }

    pub async fn record_outcome(&self, stamp: &str, outcome: &AssistOutcome) {
        if let Err(e) = self.try_record_outcome(stamp, outcome).await {
            log::warn!("debug store: failed to save outcome {stamp}: {e:#}");
        }
    }

    pub async fn record_error(&self, stamp: &str, err: &AssistError) {
        let body = serde_json::json!({ "error": err.to_string(), "kind": err.kind() });
        let name = format!("error_{stamp}.json");
        if let Err(e) = self.write(&name, body.to_string().as_bytes()).await {
            log::warn!("debug store: failed to save error {stamp}: {e:#}");
        }
    }

    async fn try_record_request(
        &self,
        stamp: &str,
        audio: &AudioUpload,
        screen: &ScreenRepresentation,
    ) -> anyhow::Result<()> {
        let ext = audio
            .file_name
            .as_deref()
            .and_then(extension_of)
            .unwrap_or("bin");
        self.write(&format!("received_voice_{stamp}.{ext}"), &audio.bytes)
            .await?;

        match screen {
            ScreenRepresentation::Image { mime_type, bytes } => {
                let ext = image_extension(mime_type);
                self.write(&format!("received_image_{stamp}.{ext}"), bytes)
                    .await
            }
            ScreenRepresentation::UiTree(tree) => {
                let json = serde_json::to_vec_pretty(tree).context("encode ui tree")?;
                self.write(&format!("ui_data_{stamp}.json"), &json).await
            }
        }
    }

    async fn try_record_outcome(&self, stamp: &str, outcome: &AssistOutcome) -> anyhow::Result<()> {
        let wav = encode_wav_mono_pcm16(
            &outcome.processed_audio.samples,
            outcome.processed_audio.sample_rate_hz,
        );
        self.write(&format!("processed_voice_{stamp}.wav"), &wav)
            .await?;

        let summary = serde_json::json!({
            "mode": outcome.mode,
            "transcript": outcome.transcript,
            "verdict": outcome.verdict,
            "matched_profile": outcome.matched_profile,
            "timings": outcome.timings,
            "speech_bytes": outcome.speech.bytes.len(),
        });
        let json = serde_json::to_vec_pretty(&summary).context("encode verdict summary")?;
        self.write(&format!("verdict_{stamp}.json"), &json).await
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create debug dir: {}", self.dir.display()))?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("write {}", path.display()))
    }
}

fn extension_of(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

fn image_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/heic" => "heic",
        _ => "img",
    }
}
