use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A voice recording exactly as the client uploaded it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl AudioUpload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Default::default()
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioInput {
    // Mono PCM samples at `sample_rate_hz`; transcoding happened at the boundary.
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl AudioInput {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate_hz as u64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningRequest {
    pub model: String,
    pub system_instruction: String,
    pub user_message: String,
    pub image: Option<InlineImage>,
    pub response_schema: serde_json::Value,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningReply {
    /// Raw model text; `None` when the model produced nothing (e.g. blocked).
    pub text: Option<String>,
    pub provider: String,
    pub model: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SynthesizedSpeech {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SynthesizedSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesizedSpeech")
            .field("mime_type", &self.mime_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    /// Decode an upload in any supported container to mono 16 kHz samples.
    async fn to_mono_16k(&self, upload: &AudioUpload) -> anyhow::Result<AudioInput>;
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// `Ok(None)` means the audio was processed but nothing intelligible was heard.
    async fn transcribe(
        &self,
        audio: &AudioInput,
        language: &str,
    ) -> anyhow::Result<Option<Transcript>>;
}

#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    async fn generate(&self, request: &ReasoningRequest) -> anyhow::Result<ReasoningReply>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str) -> anyhow::Result<SynthesizedSpeech>;
}
