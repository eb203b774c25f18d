use screenguide_audio::to_pcm_s16le;
use screenguide_engine::traits::{AudioInput, SpeechRecognizer, Transcript};
use screenguide_providers::google_speech::{GoogleSpeechConfig, build_recognize_request};

const PROVIDER: &str = "google-speech";

#[derive(Clone)]
pub struct GoogleSpeechRecognizer {
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GoogleSpeechRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSpeechRecognizer")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GoogleSpeechRecognizer {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for GoogleSpeechRecognizer {
    async fn transcribe(
        &self,
        audio: &AudioInput,
        language: &str,
    ) -> anyhow::Result<Option<Transcript>> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("missing Google Cloud API key"));
        }
        if audio.samples.is_empty() {
            return Ok(None);
        }

        let cfg = GoogleSpeechConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            language_code: language.to_string(),
            sample_rate_hz: audio.sample_rate_hz,
        };
        let req = build_recognize_request(&cfg, &to_pcm_s16le(&audio.samples));

        let resp = screenguide_providers::runtime::execute(&req).await?;
        if !resp.is_success() {
            return Err(resp.status_error("Google speech:recognize"));
        }

        let recognized = screenguide_providers::parse::parse_recognize(&resp.body)?;
        Ok(recognized.map(|r| Transcript {
            text: r.text,
            provider: PROVIDER.into(),
            model: "default".into(),
            confidence: r.confidence,
        }))
    }
}
