use screenguide_engine::traits::{SpeechSynthesizer, SynthesizedSpeech};
use screenguide_providers::google_tts::{GoogleTtsConfig, TTS_MIME_TYPE, build_synthesize_request};

#[derive(Clone)]
pub struct GoogleSpeechSynthesizer {
    base_url: String,
    api_key: String,
    voice_name: Option<String>,
}

impl std::fmt::Debug for GoogleSpeechSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSpeechSynthesizer")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("voice_name", &self.voice_name)
            .finish()
    }
}

impl GoogleSpeechSynthesizer {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            voice_name: None,
        }
    }

    pub fn with_voice_name(mut self, voice_name: Option<String>) -> Self {
        self.voice_name = voice_name;
        self
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for GoogleSpeechSynthesizer {
    async fn synthesize(&self, text: &str, language: &str) -> anyhow::Result<SynthesizedSpeech> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("missing Google Cloud API key"));
        }

        let cfg = GoogleTtsConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            language_code: language.to_string(),
            voice_name: self.voice_name.clone(),
        };
        let req = build_synthesize_request(&cfg, text);
        let resp = screenguide_providers::runtime::execute(&req).await?;
        if !resp.is_success() {
            return Err(resp.status_error("Google text:synthesize"));
        }

        let bytes = screenguide_providers::parse::parse_synthesize(&resp.body)?;
        Ok(SynthesizedSpeech {
            mime_type: TTS_MIME_TYPE.into(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn decodes_mp3_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/text:synthesize"))
            .and(body_partial_json(serde_json::json!({
                "input": {"text": "點左上角返回"},
                "voice": {"languageCode": "zh-TW", "name": "cmn-TW-Standard-A"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"audioContent":"SUQzBA=="}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let tts = GoogleSpeechSynthesizer::new(server.uri(), "k")
            .with_voice_name(Some("cmn-TW-Standard-A".into()));
        let speech = tts.synthesize("點左上角返回", "zh-TW").await.unwrap();
        assert_eq!(speech.mime_type, "audio/mpeg");
        assert_eq!(speech.bytes, b"ID3\x04");
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tts = GoogleSpeechSynthesizer::new(server.uri(), "k");
        assert!(tts.synthesize("hi", "en-US").await.is_err());
    }
}
