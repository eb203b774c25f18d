use crate::request::{HttpRequest, join_url};
use serde_json::json;

#[derive(Clone, PartialEq, Eq)]
pub struct GoogleTtsConfig {
    /// e.g. `https://texttospeech.googleapis.com/v1`
    pub base_url: String,
    pub api_key: String,
    pub language_code: String,
    pub voice_name: Option<String>,
}

impl std::fmt::Debug for GoogleTtsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTtsConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("language_code", &self.language_code)
            .field("voice_name", &self.voice_name)
            .finish()
    }
}

pub const TTS_MIME_TYPE: &str = "audio/mpeg";

pub fn build_synthesize_request(cfg: &GoogleTtsConfig, text: &str) -> HttpRequest {
    let mut voice = json!({ "languageCode": cfg.language_code });
    if let Some(name) = cfg.voice_name.as_ref().filter(|s| !s.trim().is_empty()) {
        voice["name"] = json!(name);
    }

    let payload = json!({
        "input": { "text": text },
        "voice": voice,
        "audioConfig": { "audioEncoding": "MP3" },
    });

    HttpRequest::post_json(
        join_url(&cfg.base_url, "text:synthesize"),
        &cfg.api_key,
        &payload,
    )
}
