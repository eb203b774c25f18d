use crate::request::{HttpRequest, join_url};
use base64::Engine;
use serde_json::json;

#[derive(Clone, PartialEq, Eq)]
pub struct GoogleSpeechConfig {
    /// e.g. `https://speech.googleapis.com/v1`
    pub base_url: String,
    pub api_key: String,
    pub language_code: String,
    pub sample_rate_hz: u32,
}

impl std::fmt::Debug for GoogleSpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSpeechConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("language_code", &self.language_code)
            .field("sample_rate_hz", &self.sample_rate_hz)
            .finish()
    }
}

/// Synchronous `speech:recognize` request for mono LINEAR16 audio.
///
/// `pcm_s16le` is raw little-endian 16-bit samples without a WAV header.
pub fn build_recognize_request(cfg: &GoogleSpeechConfig, pcm_s16le: &[u8]) -> HttpRequest {
    let payload = json!({
        "config": {
            "encoding": "LINEAR16",
            "sampleRateHertz": cfg.sample_rate_hz,
            "audioChannelCount": 1,
            "languageCode": cfg.language_code,
            "enableAutomaticPunctuation": true,
        },
        "audio": {
            "content": base64::engine::general_purpose::STANDARD.encode(pcm_s16le),
        },
    });

    HttpRequest::post_json(
        join_url(&cfg.base_url, "speech:recognize"),
        &cfg.api_key,
        &payload,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_linear16_request_with_locale() {
        let cfg = GoogleSpeechConfig {
            base_url: "https://speech.googleapis.com/v1".into(),
            api_key: "k".into(),
            language_code: "zh-TW".into(),
            sample_rate_hz: 16_000,
        };
        let req = build_recognize_request(&cfg, &[0, 0, 255, 127]);
        assert_eq!(req.url, "https://speech.googleapis.com/v1/speech:recognize");
        assert_eq!(req.header("x-goog-api-key"), Some("k"));

        let body = req.json_body().unwrap();
        assert_eq!(body["config"]["encoding"], "LINEAR16");
        assert_eq!(body["config"]["sampleRateHertz"], 16_000);
        assert_eq!(body["config"]["languageCode"], "zh-TW");
        assert_eq!(body["audio"]["content"], "AAD/fw==");
    }
}
