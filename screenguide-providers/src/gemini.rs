use crate::request::{HttpRequest, join_url};
use base64::Engine;
use serde_json::{Value, json};

#[derive(Clone, PartialEq)]
pub struct GeminiConfig {
    /// e.g. `https://generativelanguage.googleapis.com/v1beta`
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineData { mime_type: String, bytes: Vec<u8> },
}

impl ContentPart {
    fn to_json(&self) -> Value {
        match self {
            ContentPart::Text(t) => json!({ "text": t }),
            ContentPart::InlineData { mime_type, bytes } => json!({
                "inline_data": {
                    "mime_type": mime_type,
                    "data": base64::engine::general_purpose::STANDARD.encode(bytes),
                }
            }),
        }
    }
}

fn model_path(model: &str) -> String {
    let model = model.trim_start_matches("models/");
    format!("models/{model}:generateContent")
}

/// Build a `generateContent` call whose reply is constrained to `response_schema`.
pub fn build_generate_content_request(
    cfg: &GeminiConfig,
    system_instruction: &str,
    parts: &[ContentPart],
    response_schema: &Value,
) -> HttpRequest {
    let url = join_url(&cfg.base_url, &model_path(&cfg.model));

    let mut generation_config = json!({
        "responseMimeType": "application/json",
        "responseSchema": response_schema,
    });
    if let Some(t) = cfg.temperature {
        generation_config["temperature"] = json!(t);
    }

    let payload = json!({
        "systemInstruction": { "parts": [{ "text": system_instruction }] },
        "contents": [{
            "role": "user",
            "parts": parts.iter().map(ContentPart::to_json).collect::<Vec<_>>(),
        }],
        "generationConfig": generation_config,
    });

    HttpRequest::post_json(url, &cfg.api_key, &payload)
}
