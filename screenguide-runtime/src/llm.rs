use screenguide_engine::traits::{ReasoningProvider, ReasoningReply, ReasoningRequest};
use screenguide_providers::gemini::{ContentPart, GeminiConfig, build_generate_content_request};

const PROVIDER: &str = "gemini";

#[derive(Clone)]
pub struct GeminiReasoningProvider {
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiReasoningProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiReasoningProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiReasoningProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait::async_trait]
impl ReasoningProvider for GeminiReasoningProvider {
    async fn generate(&self, request: &ReasoningRequest) -> anyhow::Result<ReasoningReply> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("missing GenAI API key"));
        }

        let cfg = GeminiConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: request.model.clone(),
            temperature: request.temperature,
        };

        // Text first, then the screenshot: the order the model sees them in.
        let mut parts = vec![ContentPart::Text(request.user_message.clone())];
        if let Some(img) = &request.image {
            parts.push(ContentPart::InlineData {
                mime_type: img.mime_type.clone(),
                bytes: img.bytes.clone(),
            });
        }

        let req = build_generate_content_request(
            &cfg,
            &request.system_instruction,
            &parts,
            &request.response_schema,
        );
        let resp = screenguide_providers::runtime::execute(&req).await?;
        if !resp.is_success() {
            return Err(resp.status_error("Gemini generateContent"));
        }

        let content = screenguide_providers::parse::parse_generate_content(&resp.body)?;
        if content.text.is_none() {
            log::warn!(
                "Gemini returned no text (finish_reason={:?}, block_reason={:?})",
                content.finish_reason,
                content.block_reason
            );
        }

        Ok(ReasoningReply {
            text: content.text,
            provider: PROVIDER.into(),
            model: request.model.clone(),
        })
    }
}
