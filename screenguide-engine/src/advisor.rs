use crate::error::AdvisorError;
use crate::traits::{InlineImage, ReasoningProvider, ReasoningRequest};
use screenguide_core::mode::{
    EffectiveConfig, GlobalDefaults, ModeProfile, resolve_effective_config,
};
use screenguide_core::prompt::{PromptOptions, build_advisor_prompt, response_schema};
use screenguide_core::types::{AdvisorMode, PriorContext, ScreenRepresentation, Verdict};
use screenguide_core::verdict::parse_verdict;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct AdvisorConfig {
    pub defaults: GlobalDefaults,
    pub profiles: Vec<ModeProfile>,
}

/// Decides whether the user's goal is met on the current screen and, if not, what
/// to do next.
///
/// Stateless: every call builds a fresh prompt and makes exactly one model request.
pub struct MissionAdvisor {
    cfg: AdvisorConfig,
    provider: Arc<dyn ReasoningProvider>,
}

impl MissionAdvisor {
    pub fn new(cfg: AdvisorConfig, provider: Arc<dyn ReasoningProvider>) -> Self {
        Self { cfg, provider }
    }

    pub fn effective_config(&self, mode: AdvisorMode) -> EffectiveConfig {
        resolve_effective_config(&self.cfg.defaults, &self.cfg.profiles, mode)
    }

    pub async fn evaluate(
        &self,
        transcript: &str,
        screen: &ScreenRepresentation,
        prior: Option<&PriorContext>,
    ) -> Result<Verdict, AdvisorError> {
        let mode = screen.mode();
        let eff = self.effective_config(mode);

        let opts = PromptOptions {
            language: &eff.language,
            system_instruction: eff.system_instruction.as_deref(),
            completion_message: &eff.completion_message,
        };
        let prompt = build_advisor_prompt(transcript, mode, screen.tree(), prior, &opts);

        let image = match screen {
            ScreenRepresentation::Image { mime_type, bytes } => Some(InlineImage {
                mime_type: mime_type.clone(),
                bytes: bytes.clone(),
            }),
            ScreenRepresentation::UiTree(_) => None,
        };

        let request = ReasoningRequest {
            model: eff.reasoning_model.clone(),
            system_instruction: prompt.system_instruction,
            user_message: prompt.user_message,
            image,
            response_schema: response_schema(mode),
            temperature: eff.temperature,
        };

        let reply = self
            .provider
            .generate(&request)
            .await
            .map_err(|e| AdvisorError::UpstreamUnavailable(format!("{e:#}")))?;

        let raw = reply
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AdvisorError::MalformedResponse(format!(
                    "{} ({}) returned no text",
                    reply.provider, reply.model
                ))
            })?;
        log::debug!("advisor reply ({}): {raw}", mode.as_str());

        parse_verdict(raw, mode, screen.tree(), &eff.missing_field_policy)
            .map_err(|e| AdvisorError::MalformedResponse(e.to_string()))
    }
}
