use std::path::PathBuf;
use std::sync::Arc;

use screenguide_core::config::AppConfig;
use screenguide_core::types::PriorContext;
use screenguide_engine::advisor::{AdvisorConfig, MissionAdvisor};
use screenguide_engine::engine::AssistEngine;

use crate::defaults::DEFAULT_PRIOR_CONTEXT_FILE;
use crate::llm::GeminiReasoningProvider;
use crate::prior::load_prior_context;
use crate::secrets::Secrets;
use crate::stt::GoogleSpeechRecognizer;
use crate::transcoder::FfmpegAudioTranscoder;
use crate::tts::GoogleSpeechSynthesizer;

/// Build a runnable engine from config + secrets.
///
/// Missing keys are not fatal here; the affected collaborator fails each request
/// instead, so `/healthz` still answers.
pub fn build_engine_from_config(cfg: &AppConfig, secrets: &Secrets) -> AssistEngine {
    if secrets.genai_key().is_none() {
        log::warn!("no GenAI API key configured; reasoning requests will fail");
    }
    if secrets.cloud_key().is_none() {
        log::warn!("no Google Cloud API key configured; speech requests will fail");
    }

    let d = &cfg.defaults;
    let reasoning = Arc::new(GeminiReasoningProvider::new(
        d.reasoning_base_url.clone(),
        secrets.genai_key().unwrap_or_default(),
    ));
    let recognizer = Arc::new(GoogleSpeechRecognizer::new(
        d.speech_base_url.clone(),
        secrets.cloud_key().unwrap_or_default(),
    ));
    let synthesizer = Arc::new(
        GoogleSpeechSynthesizer::new(
            d.tts_base_url.clone(),
            secrets.cloud_key().unwrap_or_default(),
        )
        .with_voice_name(d.tts_voice_name.clone()),
    );

    let advisor = MissionAdvisor::new(
        AdvisorConfig {
            defaults: cfg.defaults.clone(),
            profiles: cfg.profiles.clone(),
        },
        reasoning,
    );

    AssistEngine::new(
        advisor,
        Arc::new(FfmpegAudioTranscoder::from_env()),
        recognizer,
        synthesizer,
    )
}

/// The configured reference UI structure, falling back to the bundled default path.
pub fn prior_context_from_config(cfg: &AppConfig) -> anyhow::Result<Option<PriorContext>> {
    let path = cfg
        .prior_context_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PRIOR_CONTEXT_FILE));
    let prior = load_prior_context(&path)?;
    match &prior {
        Some(_) => log::info!("using reference UI structure from {}", path.display()),
        None if cfg.prior_context_path.is_some() => {
            log::warn!("configured prior context {} not found", path.display())
        }
        None => {}
    }
    Ok(prior)
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenguide_core::types::AdvisorMode;

    #[test]
    fn builds_without_keys() {
        let mut cfg = AppConfig::default();
        cfg.defaults.language = "en-US".into();
        let engine = build_engine_from_config(&cfg, &Secrets::default());
        let eff = engine.advisor().effective_config(AdvisorMode::UiTree);
        assert_eq!(eff.language, "en-US");
    }

    #[test]
    fn configured_prior_context_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.json");
        std::fs::write(&path, "{\"nodes\": []}").unwrap();
        let cfg = AppConfig {
            prior_context_path: Some(path),
            ..Default::default()
        };
        assert!(prior_context_from_config(&cfg).unwrap().is_some());
    }
}
