use crate::types::AdvisorMode;
use crate::verdict::{DEFAULT_FALLBACK_ADVICE, MissingFieldPolicy};
use crate::prompt::DEFAULT_COMPLETION_MESSAGE;
use serde::{Deserialize, Serialize};

/// Per-mode overrides; `None` keeps the global default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ModeOverrides {
    pub language: Option<String>,
    pub reasoning_model: Option<String>,
    pub system_instruction: Option<String>,
    pub completion_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeProfile {
    pub name: String,
    pub enabled: bool,
    pub mode: AdvisorMode,
    pub overrides: ModeOverrides,
}

impl ModeProfile {
    pub fn matches(&self, mode: AdvisorMode) -> bool {
        self.enabled && self.mode == mode
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalDefaults {
    /// BCP-47 locale for recognition, synthesis and the advice text.
    pub language: String,
    pub reasoning_base_url: String,
    pub reasoning_model: String,
    pub speech_base_url: String,
    pub tts_base_url: String,
    /// Explicit Cloud TTS voice; `None` lets the service pick one for the language.
    pub tts_voice_name: Option<String>,
    pub completion_message: String,
    pub missing_field_policy: MissingFieldPolicy,
    /// Sampling temperature; `None` keeps the model default.
    pub temperature: Option<f32>,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            language: "zh-TW".into(),
            reasoning_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            reasoning_model: "gemini-2.5-flash".into(),
            speech_base_url: "https://speech.googleapis.com/v1".into(),
            tts_base_url: "https://texttospeech.googleapis.com/v1".into(),
            tts_voice_name: None,
            completion_message: DEFAULT_COMPLETION_MESSAGE.into(),
            missing_field_policy: MissingFieldPolicy::Strict,
            temperature: None,
        }
    }
}

impl GlobalDefaults {
    /// Lenient policy with the stock apology as fallback advice.
    pub fn lenient_policy() -> MissingFieldPolicy {
        MissingFieldPolicy::Lenient {
            fallback_advice: DEFAULT_FALLBACK_ADVICE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub mode: AdvisorMode,
    pub language: String,
    pub reasoning_model: String,
    pub system_instruction: Option<String>,
    pub completion_message: String,
    pub missing_field_policy: MissingFieldPolicy,
    pub temperature: Option<f32>,

    pub matched_profile: Option<String>,
}

pub fn resolve_effective_config(
    defaults: &GlobalDefaults,
    profiles: &[ModeProfile],
    mode: AdvisorMode,
) -> EffectiveConfig {
    let matched = profiles.iter().find(|p| p.matches(mode));

    let mut cfg = EffectiveConfig {
        mode,
        language: defaults.language.clone(),
        reasoning_model: defaults.reasoning_model.clone(),
        system_instruction: None,
        completion_message: defaults.completion_message.clone(),
        missing_field_policy: defaults.missing_field_policy.clone(),
        temperature: defaults.temperature,
        matched_profile: matched.map(|p| p.name.clone()),
    };

    if let Some(p) = matched {
        let o = &p.overrides;
        if let Some(v) = &o.language {
            cfg.language = v.clone();
        }
        if let Some(v) = &o.reasoning_model {
            cfg.reasoning_model = v.clone();
        }
        if let Some(v) = &o.system_instruction {
            cfg.system_instruction = Some(v.clone());
        }
        if let Some(v) = &o.completion_message {
            cfg.completion_message = v.clone();
        }
    }

    cfg
}
