//! API keys come from the process environment, optionally seeded from `.env`.

pub const GENAI_API_KEY: &str = "GENAI_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GOOGLE_CLOUD_API_KEY: &str = "GOOGLE_CLOUD_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKey {
    GenAiApiKey,
    GoogleCloudApiKey,
}

impl SecretKey {
    /// Variables consulted in order; the first non-blank one wins.
    pub fn env_vars(self) -> &'static [&'static str] {
        match self {
            SecretKey::GenAiApiKey => &[GENAI_API_KEY, GEMINI_API_KEY],
            SecretKey::GoogleCloudApiKey => &[GOOGLE_CLOUD_API_KEY],
        }
    }
}

/// Load `.env` from the working directory (or a parent). A missing file is fine.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => log::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("ignoring unreadable .env: {e}"),
    }
}

pub fn get_secret_with(key: SecretKey, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    key.env_vars()
        .iter()
        .filter_map(|name| lookup(*name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secrets {
    pub genai_api_key: Option<String>,
    pub cloud_api_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "[REDACTED]" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("genai_api_key", &mask(&self.genai_api_key))
            .field("cloud_api_key", &mask(&self.cloud_api_key))
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            genai_api_key: get_secret_with(SecretKey::GenAiApiKey, &lookup),
            cloud_api_key: get_secret_with(SecretKey::GoogleCloudApiKey, &lookup),
        }
    }

    pub fn genai_key(&self) -> Option<&str> {
        self.genai_api_key.as_deref()
    }

    /// Speech and TTS share one Cloud key; a GenAI key also works when the project
    /// has those APIs enabled.
    pub fn cloud_key(&self) -> Option<&str> {
        self.cloud_api_key.as_deref().or(self.genai_key())
    }
}
