use crate::mode::{GlobalDefaults, ModeProfile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
            max_upload_bytes: 25 * 1024 * 1024,
            request_timeout_secs: 120,
        }
    }
}

/// Persisting every upload for offline inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from("ui_debug"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub defaults: GlobalDefaults,
    pub profiles: Vec<ModeProfile>,
    pub server: ServerConfig,
    pub debug: DebugConfig,

    /// Reference UI-structure JSON used as a prompt hint in UI-tree mode.
    pub prior_context_path: Option<PathBuf>,
}
