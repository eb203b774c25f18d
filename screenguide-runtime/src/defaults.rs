use std::path::PathBuf;

pub const CONFIG_PATH_ENV: &str = "SCREENGUIDE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "screenguide.json";

/// Reference layout shipped next to the server and used when no path is configured.
pub const DEFAULT_PRIOR_CONTEXT_FILE: &str = "assets/UI_Structure.json";

pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
