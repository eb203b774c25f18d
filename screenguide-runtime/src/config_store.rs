use crate::fs_util::write_atomic;
use anyhow::Context;
use screenguide_core::config::AppConfig;
use std::path::{Path, PathBuf};

pub const BIND_ENV: &str = "SCREENGUIDE_BIND";
pub const LANGUAGE_ENV: &str = "SCREENGUIDE_LANGUAGE";
pub const MODEL_ENV: &str = "SCREENGUIDE_MODEL";
pub const DEBUG_DIR_ENV: &str = "SCREENGUIDE_DEBUG_DIR";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the built-in defaults; a malformed one is an error.
    pub fn load(&self) -> anyhow::Result<AppConfig> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", self.path.display());
                return Ok(AppConfig::default());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e))
                    .with_context(|| format!("read config: {}", self.path.display()));
            }
        };
        let cfg: AppConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("decode config JSON: {}", self.path.display()))?;
        Ok(cfg)
    }

    /// `load` followed by the `SCREENGUIDE_*` environment overrides.
    pub fn load_with_env(&self) -> anyhow::Result<AppConfig> {
        let mut cfg = self.load()?;
        apply_env_overrides(&mut cfg, |name| std::env::var(name).ok());
        Ok(cfg)
    }

    pub fn save(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        write_atomic(&self.path, &json)
            .with_context(|| format!("replace file: {}", self.path.display()))
    }
}

pub fn apply_env_overrides(cfg: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(v) = get(BIND_ENV) {
        cfg.server.bind_addr = v;
    }
    if let Some(v) = get(LANGUAGE_ENV) {
        cfg.defaults.language = v;
    }
    if let Some(v) = get(MODEL_ENV) {
        cfg.defaults.reasoning_model = v;
    }
    if let Some(v) = get(DEBUG_DIR_ENV) {
        // Naming a directory is how the debug variant is switched on.
        cfg.debug.enabled = true;
        cfg.debug.dir = PathBuf::from(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenguide_core::mode::{GlobalDefaults, ModeOverrides, ModeProfile};
    use screenguide_core::types::AdvisorMode;
    use screenguide_core::verdict::MissingFieldPolicy;

    #[test]
    fn round_trips_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("nested").join("config.json"));

        let cfg = AppConfig {
            defaults: GlobalDefaults {
                language: "en-US".into(),
                missing_field_policy: GlobalDefaults::lenient_policy(),
                ..Default::default()
            },
            profiles: vec![ModeProfile {
                name: "screenshots".into(),
                enabled: true,
                mode: AdvisorMode::Image,
                overrides: ModeOverrides {
                    reasoning_model: Some("gemini-2.5-pro".into()),
                    ..Default::default()
                },
            }],
            ..Default::default()
        };

        store.save(&cfg).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, cfg);
        assert!(matches!(
            loaded.defaults.missing_field_policy,
            MissingFieldPolicy::Lenient { .. }
        ));
    }

    #[test]
    fn missing_file_is_default_and_bad_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore::at_path(&path);
        assert_eq!(store.load().unwrap(), AppConfig::default());

        std::fs::write(&path, b"{ not json").unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |name| match name {
            BIND_ENV => Some("127.0.0.1:8080".into()),
            MODEL_ENV => Some("gemini-2.5-pro".into()),
            LANGUAGE_ENV => Some("   ".into()),
            DEBUG_DIR_ENV => Some("/tmp/sg".into()),
            _ => None,
        });
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.defaults.reasoning_model, "gemini-2.5-pro");
        assert_eq!(cfg.defaults.language, "zh-TW");
        assert!(cfg.debug.enabled);
        assert_eq!(cfg.debug.dir, PathBuf::from("/tmp/sg"));
    }
}
