use anyhow::Context;
use screenguide_core::types::PriorContext;
use std::path::Path;

/// Read the reference UI-structure file. `Ok(None)` when it does not exist.
pub fn load_prior_context(path: &Path) -> anyhow::Result<Option<PriorContext>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(anyhow::Error::new(e))
                .with_context(|| format!("read prior context: {}", path.display()));
        }
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    if serde_json::from_str::<serde_json::Value>(&raw).is_err() {
        log::warn!(
            "prior context {} is not JSON; passing it to the model as text",
            path.display()
        );
    }
    Ok(Some(PriorContext::new(raw)))
}
