use crate::text::filter_advice_output;
use crate::types::{AdvisorMode, UiBounds, UiElement, UiTree, Verdict, populated};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_FALLBACK_ADVICE: &str = "Sorry, I could not understand what you meant.";

/// What to do when the model omits or mistypes a required field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Any missing field is a malformed reply.
    #[default]
    Strict,
    /// `mission_achieved` defaults to false and the advice to `fallback_advice`.
    Lenient { fallback_advice: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerdictError {
    #[error("reply is not JSON: {0}")]
    NotJson(String),
    #[error("reply is not a JSON object")]
    NotObject,
    #[error("reply field `{0}` is missing or has the wrong type")]
    MissingField(&'static str),
}

fn strip_code_fence(raw: &str) -> &str {
    let t = raw.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    // Drop an optional language tag on the opening fence.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Enforce the verdict shape on a raw model reply.
pub fn parse_verdict(
    raw: &str,
    mode: AdvisorMode,
    tree: Option<&UiTree>,
    policy: &MissingFieldPolicy,
) -> Result<Verdict, VerdictError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| VerdictError::NotJson(e.to_string()))?;
    let obj = value.as_object().ok_or(VerdictError::NotObject)?;

    let mission_achieved = match (obj.get("mission_achieved").and_then(Value::as_bool), policy) {
        (Some(v), _) => v,
        (None, MissingFieldPolicy::Lenient { .. }) => false,
        (None, MissingFieldPolicy::Strict) => {
            return Err(VerdictError::MissingField("mission_achieved"));
        }
    };

    let advice = obj
        .get("ai_response")
        .and_then(Value::as_str)
        .map(filter_advice_output)
        .filter(|s| !s.is_empty());
    let advice_text = match (advice, policy) {
        (Some(v), _) => v,
        (None, MissingFieldPolicy::Lenient { fallback_advice }) => fallback_advice.clone(),
        (None, MissingFieldPolicy::Strict) => {
            return Err(VerdictError::MissingField("ai_response"));
        }
    };

    if mission_achieved || mode == AdvisorMode::Image {
        return Ok(Verdict {
            mission_achieved,
            advice_text,
            selected_element: None,
        });
    }

    let candidate = obj
        .get("selected_ui_element")
        .and_then(Value::as_object)
        .and_then(decode_candidate);

    let selected_element = match (candidate, tree) {
        (Some(c), Some(t)) if c.is_actionable() => {
            let resolved = resolve_element(&c, t);
            if resolved.is_none() {
                log::warn!("model selected an element that is not in the supplied UI tree: {c:?}");
            }
            resolved
        }
        (Some(c), _) => {
            log::warn!("model selected an element that cannot be matched: {c:?}");
            None
        }
        (None, _) => None,
    };

    Ok(Verdict {
        mission_achieved,
        advice_text,
        selected_element,
    })
}

/// Decode a model-proposed element, dropping `bounds` unless all four edges are integers.
fn decode_candidate(raw: &Map<String, Value>) -> Option<UiElement> {
    let mut raw = raw.clone();
    let bad_bounds = raw
        .get("bounds")
        .filter(|b| !b.is_null())
        .filter(|b| serde_json::from_value::<UiBounds>((*b).clone()).is_err())
        .cloned();
    if let Some(b) = bad_bounds {
        log::warn!("ignoring incomplete bounds on selected element: {b}");
        raw.remove("bounds");
    }
    match serde_json::from_value::<UiElement>(Value::Object(raw)) {
        Ok(el) => Some(el),
        Err(e) => {
            log::warn!("selected element could not be decoded: {e}");
            None
        }
    }
}

fn agrees(candidate: &Option<String>, actual: &Option<String>) -> bool {
    match populated(candidate) {
        None => true,
        Some(c) => populated(actual) == Some(c),
    }
}

fn agrees_on_all_populated(c: &UiElement, e: &UiElement) -> bool {
    agrees(&c.class_name, &e.class_name)
        && agrees(&c.text, &e.text)
        && agrees(&c.content_description, &e.content_description)
        && agrees(&c.view_id, &e.view_id)
        && c.bounds.is_none_or(|b| e.bounds == Some(b))
}

fn unique<'a>(mut matches: impl Iterator<Item = &'a UiElement>) -> Option<&'a UiElement> {
    let first = matches.next()?;
    matches.next().is_none().then_some(first)
}

/// Map a model-proposed element onto the element of `tree` it refers to.
///
/// Returns the tree's own element (detached from its children) so callers never
/// echo fields the model invented.
pub fn resolve_element(candidate: &UiElement, tree: &UiTree) -> Option<UiElement> {
    if !candidate.is_actionable() {
        return None;
    }
    let elements = tree.elements();

    if let Some(e) = elements
        .iter()
        .copied()
        .find(|e| agrees_on_all_populated(candidate, e))
    {
        return Some(e.detached());
    }

    if let Some(id) = populated(&candidate.view_id) {
        if let Some(e) = unique(
            elements
                .iter()
                .copied()
                .filter(|e| populated(&e.view_id) == Some(id)),
        ) {
            return Some(e.detached());
        }
    }

    if let Some(b) = candidate.bounds {
        if let Some(e) = elements.iter().copied().find(|e| e.bounds == Some(b)) {
            return Some(e.detached());
        }
    }

    if populated(&candidate.class_name).is_some() && populated(&candidate.text).is_some() {
        if let Some(e) = elements.iter().copied().find(|e| {
            populated(&e.class_name) == populated(&candidate.class_name)
                && populated(&e.text) == populated(&candidate.text)
        }) {
            return Some(e.detached());
        }
    }

    None
}
