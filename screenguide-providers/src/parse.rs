use anyhow::{Context, anyhow};
use base64::Engine;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    /// Concatenated text of the first candidate; `None` when the model produced none.
    pub text: Option<String>,
    pub finish_reason: Option<String>,
    pub block_reason: Option<String>,
}

pub fn parse_generate_content(body: &[u8]) -> anyhow::Result<GeneratedContent> {
    let resp: GenerateContentResponse =
        serde_json::from_slice(body).context("decode generateContent JSON")?;

    let first = resp.candidates.into_iter().next();
    let finish_reason = first.as_ref().and_then(|c| c.finish_reason.clone());
    let text = first
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .filter(|t| !t.trim().is_empty());

    Ok(GeneratedContent {
        text,
        finish_reason,
        block_reason: resp.prompt_feedback.and_then(|f| f.block_reason),
    })
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    pub confidence: Option<f32>,
}

/// `Ok(None)` means the service answered but heard nothing intelligible.
pub fn parse_recognize(body: &[u8]) -> anyhow::Result<Option<RecognizedText>> {
    let resp: RecognizeResponse =
        serde_json::from_slice(body).context("decode speech:recognize JSON")?;

    let mut text = String::new();
    let mut confidence: Option<f32> = None;
    for alt in resp
        .results
        .into_iter()
        .filter_map(|r| r.alternatives.into_iter().next())
    {
        text.push_str(&alt.transcript);
        if let Some(c) = alt.confidence {
            confidence = Some(confidence.map_or(c, |prev| prev.min(c)));
        }
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(RecognizedText { text, confidence }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

pub fn parse_synthesize(body: &[u8]) -> anyhow::Result<Vec<u8>> {
    let resp: SynthesizeResponse =
        serde_json::from_slice(body).context("decode text:synthesize JSON")?;
    let b64 = resp
        .audio_content
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("no audioContent in synthesize response"))?;
    base64::engine::general_purpose::STANDARD
        .decode(b64.as_bytes())
        .context("decode audioContent base64")
}
