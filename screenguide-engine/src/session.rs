use crate::traits::{AudioInput, SynthesizedSpeech, Transcript};
use screenguide_core::types::{AdvisorMode, Verdict};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssistTimings {
    pub transcode_ms: Option<u64>,
    pub transcription_ms: Option<u64>,
    pub reasoning_ms: Option<u64>,
    pub synthesis_ms: Option<u64>,
    pub total_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistOutcome {
    pub mode: AdvisorMode,
    pub transcript: Transcript,
    pub verdict: Verdict,
    pub speech: SynthesizedSpeech,

    // Kept so callers can persist exactly what the recognizer heard.
    pub processed_audio: AudioInput,
    pub matched_profile: Option<String>,
    pub timings: AssistTimings,
}

pub fn ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}
