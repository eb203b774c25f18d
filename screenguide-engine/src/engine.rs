use crate::advisor::MissionAdvisor;
use crate::error::AssistError;
use crate::session::{AssistOutcome, AssistTimings, ms};
use crate::traits::{AudioTranscoder, AudioUpload, SpeechRecognizer, SpeechSynthesizer};
use screenguide_core::text::filter_transcription_output;
use screenguide_core::types::{PriorContext, ScreenRepresentation};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

pub const STAGE_TRANSCODING: &str = "transcoding";
pub const STAGE_TRANSCRIBING: &str = "transcribing";
pub const STAGE_REASONING: &str = "reasoning";
pub const STAGE_SYNTHESIZING: &str = "synthesizing";
pub const STAGE_DONE: &str = "done";

#[derive(Debug, Clone, PartialEq)]
pub struct AssistRequest {
    pub audio: AudioUpload,
    pub screen: ScreenRepresentation,
    pub prior_context: Option<PriorContext>,
}

pub struct AssistEngine {
    advisor: MissionAdvisor,
    transcoder: Arc<dyn AudioTranscoder>,
    recognizer: Arc<dyn SpeechRecognizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl AssistEngine {
    pub fn new(
        advisor: MissionAdvisor,
        transcoder: Arc<dyn AudioTranscoder>,
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            advisor,
            transcoder,
            recognizer,
            synthesizer,
        }
    }

    pub fn advisor(&self) -> &MissionAdvisor {
        &self.advisor
    }

    /// Runs the full pipeline (transcode -> transcribe -> advise -> speak).
    pub async fn assist(&self, request: AssistRequest) -> Result<AssistOutcome, AssistError> {
        self.run_with_hook(request, |_stage| async {}).await
    }

    /// Same as `assist`, but emits a stage hook as the pipeline progresses.
    ///
    /// The hook must be fast; it runs inline between stages.
    pub async fn run_with_hook<F, Fut>(
        &self,
        request: AssistRequest,
        on_stage: F,
    ) -> Result<AssistOutcome, AssistError>
    where
        F: Fn(&'static str) -> Fut,
        Fut: Future<Output = ()>,
    {
        let AssistRequest {
            audio,
            screen,
            prior_context,
        } = request;

        if audio.is_empty() {
            return Err(AssistError::MissingInput("voice recording is empty".into()));
        }
        if screen.is_empty() {
            return Err(AssistError::MissingInput(format!(
                "{} screen representation is empty",
                screen.mode().as_str()
            )));
        }

        let mode = screen.mode();
        let eff = self.advisor.effective_config(mode);
        let started = Instant::now();
        let mut timings = AssistTimings::default();

        // 1) Transcode
        on_stage(STAGE_TRANSCODING).await;
        let t0 = Instant::now();
        let processed = self
            .transcoder
            .to_mono_16k(&audio)
            .await
            .map_err(|e| AssistError::InternalFailure(format!("audio transcoding: {e:#}")))?;
        timings.transcode_ms = Some(ms(t0.elapsed()));

        // 2) Transcribe
        on_stage(STAGE_TRANSCRIBING).await;
        let t0 = Instant::now();
        let mut transcript = self
            .recognizer
            .transcribe(&processed, &eff.language)
            .await
            .map_err(|e| AssistError::RecognitionFailure(format!("{e:#}")))?
            .ok_or_else(|| AssistError::RecognitionFailure("speech was not intelligible".into()))?;
        timings.transcription_ms = Some(ms(t0.elapsed()));

        transcript.text = filter_transcription_output(&transcript.text);
        if transcript.text.is_empty() {
            return Err(AssistError::RecognitionFailure(
                "transcript is empty after filtering".into(),
            ));
        }
        log::info!(
            "transcribed {} ms of audio ({} chars) in {} mode",
            processed.duration_ms(),
            transcript.text.chars().count(),
            mode.as_str()
        );

        // 3) Advise
        on_stage(STAGE_REASONING).await;
        let t0 = Instant::now();
        let verdict = self
            .advisor
            .evaluate(&transcript.text, &screen, prior_context.as_ref())
            .await?;
        timings.reasoning_ms = Some(ms(t0.elapsed()));

        // 4) Speak
        on_stage(STAGE_SYNTHESIZING).await;
        let t0 = Instant::now();
        let speech = self
            .synthesizer
            .synthesize(&verdict.advice_text, &eff.language)
            .await
            .map_err(|e| AssistError::InternalFailure(format!("speech synthesis: {e:#}")))?;
        timings.synthesis_ms = Some(ms(t0.elapsed()));

        timings.total_ms = Some(ms(started.elapsed()));
        on_stage(STAGE_DONE).await;

        Ok(AssistOutcome {
            mode,
            transcript,
            verdict,
            speech,
            processed_audio: processed,
            matched_profile: eff.matched_profile,
            timings,
        })
    }
}
