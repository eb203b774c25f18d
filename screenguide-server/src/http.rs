//! HTTP surface for the Android client.
//!
//! - `POST /img`: voice recording + screenshot
//! - `POST /ui`: voice recording + accessibility UI tree
//! - `POST /assist`: either of the above
//! - `GET /healthz`

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use screenguide_core::config::ServerConfig;
use screenguide_core::types::{AdvisorMode, PriorContext, ScreenRepresentation, UiElement, UiTree};
use screenguide_engine::engine::{AssistEngine, AssistRequest};
use screenguide_engine::error::AssistError;
use screenguide_engine::session::AssistOutcome;
use screenguide_engine::traits::AudioUpload;
use screenguide_runtime::debug_store::DebugStore;

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiError {
    error: String,
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError { error: msg.into() }))
}

pub fn status_for(err: &AssistError) -> StatusCode {
    match err {
        AssistError::MissingInput(_) => StatusCode::BAD_REQUEST,
        AssistError::RecognitionFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AssistError::UpstreamUnavailable(_) | AssistError::MalformedResponse(_) => {
            StatusCode::BAD_GATEWAY
        }
        AssistError::InternalFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &AssistError) -> Response {
    api_error(status_for(err), err.to_string()).into_response()
}

// ---------------------------------------------------------------------------
// State + payloads
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AssistEngine>,
    pub prior_context: Option<PriorContext>,
    pub debug: Option<DebugStore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistResponse {
    pub mission_achieved: bool,
    pub ai_response: String,
    pub audio_base64: String,

    // Outer `None` omits the key (image mode); `Some(None)` serializes as null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_ui_element: Option<Option<UiElement>>,
}

impl AssistResponse {
    pub fn from_outcome(outcome: &AssistOutcome) -> Self {
        Self {
            mission_achieved: outcome.verdict.mission_achieved,
            ai_response: outcome.verdict.advice_text.clone(),
            audio_base64: base64::engine::general_purpose::STANDARD.encode(&outcome.speech.bytes),
            selected_ui_element: (outcome.mode == AdvisorMode::UiTree)
                .then(|| outcome.verdict.selected_element.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Image,
    UiTree,
    Either,
}

#[derive(Debug, Default)]
struct Upload {
    audio: Option<AudioUpload>,
    image: Option<(Option<String>, Vec<u8>)>,
    ui_data: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, (StatusCode, Json<ApiError>)> {
    let bad = |e: axum::extract::multipart::MultipartError| api_error(e.status(), e.body_text());

    let mut up = Upload::default();
    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad)?;
                up.audio = Some(AudioUpload {
                    bytes: bytes.to_vec(),
                    file_name,
                    content_type,
                });
            }
            "image" => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad)?;
                up.image = Some((content_type, bytes.to_vec()));
            }
            "ui_data" => {
                up.ui_data = Some(field.text().await.map_err(bad)?);
            }
            other => tracing::debug!("ignoring multipart field {other:?}"),
        }
    }
    Ok(up)
}

fn image_mime(declared: Option<&str>, bytes: &[u8]) -> String {
    if let Some(ct) = declared.filter(|ct| ct.starts_with("image/")) {
        return ct.to_string();
    }
    if bytes.starts_with(b"\x89PNG") {
        "image/png".into()
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp".into()
    } else {
        "image/jpeg".into()
    }
}

fn screen_from(expect: Expect, up: &mut Upload) -> Result<ScreenRepresentation, Response> {
    let image = up
        .image
        .take()
        .filter(|(_, bytes)| !bytes.is_empty())
        .map(|(ct, bytes)| ScreenRepresentation::image(image_mime(ct.as_deref(), &bytes), bytes));
    let ui_data = up.ui_data.take().filter(|s| !s.trim().is_empty());

    let parse_tree = |raw: String| {
        UiTree::from_json(&raw)
            .map(ScreenRepresentation::UiTree)
            .map_err(|e| {
                api_error(StatusCode::BAD_REQUEST, format!("invalid ui_data JSON: {e}"))
                    .into_response()
            })
    };
    let missing =
        |what: &str| error_response(&AssistError::MissingInput(format!("no {what} supplied")));

    match expect {
        Expect::Image => image.ok_or_else(|| missing("`image` screenshot")),
        Expect::UiTree => ui_data
            .map(parse_tree)
            .unwrap_or_else(|| Err(missing("`ui_data` UI tree"))),
        Expect::Either => match (image, ui_data) {
            (Some(img), _) => Ok(img),
            (None, Some(raw)) => parse_tree(raw),
            (None, None) => Err(missing("`image` or `ui_data`")),
        },
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn assist_image(State(state): State<AppState>, multipart: Multipart) -> Response {
    handle(state, multipart, Expect::Image).await
}

async fn assist_ui(State(state): State<AppState>, multipart: Multipart) -> Response {
    handle(state, multipart, Expect::UiTree).await
}

async fn assist_any(State(state): State<AppState>, multipart: Multipart) -> Response {
    handle(state, multipart, Expect::Either).await
}

async fn handle(state: AppState, multipart: Multipart, expect: Expect) -> Response {
    let mut up = match read_upload(multipart).await {
        Ok(up) => up,
        Err(e) => return e.into_response(),
    };

    let Some(audio) = up.audio.take().filter(|a| !a.is_empty()) else {
        return error_response(&AssistError::MissingInput(
            "no voice recording in field `file`".into(),
        ));
    };
    let screen = match screen_from(expect, &mut up) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let stamp = DebugStore::new_stamp();
    if let Some(store) = &state.debug {
        store.record_request(&stamp, &audio, &screen).await;
    }

    let mode = screen.mode();
    let request = AssistRequest {
        audio,
        screen,
        prior_context: state.prior_context.clone(),
    };

    match state.engine.assist(request).await {
        Ok(outcome) => {
            tracing::info!(
                mode = mode.as_str(),
                mission_achieved = outcome.verdict.mission_achieved,
                selected = outcome.verdict.selected_element.is_some(),
                total_ms = outcome.timings.total_ms,
                "assist request served"
            );
            if let Some(store) = &state.debug {
                store.record_outcome(&stamp, &outcome).await;
            }
            (StatusCode::OK, Json(AssistResponse::from_outcome(&outcome))).into_response()
        }
        Err(e) => {
            tracing::warn!(mode = mode.as_str(), kind = e.kind(), "assist request failed: {e}");
            if let Some(store) = &state.debug {
                store.record_error(&stamp, &e).await;
            }
            error_response(&e)
        }
    }
}

// ---------------------------------------------------------------------------
// Router builder
// ---------------------------------------------------------------------------

pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/img", post(assist_image))
        .route("/ui", post(assist_ui))
        .route("/assist", post(assist_any))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(server.max_upload_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use screenguide_engine::advisor::{AdvisorConfig, MissionAdvisor};
    use screenguide_engine::traits::{
        AudioInput, AudioTranscoder, ReasoningProvider, ReasoningReply, ReasoningRequest,
        SpeechRecognizer, SpeechSynthesizer, SynthesizedSpeech, Transcript,
    };
    use tower::util::ServiceExt;

    const BOUNDARY: &str = "screenguide-test-boundary";

    struct Passthrough;

    #[async_trait::async_trait]
    impl AudioTranscoder for Passthrough {
        async fn to_mono_16k(&self, upload: &AudioUpload) -> anyhow::Result<AudioInput> {
            Ok(AudioInput {
                sample_rate_hz: 16_000,
                samples: vec![0.0; upload.bytes.len()],
            })
        }
    }

    struct Heard(Option<&'static str>);

    #[async_trait::async_trait]
    impl SpeechRecognizer for Heard {
        async fn transcribe(&self, _: &AudioInput, _: &str) -> anyhow::Result<Option<Transcript>> {
            Ok(self.0.map(|t| Transcript {
                text: t.into(),
                provider: "test".into(),
                model: "test".into(),
                confidence: None,
            }))
        }
    }

    struct Replies(Result<&'static str, &'static str>);

    #[async_trait::async_trait]
    impl ReasoningProvider for Replies {
        async fn generate(&self, req: &ReasoningRequest) -> anyhow::Result<ReasoningReply> {
            match self.0 {
                Ok(text) => Ok(ReasoningReply {
                    text: Some(text.into()),
                    provider: "test".into(),
                    model: req.model.clone(),
                }),
                Err(msg) => Err(anyhow::anyhow!(msg)),
            }
        }
    }

    struct Speaks;

    #[async_trait::async_trait]
    impl SpeechSynthesizer for Speaks {
        async fn synthesize(&self, _: &str, _: &str) -> anyhow::Result<SynthesizedSpeech> {
            Ok(SynthesizedSpeech {
                mime_type: "audio/mpeg".into(),
                bytes: b"mp3".to_vec(),
            })
        }
    }

    const BACK_REPLY: &str = r#"{"mission_achieved": false, "ai_response": "點左上角返回", "selected_ui_element": {"viewId": "btn_back"}}"#;
    const DONE_REPLY: &str = r#"{"mission_achieved": true, "ai_response": "恭喜完成"}"#;

    const UI_DATA: &str = r#"{"eventType": 32, "package": "com.android.contacts", "nodes": [
        {"className": "android.widget.ImageView", "contentDescription": "Back", "viewId": "btn_back", "bounds": {"l": 0, "t": 80, "r": 120, "b": 200}},
        {"className": "android.widget.TextView", "text": "Alice", "viewId": "name", "bounds": {"l": 0, "t": 300, "r": 1080, "b": 400}}
    ]}"#;

    fn state_with(
        heard: Option<&'static str>,
        reply: Result<&'static str, &'static str>,
        debug: Option<DebugStore>,
    ) -> AppState {
        let advisor = MissionAdvisor::new(AdvisorConfig::default(), Arc::new(Replies(reply)));
        let engine = AssistEngine::new(
            advisor,
            Arc::new(Passthrough),
            Arc::new(Heard(heard)),
            Arc::new(Speaks),
        );
        AppState {
            engine: Arc::new(engine),
            prior_context: None,
            debug,
        }
    }

    fn app(state: AppState) -> Router {
        router(state, &ServerConfig::default())
    }

    struct Part<'a> {
        name: &'a str,
        file_name: Option<&'a str>,
        content_type: Option<&'a str>,
        data: &'a [u8],
    }

    fn voice() -> Part<'static> {
        Part {
            name: "file",
            file_name: Some("voice.m4a"),
            content_type: Some("audio/mp4"),
            data: b"fake-m4a",
        }
    }

    fn text_part<'a>(name: &'a str, data: &'a str) -> Part<'a> {
        Part {
            name,
            file_name: None,
            content_type: None,
            data: data.as_bytes(),
        }
    }

    fn screenshot() -> Part<'static> {
        Part {
            name: "image",
            file_name: Some("screen.png"),
            content_type: Some("image/png"),
            data: b"\x89PNG\r\n",
        }
    }

    fn multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for p in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", p.name);
            if let Some(f) = p.file_name {
                disposition.push_str(&format!("; filename=\"{f}\""));
            }
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            if let Some(ct) = p.content_type {
                body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(p.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let response = app(state_with(None, Ok(DONE_REPLY), None))
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response.into_body()).await["status"], "ok");
    }

    #[tokio::test]
    async fn ui_route_returns_element_and_audio() {
        let response = app(state_with(
            Some("how do I get back to the contacts list"),
            Ok(BACK_REPLY),
            None,
        ))
        .oneshot(multipart("/ui", &[voice(), text_part("ui_data", UI_DATA)]))
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["mission_achieved"], false);
        assert_eq!(json["ai_response"], "點左上角返回");
        assert_eq!(json["selected_ui_element"]["viewId"], "btn_back");
        assert_eq!(json["selected_ui_element"]["bounds"]["r"], 120);
        assert_eq!(json["audio_base64"], "bXAz");
    }

    #[tokio::test]
    async fn ui_route_sends_null_when_goal_met() {
        let response = app(state_with(Some("open contacts"), Ok(DONE_REPLY), None))
            .oneshot(multipart("/ui", &[voice(), text_part("ui_data", UI_DATA)]))
            .await
            .unwrap();
        let json = body_json(response.into_body()).await;
        assert_eq!(json["mission_achieved"], true);
        assert!(json["selected_ui_element"].is_null());
        assert!(json.as_object().unwrap().contains_key("selected_ui_element"));
    }

    #[tokio::test]
    async fn img_route_omits_element_key() {
        let response = app(state_with(Some("add a friend"), Ok(DONE_REPLY), None))
            .oneshot(multipart("/img", &[voice(), screenshot()]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["ai_response"], "恭喜完成");
        assert!(!json.as_object().unwrap().contains_key("selected_ui_element"));
    }

    #[tokio::test]
    async fn assist_route_prefers_image() {
        let response = app(state_with(Some("go back"), Ok(BACK_REPLY), None))
            .oneshot(multipart(
                "/assist",
                &[voice(), screenshot(), text_part("ui_data", UI_DATA)],
            ))
            .await
            .unwrap();
        let json = body_json(response.into_body()).await;
        assert!(!json.as_object().unwrap().contains_key("selected_ui_element"));
    }

    #[tokio::test]
    async fn missing_parts_are_bad_requests() {
        let response = app(state_with(Some("x"), Ok(DONE_REPLY), None))
            .oneshot(multipart("/img", &[screenshot()]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response.into_body()).await["error"].is_string());

        let response = app(state_with(Some("x"), Ok(DONE_REPLY), None))
            .oneshot(multipart("/ui", &[voice()]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_ui_data_is_bad_request() {
        let response = app(state_with(Some("x"), Ok(DONE_REPLY), None))
            .oneshot(multipart("/ui", &[voice(), text_part("ui_data", "{nodes: oops")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response.into_body()).await;
        assert!(json["error"].as_str().unwrap().contains("ui_data"));
    }

    #[tokio::test]
    async fn unintelligible_speech_is_unprocessable() {
        let response = app(state_with(None, Ok(DONE_REPLY), None))
            .oneshot(multipart("/img", &[voice(), screenshot()]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn upstream_failures_are_bad_gateway() {
        let response = app(state_with(Some("x"), Err("quota exceeded"), None))
            .oneshot(multipart("/img", &[voice(), screenshot()]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = app(state_with(Some("x"), Ok("not json at all"), None))
            .oneshot(multipart("/img", &[voice(), screenshot()]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn debug_store_captures_request_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = DebugStore::at_dir(dir.path());
        let response = app(state_with(Some("go back"), Ok(BACK_REPLY), Some(store)))
            .oneshot(multipart("/ui", &[voice(), text_part("ui_data", UI_DATA)]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        for prefix in ["received_voice_", "ui_data_", "processed_voice_", "verdict_"] {
            assert!(names.iter().any(|n| n.starts_with(prefix)), "{prefix} in {names:?}");
        }
    }

    #[test]
    fn sniffs_image_mime() {
        assert_eq!(image_mime(Some("image/webp"), b""), "image/webp");
        assert_eq!(image_mime(Some("application/octet-stream"), b"\x89PNG"), "image/png");
        assert_eq!(image_mime(None, b"\xFF\xD8\xFF"), "image/jpeg");
    }
}
