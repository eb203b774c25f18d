use crate::request::{Body, HttpRequest};
use anyhow::{Context, anyhow};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// Multimodal generation on a full screenshot regularly takes tens of seconds.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Error carrying the status and a bounded excerpt of the body.
    pub fn status_error(&self, what: &str) -> anyhow::Error {
        let body = String::from_utf8_lossy(&self.body);
        let excerpt: String = body.chars().take(512).collect();
        anyhow!("{what} failed: status={} body={}", self.status, excerpt)
    }
}

pub async fn execute(req: &HttpRequest) -> anyhow::Result<HttpResponse> {
    execute_with_timeout(req, REQUEST_TIMEOUT).await
}

pub async fn execute_with_timeout(
    req: &HttpRequest,
    timeout: Duration,
) -> anyhow::Result<HttpResponse> {
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
        .context("build http client")?;

    let mut headers = HeaderMap::new();
    for (k, v) in &req.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .with_context(|| format!("invalid header name: {k}"))?;
        let value =
            HeaderValue::from_str(v).with_context(|| format!("invalid header value for {k}"))?;
        headers.insert(name, value);
    }

    let builder = match req.method.as_str() {
        "GET" => client.get(&req.url),
        "POST" => client.post(&req.url),
        other => return Err(anyhow!("unsupported method: {other}")),
    }
    .headers(headers);

    let builder = match &req.body {
        Body::Empty => builder,
        Body::Json(s) => builder.body(s.clone()),
    };

    let resp = builder.send().await.context("http request failed")?;
    let status = resp.status().as_u16();
    let body = resp
        .bytes()
        .await
        .context("failed reading response body")?
        .to_vec();

    Ok(HttpResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_headers_and_returns_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/echo"))
            .and(header("x-goog-api-key", "k"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let req = HttpRequest::post_json(
            format!("{}/v1/echo", server.uri()),
            "k",
            &serde_json::json!({}),
        );
        let resp = execute(&req).await.unwrap();
        assert_eq!(resp.status, 503);
        assert!(!resp.is_success());
        assert!(resp.status_error("echo").to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let req = HttpRequest::post_json("http://127.0.0.1:9/nothing", "k", &serde_json::json!({}));
        assert!(
            execute_with_timeout(&req, Duration::from_secs(2))
                .await
                .is_err()
        );
    }
}
