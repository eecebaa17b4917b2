//! reqwest adapter for the analysis backend port

use super::error::{HttpError, Result};
use super::protocol::{
    AnalysisResultResponse, StartAnalysisBody, StartAnalysisResponse, TaskStatusResponse,
};
use async_trait::async_trait;
use careline_application::{AnalysisBackend, BackendError};
use careline_domain::{AnalysisHandle, AnalysisRequest, AnalysisResult, CacheKey, TaskId, TaskState};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpAnalysisBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
}

impl HttpBackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// [`AnalysisBackend`] over the analysis REST API.
pub struct HttpAnalysisBackend {
    client: Client,
    base_url: Url,
}

impl HttpAnalysisBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| HttpError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(concat!("careline/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        info!(
            "HTTP analysis backend ready at {} (timeout {:?}, auth: {})",
            base_url,
            config.request_timeout,
            config.api_token.is_some()
        );

        Ok(Self { client, base_url })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HttpError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_start(&self, request: &AnalysisRequest) -> Result<AnalysisHandle> {
        let url = self.endpoint(&["analyses"])?;
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(&StartAnalysisBody::from(request))
            .send()
            .await?;
        let wire: StartAnalysisResponse = read_json(response).await?;
        wire.into_handle()
    }

    async fn get_task_state(&self, task_id: &TaskId) -> Result<TaskState> {
        let url = self.endpoint(&["tasks", task_id.as_str(), "status"])?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let wire: TaskStatusResponse = read_json(response).await?;
        Ok(wire.state)
    }

    async fn get_result(&self, cache_key: &CacheKey) -> Result<AnalysisResult> {
        let url = self.endpoint(&["analyses", cache_key.as_str()])?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let wire: AnalysisResultResponse = read_json(response).await?;
        Ok(wire.into())
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| HttpError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(HttpError::InvalidUrl {
            url: raw.to_string(),
            reason: "expected an http(s) URL".to_string(),
        });
    }
    Ok(url)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(HttpError::status(status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|e| HttpError::ParseError {
        error: e.to_string(),
        raw: body,
    })
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn start_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> std::result::Result<AnalysisHandle, BackendError> {
        self.post_start(request).await.map_err(BackendError::from)
    }

    async fn task_status(&self, task_id: &TaskId) -> std::result::Result<TaskState, BackendError> {
        self.get_task_state(task_id).await.map_err(BackendError::from)
    }

    async fn fetch_result(
        &self,
        cache_key: &CacheKey,
    ) -> std::result::Result<AnalysisResult, BackendError> {
        self.get_result(cache_key).await.map_err(BackendError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careline_domain::AnalysisStatus;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn backend(base_url: &str) -> HttpAnalysisBackend {
        HttpAnalysisBackend::new(
            HttpBackendConfig::new(base_url).with_api_token(Some("secret".to_string())),
        )
        .unwrap()
    }

    /// Serve one canned response and hand back the raw request,
    /// head and body.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                if let Some(head_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..head_end]).to_lowercase();
                    let content_length = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{}/api", addr), handle)
    }

    fn split_request(raw: &str) -> (&str, &str) {
        raw.split_once("\r\n\r\n").unwrap_or((raw, ""))
    }

    #[test]
    fn test_endpoint_percent_encodes_segments() {
        let backend = backend("http://localhost:8000/api/");
        let url = backend.endpoint(&["analyses", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/analyses/a%20b%2Fc");
    }

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let backend = backend("http://localhost:8000/api");
        let url = backend.endpoint(&["tasks", "t-1", "status"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/tasks/t-1/status");
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = HttpAnalysisBackend::new(HttpBackendConfig::new("mailto:ops@example.com"));
        assert!(matches!(result, Err(HttpError::InvalidUrl { .. })));

        let result = HttpAnalysisBackend::new(HttpBackendConfig::new("not a url"));
        assert!(matches!(result, Err(HttpError::InvalidUrl { .. })));
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let config = HttpBackendConfig::new("http://localhost").with_api_token(Some("  ".to_string()));
        assert!(config.api_token.is_none());
    }

    #[tokio::test]
    async fn test_start_analysis_posts_json_and_maps_cache_hit() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"already_cached": true, "status": "done", "response": "X", "cache_key": "k"}"#,
        )
        .await;
        let backend = backend(&base);
        let request = AnalysisRequest::new("headache since Monday", "conv-9").unwrap();

        let handle = backend.start_analysis(&request).await.unwrap();
        assert_eq!(handle, AnalysisHandle::Cached(AnalysisResult::done("X")));

        let raw = server.await.unwrap();
        let (head, body) = split_request(&raw);
        assert!(head.starts_with("POST /api/analyses HTTP/1.1"));
        assert!(head.to_lowercase().contains("content-type: application/json"));
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"symptom_text": "headache since Monday", "conversation_id": "conv-9"})
        );
    }

    #[tokio::test]
    async fn test_start_analysis_pending_handle() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"already_cached": false, "task_id": "t-7", "cache_key": "k-7"}"#,
        )
        .await;
        let backend = backend(&base);
        let request = AnalysisRequest::new("sore throat", "conv-1").unwrap();

        let handle = backend.start_analysis(&request).await.unwrap();
        assert_eq!(handle, AnalysisHandle::pending(Some(TaskId::new("t-7")), "k-7"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_task_status_round_trip() {
        let (base, server) = serve_once("200 OK", r#"{"state": "PROGRESS"}"#).await;
        let backend = backend(&base);

        let state = backend.task_status(&TaskId::new("t-42")).await.unwrap();
        assert_eq!(state, TaskState::Progress);

        let raw = server.await.unwrap();
        let (head, _) = split_request(&raw);
        assert!(head.starts_with("GET /api/tasks/t-42/status HTTP/1.1"));
        assert!(head.to_lowercase().contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn test_fetch_result_round_trip() {
        let (base, server) = serve_once("200 OK", r#"{"status": "done", "response": "Hydrate and rest."}"#).await;
        let backend = backend(&base);

        let result = backend.fetch_result(&CacheKey::new("k-1")).await.unwrap();
        assert_eq!(result.status, AnalysisStatus::Done);
        assert_eq!(result.text(), "Hydrate and rest.");

        let raw = server.await.unwrap();
        let (head, _) = split_request(&raw);
        assert!(head.starts_with("GET /api/analyses/k-1 HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let (base, server) = serve_once("503 Service Unavailable", r#"{"detail": "busy"}"#).await;
        let backend = backend(&base);

        let error = backend.fetch_result(&CacheKey::new("k-1")).await.unwrap_err();
        assert!(matches!(error, BackendError::Status { status: 503, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_decode() {
        let (base, server) = serve_once("200 OK", r#"{"unexpected": true}"#).await;
        let backend = backend(&base);

        let error = backend.task_status(&TaskId::new("t-1")).await.unwrap_err();
        assert!(matches!(error, BackendError::Decode(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_connection_error() {
        // Bind then drop to get a port with no listener.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = backend(&format!("http://{}", addr));
        let error = backend.task_status(&TaskId::new("t-1")).await.unwrap_err();
        assert!(matches!(error, BackendError::ConnectionError(_)));
    }
}
