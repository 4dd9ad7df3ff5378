//! Shared API client for the console backends.
//!
//! Every data accessor goes through [`ApiClient::fetch`] so auth header
//! injection, error classification, and diagnostics logging live in exactly
//! one place. The client performs exactly one attempt per call; retry policy
//! belongs to callers. Dropping the returned future aborts the in-flight
//! request.

pub mod error;

pub use error::{ApiError, ErrorKind, BODY_SNIPPET_MAX};

use reqwest::{header, Client, Method, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use uuid::Uuid;

/// Correlation-id header attached to every outgoing call.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Supplies the current bearer token, if any.
///
/// Each call reads one snapshot of the token; a concurrent refresh simply
/// lands on the next call.
pub trait TokenProvider: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

/// Fixed token (or none), for tooling and tests.
pub struct StaticTokenProvider(pub Option<String>);

impl TokenProvider for StaticTokenProvider {
    fn current_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    /// Create a client for `base_url` (trailing slash stripped).
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .cookie_store(true)
            .user_agent("soc-gateway/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn build_url(base_url: &str, path: &str, query: &[(&str, Option<String>)]) -> String {
        let mut url = format!("{}/{}", base_url, path.trim_start_matches('/'));
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;
        for (key, value) in query {
            if let Some(value) = value {
                serializer.append_pair(key, value);
                has_query = true;
            }
        }
        if has_query {
            url.push('?');
            url.push_str(&serializer.finish());
        }
        url
    }

    /// GET without query parameters.
    pub async fn get(&self, path: &str) -> Result<Option<Value>, ApiError> {
        self.fetch(Method::GET, path, None, &[]).await
    }

    /// Issue a single request and decode the response.
    ///
    /// Resolves to `None` for 204/205 and empty bodies, the parsed value for
    /// JSON bodies, and the raw text (as a JSON string) otherwise. `None`
    /// query values are omitted from the URL.
    pub async fn fetch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, Option<String>)],
    ) -> Result<Option<Value>, ApiError> {
        let url = Self::build_url(&self.base_url, path, query);
        let request_id = Uuid::new_v4().to_string();

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if body.is_some() && method != Method::GET {
            headers.insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/json"),
            );
        }
        if let Some(token) = self.tokens.current_token() {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ApiError::network(e.to_string(), &request_id))?,
            );
        }
        headers.insert(
            REQUEST_ID_HEADER,
            header::HeaderValue::from_str(&request_id)
                .map_err(|e| ApiError::network(e.to_string(), &request_id))?,
        );

        let mut request = self
            .http_client
            .request(method.clone(), &url)
            .headers(headers);
        if let Some(b) = body {
            // Serialized by hand: `json()` re-inserts Content-Type even on
            // GET, where the header contract forbids it.
            let payload = serde_json::to_vec(b)
                .map_err(|e| ApiError::network(e.to_string(), &request_id))?;
            request = request.body(payload);
        }

        let started = Instant::now();
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(
                    "{} {} -> error: {} ({}ms) [{}]",
                    method,
                    url,
                    e,
                    started.elapsed().as_millis(),
                    request_id
                );
                return Err(ApiError::network(e.to_string(), &request_id));
            }
        };

        let status = response.status().as_u16();
        let result = Self::handle_response(response, &request_id).await;
        tracing::debug!(
            "{} {} -> {} ({}ms) [{}]",
            method,
            url,
            status,
            started.elapsed().as_millis(),
            request_id
        );
        result
    }

    async fn handle_response(
        response: Response,
        request_id: &str,
    ) -> Result<Option<Value>, ApiError> {
        let status = response.status().as_u16();
        let ok = response.status().is_success();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // The body is read as text exactly once.
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(e.to_string(), request_id))?;

        decode_response(status, ok, content_type.as_deref(), &text, request_id)
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type.map_or(false, |ct| ct.contains("json"))
}

/// Decode a fully buffered response into the caller-facing result.
fn decode_response(
    status: u16,
    ok: bool,
    content_type: Option<&str>,
    text: &str,
    request_id: &str,
) -> Result<Option<Value>, ApiError> {
    if status == 204 || status == 205 {
        return Ok(None);
    }

    if !ok {
        let message = if text.is_empty() {
            format!("API error {}", status)
        } else if is_json(content_type) {
            match serde_json::from_str::<Value>(text) {
                Ok(parsed) => parsed
                    .get("detail")
                    .or_else(|| parsed.get("message"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("API error {}", status)),
                Err(_) => format!("API error {} (invalid JSON body)", status),
            }
        } else {
            text.to_string()
        };
        return Err(ApiError::server(message, status, request_id, text));
    }

    if text.is_empty() {
        return Ok(None);
    }

    if is_json(content_type) {
        match serde_json::from_str::<Value>(text) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => Err(ApiError::parse(
                format!("invalid JSON in response: {}", e),
                request_id,
                text,
            )),
        }
    } else {
        Ok(Some(Value::String(text.to_string())))
    }
}
