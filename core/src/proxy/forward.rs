//! Catch-all forwarding handler: relays /api traffic to the backend origin.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::BACKEND_ORIGIN_ENV;
use crate::proxy::headers::forward_headers;
use crate::proxy::server::AppState;

/// Methods the gateway accepts, advertised on OPTIONS.
pub const ALLOWED_METHODS: &str = "GET,POST,PUT,PATCH,DELETE,OPTIONS,HEAD";

/// Route prefix stripped before the path is appended to the backend origin.
const API_MOUNT: &str = "/api";

/// Short random id tying a forwarded request's log lines together.
fn trace_id() -> String {
    use rand::Rng;
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Join the backend origin (trailing slash stripped) with the inbound path
/// and raw query string. The path and query are carried verbatim, never
/// re-encoded, so repeated query keys survive.
pub fn build_target_url(origin: &str, path: &str, query: Option<&str>) -> String {
    let base = origin.trim_end_matches('/');
    match query {
        Some(q) => format!("{}{}?{}", base, path, q),
        None => format!("{}{}", base, path),
    }
}

/// Forward any request under `/api/` to the configured backend origin.
///
/// OPTIONS is answered locally with 204. The backend's status, headers and
/// body are relayed back verbatim; `set-cookie` values are re-appended one by
/// one so multiple cookies stay distinct. Redirects from the backend are
/// never followed.
pub async fn forward_handler(State(state): State<AppState>, req: Request) -> Response {
    if req.method() == Method::OPTIONS {
        return Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS))
            .body(Body::empty())
            .unwrap_or_else(|_| StatusCode::NO_CONTENT.into_response());
    }

    let origin = match state.upstream_origin.as_deref() {
        Some(origin) if !origin.is_empty() => origin.to_string(),
        _ => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("{} is not set", BACKEND_ORIGIN_ENV)})),
            )
                .into_response();
        }
    };

    let trace_id = trace_id();
    let method = req.method().clone();

    // The route mounts this handler under /api, so the prefix is always
    // present on the URI path.
    let path = req.uri().path();
    let path = path.strip_prefix(API_MOUNT).unwrap_or("");
    let target = build_target_url(&origin, path, req.uri().query());

    let outbound_headers = forward_headers(req.headers());

    // GET/HEAD carry no body; everything else is buffered in full first.
    let body_bytes = if method == Method::GET || method == Method::HEAD {
        None
    } else {
        match axum::body::to_bytes(req.into_body(), usize::MAX).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("[{}] Failed to read request body: {}", trace_id, e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "failed to read request body"})),
                )
                    .into_response();
            }
        }
    };

    debug!("[{}] Forwarding {} {}", trace_id, method, target);

    let mut outbound = state
        .http_client
        .request(method.clone(), &target)
        .headers(outbound_headers);
    if let Some(bytes) = body_bytes {
        if !bytes.is_empty() {
            outbound = outbound.body(bytes);
        }
    }

    let upstream_response = match outbound.send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("[{}] Upstream unreachable: {}", trace_id, e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": format!("upstream unreachable: {}", e)})),
            )
                .into_response();
        }
    };

    let status = upstream_response.status();
    let upstream_headers = upstream_response.headers().clone();

    let bytes = match upstream_response.bytes().await {
        Ok(b) => b,
        Err(e) => {
            warn!("[{}] Failed to read upstream body: {}", trace_id, e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": format!("failed to read upstream response: {}", e)})),
            )
                .into_response();
        }
    };

    info!("[{}] {} {} -> {}", trace_id, method, target, status.as_u16());

    let mut response = Response::builder().status(status);
    for (name, value) in upstream_headers.iter() {
        if name == &header::SET_COOKIE {
            continue;
        }
        response = response.header(name, value);
    }
    // set-cookie is appended value by value so cookies are not merged.
    for cookie in upstream_headers.get_all(header::SET_COOKIE) {
        response = response.header(header::SET_COOKIE, cookie);
    }

    response.body(Body::from(bytes)).unwrap_or_else(|e| {
        warn!("[{}] Failed to build response: {}", trace_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "failed to build response"})),
        )
            .into_response()
    })
}
