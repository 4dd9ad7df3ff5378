//! Header filtering for the forwarding path.

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, HOST};

/// Hop-by-hop headers, meaningful only for a single transport leg.
const HOP_BY_HOP: [&str; 4] = ["connection", "host", "content-length", "transfer-encoding"];

/// Prefix of gateway-internal headers. These never reach the backend.
pub const INTERNAL_HEADER_PREFIX: &str = "x-socgw-";

/// Header carrying the original host across the gateway.
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
/// Header carrying the original scheme across the gateway.
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Returns true if an inbound header may be forwarded to the backend.
pub fn should_forward(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    !HOP_BY_HOP.contains(&lower.as_str()) && !lower.starts_with(INTERNAL_HEADER_PREFIX)
}

/// Build the outbound header set: copy every forwardable inbound header
/// (multi-value entries preserved), then force `x-forwarded-host` from the
/// original `x-forwarded-host` or `host` and pin `x-forwarded-proto: https`.
pub fn forward_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::new();

    for (name, value) in inbound {
        if should_forward(name.as_str()) {
            outbound.append(name.clone(), value.clone());
        }
    }

    let forwarded_host = inbound
        .get(X_FORWARDED_HOST)
        .or_else(|| inbound.get(HOST))
        .cloned();
    if let Some(host) = forwarded_host {
        outbound.insert(X_FORWARDED_HOST, host);
    }
    outbound.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https"));

    outbound
}
