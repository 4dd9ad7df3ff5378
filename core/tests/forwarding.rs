//! End-to-end tests for the /api forwarding path: a fake backend is spawned
//! on an ephemeral port and the gateway router is driven directly.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{any, get, post},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use soc_gateway_core::proxy::{server::router, AppState};

const MAX_BODY: usize = 1024 * 1024;

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let names: Vec<String> = headers.keys().map(|k| k.as_str().to_string()).collect();
    Json(json!({
        "names": names,
        "x_forwarded_host": headers.get("x-forwarded-host").and_then(|v| v.to_str().ok()),
        "x_forwarded_proto": headers.get("x-forwarded-proto").and_then(|v| v.to_str().ok()),
    }))
}

async fn echo_body(body: axum::body::Bytes) -> Vec<u8> {
    body.to_vec()
}

async fn echo_uri(req: Request) -> String {
    req.uri().to_string()
}

async fn two_cookies() -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header("set-cookie", "session=abc; Path=/")
        .header("set-cookie", "csrf=xyz; Path=/; HttpOnly")
        .body(Body::from("ok"))
        .unwrap()
}

async fn teapot() -> Response {
    (StatusCode::IM_A_TEAPOT, "short and stout").into_response()
}

async fn moved() -> Response {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header("location", "https://elsewhere.example.com/")
        .body(Body::empty())
        .unwrap()
}

/// Spawn a fake backend, returning its origin URL.
async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/echo-headers", any(echo_headers))
        .route("/echo-uri/*rest", any(echo_uri))
        .route("/echo-body", post(echo_body))
        .route("/cookies", get(two_cookies))
        .route("/teapot", get(teapot))
        .route("/moved", get(moved));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn gateway(origin: Option<String>) -> Router {
    router(AppState::new(origin), MAX_BODY)
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn options_short_circuits_without_touching_backend() {
    // Unroutable origin: a forwarded call would fail loudly.
    let app = gateway(Some("http://127.0.0.1:1".to_string()));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/anything/at/all")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers().get("allow").unwrap(),
        "GET,POST,PUT,PATCH,DELETE,OPTIONS,HEAD"
    );
}

#[tokio::test]
async fn browser_preflight_reaches_the_forwarding_handler() {
    // A preflight-shaped OPTIONS (Origin + Access-Control-Request-Method)
    // must get the handler's 204/Allow answer, not a layer's 200.
    let app = gateway(Some("http://127.0.0.1:1".to_string()));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/cases")
                .header("origin", "https://console.example.com")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers().get("allow").unwrap(),
        "GET,POST,PUT,PATCH,DELETE,OPTIONS,HEAD"
    );
}

#[tokio::test]
async fn missing_origin_answers_500_without_forwarding() {
    let app = gateway(None);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/alerts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "SOC_BACKEND_ORIGIN is not set");
}

#[tokio::test]
async fn empty_origin_is_treated_as_unset() {
    let app = gateway(Some(String::new()));

    let response = app
        .oneshot(Request::builder().uri("/api/alerts").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn hop_by_hop_and_internal_headers_never_reach_backend() {
    let origin = spawn_backend().await;
    let app = gateway(Some(origin));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/echo-headers")
                .header("host", "console.example.com")
                .header("x-socgw-trace", "internal")
                .header("x-custom", "kept")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let names: Vec<String> = body["names"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();

    assert!(!names.contains(&"connection".to_string()));
    assert!(!names.contains(&"transfer-encoding".to_string()));
    assert!(!names.iter().any(|n| n.starts_with("x-socgw-")));
    assert!(names.contains(&"x-custom".to_string()));
    assert_eq!(body["x_forwarded_host"], "console.example.com");
    assert_eq!(body["x_forwarded_proto"], "https");
}

#[tokio::test]
async fn api_prefix_is_stripped_and_query_passed_raw() {
    let origin = spawn_backend().await;
    let app = gateway(Some(origin));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/echo-uri/a/b?tag=ot&tag=ics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"/echo-uri/a/b?tag=ot&tag=ics");
}

#[tokio::test]
async fn backend_status_is_relayed_exactly() {
    let origin = spawn_backend().await;
    let app = gateway(Some(origin));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/teapot").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);

    // 3xx passes through untouched, the gateway never follows it.
    let response = app
        .oneshot(Request::builder().uri("/api/moved").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://elsewhere.example.com/"
    );
}

#[tokio::test]
async fn multiple_set_cookie_values_stay_distinct() {
    let origin = spawn_backend().await;
    let app = gateway(Some(origin));

    let response = app
        .oneshot(Request::builder().uri("/api/cookies").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let cookies: Vec<&str> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.contains(&"session=abc; Path=/"));
    assert!(cookies.contains(&"csrf=xyz; Path=/; HttpOnly"));
}

#[tokio::test]
async fn request_body_is_forwarded_for_post() {
    let origin = spawn_backend().await;
    let app = gateway(Some(origin));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/echo-body")
                .body(Body::from(r#"{"severity":"high"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], br#"{"severity":"high"}"#);
}

#[tokio::test]
async fn unreachable_backend_answers_502() {
    let app = gateway(Some("http://127.0.0.1:1".to_string()));

    let response = app
        .oneshot(Request::builder().uri("/api/alerts").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("upstream unreachable"));
}
