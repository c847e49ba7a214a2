use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chargedeck::Dashboard;
use chargedeck::config::{Config, LoggingConfig};
use chargedeck::onboarding::{KEY_ACTIVE, OnboardingStore};
use chargedeck::persistence::{KeyValueStore, MemoryStore};
use http_body_util::BodyExt as _;
use std::time::Duration;
use tower::ServiceExt;

const WARN_MARKER: &str = "malformed onboarding state";
const INFO_MARKER: &str = "Onboarding started";

async fn call(router: &axum::Router, method: Method, uri: &str) -> axum::response::Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn stream_carries_onboarding_warnings_above_the_web_level() {
    let _ = chargedeck::logging::init_logging(&LoggingConfig::default());
    let dash = Dashboard::with_store(Config::default(), Box::new(MemoryStore::new())).unwrap();
    let router = chargedeck::web::build_router(dash.state());

    let response = call(&router, Method::POST, "/api/logs/web_level?level=WARN").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(&router, Method::GET, "/api/logs/stream").await;
    assert_eq!(response.status(), StatusCode::OK);
    let ct = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert!(ct.contains("text/event-stream"));

    // INFO from the wizard, then a WARN from rehydrating a corrupt store
    let started = call(&router, Method::POST, "/api/onboarding/start").await;
    assert_eq!(started.status(), StatusCode::OK);
    let mut corrupt = MemoryStore::new();
    corrupt.set(KEY_ACTIVE, "maybe").unwrap();
    let store = OnboardingStore::open(Box::new(corrupt));
    assert!(!store.is_onboarding());

    let mut body = response.into_body();
    let mut buf = String::new();
    let wait = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(Ok(frame)) = body.frame().await {
            if let Some(data) = frame.data_ref() {
                buf.push_str(&String::from_utf8_lossy(data));
                if buf.contains(WARN_MARKER) {
                    break;
                }
            }
        }
    })
    .await;

    let level = call(&router, Method::POST, "/api/logs/web_level?level=INFO").await;
    assert_eq!(level.status(), StatusCode::OK);
    dash.shutdown().await;

    assert!(wait.is_ok(), "no warning reached the log stream: {}", buf);
    assert!(buf.contains("event: log"), "missing named event: {}", buf);
    assert!(
        !buf.contains(INFO_MARKER),
        "INFO line passed a WARN web level: {}",
        buf
    );
}
