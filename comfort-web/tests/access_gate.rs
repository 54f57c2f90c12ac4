//! Access gate tests that run without a database.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::from_fn,
    routing::get,
    Router,
};
use comfort_web::handlers::app::health_check;
use comfort_web::middleware::auth::auth_middleware;
use tower::util::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

/// A router with the same gate wiring as the real application, minus the
/// database-backed handlers.
fn gated_router() -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

    let protected = Router::new()
        .route("/", get(|| async { "dashboard" }))
        .route("/customers", get(|| async { "customers" }))
        .route_layer(from_fn(auth_middleware));

    Router::new()
        .merge(protected)
        .route("/health", get(health_check))
        .route("/login", get(|| async { "login" }))
        .layer(session_layer)
}

#[tokio::test]
async fn health_check_is_public() {
    let app = gated_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_page_is_public() {
    let app = gated_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unauthenticated_request_redirects_to_login() {
    let app = gated_router();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/login")
    );
}

#[tokio::test]
async fn every_gated_route_redirects_without_a_session() {
    for uri in ["/", "/customers"] {
        let response = gated_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::SEE_OTHER,
            "expected redirect for {}",
            uri
        );
    }
}
