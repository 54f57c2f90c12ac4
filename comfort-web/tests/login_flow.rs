//! Login flow tests against a real PostgreSQL database.
//!
//! These tests need a database reachable through `DATABASE_URL` and are
//! ignored by default; run them with `cargo test -- --ignored`.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use comfort_web::config::SessionSettings;
use comfort_web::services::Database;
use comfort_web::startup::build_router;
use comfort_web::utils::{hash_password, Password};
use comfort_web::AppState;
use tower::util::ServiceExt;
use uuid::Uuid;

const PASSWORD: &str = "mySecurePassword123";

async fn test_db() -> Database {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for database-backed tests");
    let db = Database::new(&url, 5, 1)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}

/// Seed a user with a real argon2 hash and return the application router
/// plus the seeded email.
async fn app_with_user() -> (Router, String) {
    let db = test_db().await;

    let email = format!("seller-{}@example.com", Uuid::new_v4());
    let hash = hash_password(&Password::new(PASSWORD.to_string())).expect("Failed to hash");
    db.create_user(&email, "Login Test", hash.as_str(), "seller")
        .await
        .expect("Failed to create user");

    let app = build_router(AppState::new(db), &SessionSettings::default());
    (app, email)
}

fn login_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(Body::from(format!("email={}&password={}", email, password)))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8_lossy(&bytes).into_owned()
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn login_accepts_email_in_any_case() {
    let (app, email) = app_with_user().await;

    let response = app
        .oneshot(login_request(&email.to_uppercase(), PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/")
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn wrong_password_and_unknown_email_fail_identically() {
    let (app, email) = app_with_user().await;

    let wrong_password = app
        .clone()
        .oneshot(login_request(&email, "notThePassword"))
        .await
        .unwrap();
    let unknown_email = app
        .oneshot(login_request("nobody@example.com", PASSWORD))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    // Same page, same message: the form must not reveal which part was wrong.
    let wrong_body = body_text(wrong_password).await;
    let unknown_body = body_text(unknown_email).await;
    assert!(wrong_body.contains("Invalid email or password"));
    assert_eq!(wrong_body, unknown_body);
}
