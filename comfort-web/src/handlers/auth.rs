use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use comfort_core::error::AppError;
use serde::Deserialize;
use tower_sessions::Session;
use validator::Validate;

use crate::models::{Role, SessionUser, SESSION_USER_KEY};
use crate::utils::{verify_password, Password, PasswordHashString};
use crate::AppState;

/// Unknown email and wrong password produce the same message so the login
/// form cannot be used to enumerate accounts.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// An already-authenticated visitor is sent back to the protected root
/// instead of seeing the login form again.
pub async fn login_page(session: Session) -> Result<Response, AppError> {
    let user: Option<SessionUser> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

    if user.map(|u| u.is_logged_in).unwrap_or(false) {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(LoginTemplate { error: None }.into_response())
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Form(payload): Form<LoginRequest>,
) -> Result<Response, AppError> {
    if payload.validate().is_err() {
        return Ok(login_rejected(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Email and password are required",
        ));
    }

    let Some(user) = state.db.get_user_by_email(payload.email.trim()).await? else {
        return Ok(login_rejected(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    };

    let password = Password::new(payload.password);
    let stored_hash = PasswordHashString::new(user.password_hash.clone());
    if !verify_password(&password, &stored_hash) {
        return Ok(login_rejected(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    let Some(role) = Role::parse(&user.role) else {
        return Err(AppError::InternalError(anyhow::anyhow!(
            "User row carries an unknown role"
        )));
    };

    let session_user = SessionUser {
        user_id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role,
        is_logged_in: true,
    };

    session
        .insert(SESSION_USER_KEY, &session_user)
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to write session: {}", e)))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Redirect::to("/").into_response())
}

fn login_rejected(status: StatusCode, message: &str) -> Response {
    (
        status,
        LoginTemplate {
            error: Some(message.to_string()),
        },
    )
        .into_response()
}

pub async fn logout_handler(session: Session) -> impl IntoResponse {
    session.clear().await;

    Redirect::to("/login")
}
