use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{SessionUser, SESSION_USER_KEY};

/// Page-level access gate for protected routes.
///
/// A missing, malformed or logged-out session redirects to the login
/// boundary instead of erroring; individual data operations re-check the
/// session themselves via the `AuthUser` extractor.
pub async fn auth_middleware(
    session: Session,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let user: Option<SessionUser> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

    if !user.map(|u| u.is_logged_in).unwrap_or(false) {
        return Ok(Redirect::to("/login").into_response());
    }

    Ok(next.run(request).await)
}
