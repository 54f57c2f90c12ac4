use askama::Template;
use axum::{extract::State, response::IntoResponse};
use comfort_core::error::AppError;

use crate::models::{AuthUser, SessionUser};
use crate::AppState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user: SessionUser,
    pub customer_count: i64,
    pub invoice_count: i64,
}

pub async fn index(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let (customer_count, invoice_count) = state.db.dashboard_counts().await?;

    Ok(IndexTemplate {
        user: auth_user.0,
        customer_count,
        invoice_count,
    })
}

pub async fn health_check() -> &'static str {
    "OK"
}
