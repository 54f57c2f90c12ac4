//! User account and session identity models.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tower_sessions::Session;
use uuid::Uuid;

/// Session key under which the logged-in identity is stored.
pub const SESSION_USER_KEY: &str = "user";

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Seller => "seller",
        }
    }

    /// Parse a stored role string. Unknown values are rejected rather than
    /// defaulted; a user row must carry exactly one of the two roles.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "seller" => Some(Role::Seller),
            _ => None,
        }
    }
}

/// User row. Accounts are provisioned out-of-band; this application only
/// reads them during login.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub created_utc: DateTime<Utc>,
}

/// Identity claims held in the session between login and logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_logged_in: bool,
}

/// Authenticated caller context extracted from the session.
///
/// Data-mutating handlers take this as a parameter so every write carries an
/// explicit caller identity; the page-level gate in `middleware::auth` only
/// covers navigation.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to extract session",
                )
                    .into_response()
            })?;

        let user: Option<SessionUser> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

        match user {
            Some(user) if user.is_logged_in => Ok(AuthUser(user)),
            _ => Err(Redirect::to("/login").into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_known_values() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("seller"), Some(Role::Seller));
    }

    #[test]
    fn role_rejects_unknown_values() {
        assert_eq!(Role::parse("manager"), None);
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("Admin"), None);
    }

    #[test]
    fn session_user_round_trips_through_serde() {
        let user = SessionUser {
            user_id: Uuid::new_v4(),
            email: "seller@example.com".to_string(),
            name: "Seller".to_string(),
            role: Role::Seller,
            is_logged_in: true,
        };

        let json = serde_json::to_string(&user).expect("serialize");
        let back: SessionUser = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.user_id, user.user_id);
        assert_eq!(back.role, Role::Seller);
        assert!(back.is_logged_in);
    }
}
