use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::identity::{Identity, Role};
use crate::state::AppState;

/// The caller behind a `Authorization: Bearer <token>` header.
pub struct AuthSession {
    pub token: String,
    pub identity: Identity,
}

impl AuthSession {
    pub fn resolve(state: &AppState, token: &str) -> Result<Self, AppError> {
        let identity_id = state
            .sessions
            .resolve(token)
            .ok_or(AppError::Unauthorized)?;
        let identity = state
            .engine
            .identity(&identity_id)
            .map_err(|_| AppError::Unauthorized)?;

        Ok(Self {
            token: token.to_string(),
            identity,
        })
    }

    pub fn require(&self, allowed: &[Role]) -> Result<&Identity, AppError> {
        let role = self.identity.role();
        if allowed.contains(&role) {
            Ok(&self.identity)
        } else {
            Err(AppError::Forbidden(format!(
                "{} accounts cannot perform this action",
                role.as_str()
            )))
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        AuthSession::resolve(state, token)
    }
}
