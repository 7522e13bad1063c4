use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::rest::extract::AuthSession;
use crate::error::AppError;
use crate::models::identity::{Identity, NewIdentity, Role};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub identity: Identity,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    match payload.role {
        Role::Customer | Role::Rider => {}
        Role::Admin => {
            return Err(AppError::Validation(
                "admin accounts cannot self-register".to_string(),
            ));
        }
    }

    let candidate = NewIdentity {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        role: payload.role,
        password: payload.password,
    };

    // Password hashing is CPU-bound.
    let engine_state = state.clone();
    let identity = tokio::task::spawn_blocking(move || engine_state.engine.register(candidate))
        .await
        .map_err(|err| AppError::Internal(format!("registration task failed: {err}")))??;

    state
        .metrics
        .registrations_total
        .with_label_values(&[identity.role().as_str()])
        .inc();
    state.mark_dirty();

    let token = state.sessions.issue(&identity.id);
    Ok(Json(SessionResponse { token, identity }))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let engine_state = state.clone();
    let identity = tokio::task::spawn_blocking(move || {
        engine_state
            .engine
            .authenticate(&payload.email, &payload.password)
    })
    .await
    .map_err(|err| AppError::Internal(format!("login task failed: {err}")))??;

    let token = state.sessions.issue(&identity.id);
    info!(identity_id = %identity.id, role = identity.role().as_str(), "login succeeded");

    Ok(Json(SessionResponse { token, identity }))
}

async fn logout(State(state): State<Arc<AppState>>, session: AuthSession) -> StatusCode {
    state.sessions.revoke(&session.token);
    StatusCode::NO_CONTENT
}

async fn me(session: AuthSession) -> Json<Identity> {
    Json(session.identity)
}
