use std::sync::Arc;

use axum::extract::State;
use axum::routing::patch;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;

use crate::api::rest::extract::AuthSession;
use crate::error::AppError;
use crate::models::identity::{ActiveStatus, GeoPoint, Identity, Role};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/riders/me/status", patch(update_rider_status))
        .route("/riders/me/location", patch(update_rider_location))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ActiveStatus,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

async fn update_rider_status(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Identity>, AppError> {
    let rider = session.require(&[Role::Rider])?;
    let updated = state
        .engine
        .update_rider_presence(&rider.id, Some(payload.status), None)?;

    info!(rider_id = %updated.id, status = ?payload.status, "rider status changed");
    state.mark_dirty();
    Ok(Json(updated))
}

async fn update_rider_location(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Identity>, AppError> {
    let rider = session.require(&[Role::Rider])?;
    let updated = state
        .engine
        .update_rider_presence(&rider.id, None, Some(payload.location))?;

    state.mark_dirty();
    Ok(Json(updated))
}
