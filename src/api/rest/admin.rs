use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::api::rest::extract::AuthSession;
use crate::error::AppError;
use crate::models::identity::{Identity, Role};
use crate::models::order::OrderView;
use crate::models::stats::AdminStatistics;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/customers", get(customers))
        .route("/admin/riders", get(riders))
        .route("/admin/orders", get(orders))
}

async fn stats(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<AdminStatistics>, AppError> {
    session.require(&[Role::Admin])?;
    Ok(Json(state.engine.admin_statistics()))
}

async fn customers(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<Vec<Identity>>, AppError> {
    session.require(&[Role::Admin])?;
    Ok(Json(state.engine.list_by_role(Role::Customer)))
}

async fn riders(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<Vec<Identity>>, AppError> {
    session.require(&[Role::Admin])?;
    Ok(Json(state.engine.list_by_role(Role::Rider)))
}

async fn orders(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<Vec<OrderView>>, AppError> {
    session.require(&[Role::Admin])?;
    Ok(Json(state.engine.all_orders()))
}
