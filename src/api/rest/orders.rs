use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::api::rest::extract::AuthSession;
use crate::engine::lifecycle::Transition;
use crate::error::AppError;
use crate::models::identity::{Identity, Role};
use crate::models::order::{NewOrder, Order, OrderStatus, OrderView};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/available", get(available_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/accept", post(accept_order))
        .route("/orders/:id/pickup", post(pickup_order))
        .route("/orders/:id/deliver", post(deliver_order))
        .route("/orders/:id/cancel", post(cancel_order))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub pickup_address: String,
    pub drop_address: String,
    pub item_description: String,
    #[serde(default)]
    pub item_image: Option<String>,
}

/// Whether `identity` may see `order`: admins see everything, customers
/// their own orders, riders their assignments plus the open pool.
pub fn can_view(identity: &Identity, order: &Order) -> bool {
    match identity.role() {
        Role::Admin => true,
        Role::Customer => order.customer_id == identity.id,
        Role::Rider => {
            order.status == OrderStatus::Pending
                || order.rider_id.as_deref() == Some(identity.id.as_str())
        }
    }
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<OrderView>, AppError> {
    let customer = session.require(&[Role::Customer])?;
    let fare = state
        .fares
        .quote(&payload.pickup_address, &payload.drop_address);

    let view = state.engine.create_order(NewOrder {
        customer_id: customer.id.clone(),
        pickup_address: payload.pickup_address,
        drop_address: payload.drop_address,
        item_description: payload.item_description,
        item_image: payload.item_image,
        fare,
    })?;

    state.metrics.orders_created_total.inc();
    state.publish_order(&view);

    Ok(Json(view))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Json<Vec<OrderView>> {
    let identity = &session.identity;
    let orders = match identity.role() {
        Role::Customer => state.engine.orders_for_customer(&identity.id),
        Role::Rider => state.engine.orders_for_rider(&identity.id),
        Role::Admin => state.engine.all_orders(),
    };
    Json(orders)
}

async fn available_orders(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<Vec<OrderView>>, AppError> {
    session.require(&[Role::Rider, Role::Admin])?;
    Ok(Json(state.engine.available_orders()))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    session: AuthSession,
) -> Result<Json<OrderView>, AppError> {
    let view = state.engine.order(&id)?;
    if !can_view(&session.identity, &view.order) {
        return Err(AppError::NotFound(format!("order {id} not found")));
    }
    Ok(Json(view))
}

fn run_transition(
    state: &AppState,
    order_id: &str,
    transition: Transition,
    session: &AuthSession,
) -> Result<Json<OrderView>, AppError> {
    let result = state
        .engine
        .transition(order_id, transition, &session.identity.id);

    let outcome = if result.is_ok() { "success" } else { "rejected" };
    state
        .metrics
        .order_transitions_total
        .with_label_values(&[transition.as_str(), outcome])
        .inc();

    let view = result?;
    state.publish_order(&view);
    Ok(Json(view))
}

async fn accept_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    session: AuthSession,
) -> Result<Json<OrderView>, AppError> {
    run_transition(&state, &id, Transition::Accept, &session)
}

async fn pickup_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    session: AuthSession,
) -> Result<Json<OrderView>, AppError> {
    run_transition(&state, &id, Transition::MarkPickedUp, &session)
}

async fn deliver_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    session: AuthSession,
) -> Result<Json<OrderView>, AppError> {
    run_transition(&state, &id, Transition::MarkDelivered, &session)
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    session: AuthSession,
) -> Result<Json<OrderView>, AppError> {
    run_transition(&state, &id, Transition::Cancel, &session)
}
