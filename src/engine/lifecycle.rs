use crate::error::AppError;
use crate::models::identity::{Identity, Role};
use crate::models::order::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    MarkPickedUp,
    MarkDelivered,
    Cancel,
}

impl Transition {
    pub fn target(&self) -> OrderStatus {
        match self {
            Transition::Accept => OrderStatus::Accepted,
            Transition::MarkPickedUp => OrderStatus::PickedUp,
            Transition::MarkDelivered => OrderStatus::Delivered,
            Transition::Cancel => OrderStatus::Cancelled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Accept => "accept",
            Transition::MarkPickedUp => "mark_picked_up",
            Transition::MarkDelivered => "mark_delivered",
            Transition::Cancel => "cancel",
        }
    }
}

/// Follow-up the caller must apply to other records once the order commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    CreditDelivery { rider_id: String },
}

fn reject(order: &Order, transition: Transition, reason: impl Into<String>) -> AppError {
    AppError::InvalidTransition {
        attempted: transition.target(),
        current: order.status,
        reason: reason.into(),
    }
}

fn is_assigned_rider(order: &Order, actor: &Identity) -> bool {
    match actor.role() {
        Role::Rider => order.rider_id.as_deref() == Some(actor.id.as_str()),
        Role::Customer | Role::Admin => false,
    }
}

/// Checks the guard for `transition` and applies it to `order` in place.
///
/// On error the order is left exactly as it was. Re-applying a transition
/// that already happened is rejected like any other guard violation.
pub fn apply(order: &mut Order, transition: Transition, actor: &Identity) -> Result<Effect, AppError> {
    match transition {
        Transition::Accept => {
            if order.status != OrderStatus::Pending {
                return Err(reject(order, transition, "only pending orders can be accepted"));
            }
            match actor.role() {
                Role::Rider => {}
                Role::Customer | Role::Admin => {
                    return Err(reject(
                        order,
                        transition,
                        format!("identity {} is not a rider", actor.id),
                    ));
                }
            }

            order.rider_id = Some(actor.id.clone());
            order.status = OrderStatus::Accepted;
            Ok(Effect::None)
        }
        Transition::MarkPickedUp => {
            if order.status != OrderStatus::Accepted {
                return Err(reject(order, transition, "order is not awaiting pickup"));
            }
            if !is_assigned_rider(order, actor) {
                return Err(reject(
                    order,
                    transition,
                    format!("identity {} is not the assigned rider", actor.id),
                ));
            }

            order.status = OrderStatus::PickedUp;
            Ok(Effect::None)
        }
        Transition::MarkDelivered => {
            if order.status != OrderStatus::PickedUp {
                return Err(reject(order, transition, "order has not been picked up"));
            }
            if !is_assigned_rider(order, actor) {
                return Err(reject(
                    order,
                    transition,
                    format!("identity {} is not the assigned rider", actor.id),
                ));
            }

            order.status = OrderStatus::Delivered;
            Ok(Effect::CreditDelivery {
                rider_id: actor.id.clone(),
            })
        }
        Transition::Cancel => {
            if !matches!(order.status, OrderStatus::Pending | OrderStatus::Accepted) {
                return Err(reject(
                    order,
                    transition,
                    "only pending or accepted orders can be cancelled",
                ));
            }
            let allowed = match actor.role() {
                Role::Customer => order.customer_id == actor.id,
                Role::Admin => true,
                Role::Rider => false,
            };
            if !allowed {
                return Err(reject(
                    order,
                    transition,
                    format!("identity {} may not cancel this order", actor.id),
                ));
            }

            order.status = OrderStatus::Cancelled;
            Ok(Effect::None)
        }
    }
}
