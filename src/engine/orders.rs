use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::lifecycle::{self, Effect, Transition};
use crate::engine::Engine;
use crate::error::AppError;
use crate::models::identity::Role;
use crate::models::order::{NewOrder, Order, OrderStatus, OrderView};

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

pub fn validate_image(image: &str) -> Result<(), AppError> {
    if image.is_empty() {
        return Err(AppError::Validation("item_image cannot be empty".to_string()));
    }
    STANDARD
        .decode(image)
        .map(|_| ())
        .map_err(|err| AppError::Validation(format!("item_image is not valid base64: {err}")))
}

fn validate_new_order(new_order: &NewOrder) -> Result<(), AppError> {
    require_text("customer_id", &new_order.customer_id)?;
    require_text("pickup_address", &new_order.pickup_address)?;
    require_text("drop_address", &new_order.drop_address)?;
    require_text("item_description", &new_order.item_description)?;

    if !new_order.fare.is_finite() || new_order.fare < 0.0 {
        return Err(AppError::Validation(format!(
            "fare must be a non-negative amount, got {}",
            new_order.fare
        )));
    }
    if let Some(image) = &new_order.item_image {
        validate_image(image)?;
    }
    Ok(())
}

impl Engine {
    /// Creates a pending, unassigned order for an existing customer. The fare
    /// is taken as given and never recomputed.
    pub fn create_order(&self, new_order: NewOrder) -> Result<OrderView, AppError> {
        validate_new_order(&new_order)?;

        let customer = self.identities.get(&new_order.customer_id).ok_or_else(|| {
            AppError::NotFound(format!("customer {} not found", new_order.customer_id))
        })?;
        match customer.role() {
            Role::Customer => {}
            Role::Rider | Role::Admin => {
                return Err(AppError::Validation(format!(
                    "identity {} is not a customer",
                    customer.id
                )));
            }
        }

        let order = Order {
            id: Uuid::new_v4().to_string(),
            customer_id: customer.id,
            rider_id: None,
            pickup_address: new_order.pickup_address.trim().to_string(),
            drop_address: new_order.drop_address.trim().to_string(),
            item_description: new_order.item_description.trim().to_string(),
            item_image: new_order.item_image,
            status: OrderStatus::Pending,
            fare: new_order.fare,
            created_at: Utc::now(),
        };

        let order = self.orders.insert(order);
        info!(
            order_id = %order.id,
            customer_id = %order.customer_id,
            fare = order.fare,
            "order created"
        );

        Ok(self.populate(order))
    }

    /// Applies `transition` on behalf of `acting_id`.
    ///
    /// The guard check, the status change and the rider's delivery credit all
    /// happen while the order's write lock is held, so two racing accepts on
    /// one order produce exactly one winner.
    pub fn transition(
        &self,
        order_id: &str,
        transition: Transition,
        acting_id: &str,
    ) -> Result<OrderView, AppError> {
        let actor = self.identities.get(acting_id);

        let updated = self.orders.update(order_id, &mut |order| {
            let Some(actor) = actor.as_ref() else {
                return Err(AppError::InvalidTransition {
                    attempted: transition.target(),
                    current: order.status,
                    reason: format!("identity {acting_id} not found"),
                });
            };

            match lifecycle::apply(order, transition, actor)? {
                Effect::None => {}
                Effect::CreditDelivery { rider_id } => {
                    self.identities.increment_delivery_count(&rider_id);
                }
            }
            Ok(())
        });

        let updated = match updated {
            Ok(order) => order,
            Err(err) => {
                debug!(
                    order_id,
                    acting_id,
                    transition = transition.as_str(),
                    error = %err,
                    "transition rejected"
                );
                return Err(err);
            }
        };

        info!(
            order_id = %updated.id,
            acting_id,
            transition = transition.as_str(),
            status = ?updated.status,
            "order transitioned"
        );

        Ok(self.populate(updated))
    }

    pub fn order(&self, order_id: &str) -> Result<OrderView, AppError> {
        let record = self
            .orders
            .get(order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
        Ok(self.populate(record.order))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::engine::lifecycle::Transition;
    use crate::engine::testing::{add_identity, new_order};
    use crate::engine::Engine;
    use crate::error::AppError;
    use crate::models::identity::Role;
    use crate::models::order::OrderStatus;

    fn deliveries(engine: &Engine, rider_id: &str) -> u64 {
        engine
            .identity(rider_id)
            .unwrap()
            .rider_profile()
            .unwrap()
            .total_deliveries
    }

    #[test]
    fn created_order_is_pending_and_listed_first() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);

        let older = engine.create_order(new_order("user1", 8.0)).unwrap();
        let created = engine.create_order(new_order("user1", 12.75)).unwrap();

        assert_eq!(created.order.status, OrderStatus::Pending);
        assert!(created.order.rider_id.is_none());
        assert!(created.rider.is_none());
        assert_eq!(created.customer.as_ref().unwrap().id, "user1");

        let listed = engine.orders_for_customer("user1");
        assert_eq!(listed[0].order.id, created.order.id);
        assert_eq!(listed[1].order.id, older.order.id);
    }

    #[test]
    fn reference_scenario_runs_to_delivery() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        add_identity(&engine, "rider1", Role::Rider);

        let created = engine.create_order(new_order("user1", 12.75)).unwrap();
        assert_eq!(created.order.status, OrderStatus::Pending);
        let id = created.order.id;

        let accepted = engine.transition(&id, Transition::Accept, "rider1").unwrap();
        assert_eq!(accepted.order.status, OrderStatus::Accepted);
        assert_eq!(accepted.order.rider_id.as_deref(), Some("rider1"));
        assert_eq!(accepted.rider.as_ref().unwrap().id, "rider1");

        let picked = engine
            .transition(&id, Transition::MarkPickedUp, "rider1")
            .unwrap();
        assert_eq!(picked.order.status, OrderStatus::PickedUp);

        let delivered = engine
            .transition(&id, Transition::MarkDelivered, "rider1")
            .unwrap();
        assert_eq!(delivered.order.status, OrderStatus::Delivered);
        assert_eq!(delivered.order.fare, 12.75);
        assert_eq!(deliveries(&engine, "rider1"), 1);
        assert_eq!(
            delivered.rider.unwrap().rider_profile().unwrap().total_deliveries,
            1
        );
    }

    #[test]
    fn repeated_delivery_does_not_double_count() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        add_identity(&engine, "rider1", Role::Rider);
        let id = engine.create_order(new_order("user1", 5.0)).unwrap().order.id;

        engine.transition(&id, Transition::Accept, "rider1").unwrap();
        engine.transition(&id, Transition::MarkPickedUp, "rider1").unwrap();
        engine.transition(&id, Transition::MarkDelivered, "rider1").unwrap();
        let err = engine
            .transition(&id, Transition::MarkDelivered, "rider1")
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::InvalidTransition {
                attempted: OrderStatus::Delivered,
                current: OrderStatus::Delivered,
                ..
            }
        ));
        assert_eq!(deliveries(&engine, "rider1"), 1);
    }

    #[test]
    fn create_validates_inputs_and_customer() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        add_identity(&engine, "rider1", Role::Rider);

        let mut blank = new_order("user1", 5.0);
        blank.pickup_address = " ".to_string();
        assert!(matches!(engine.create_order(blank), Err(AppError::Validation(_))));

        assert!(matches!(
            engine.create_order(new_order("user1", -1.0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            engine.create_order(new_order("user1", f64::NAN)),
            Err(AppError::Validation(_))
        ));

        let mut bad_image = new_order("user1", 5.0);
        bad_image.item_image = Some("%%% not base64".to_string());
        assert!(matches!(
            engine.create_order(bad_image),
            Err(AppError::Validation(_))
        ));

        assert!(matches!(
            engine.create_order(new_order("ghost", 5.0)),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            engine.create_order(new_order("rider1", 5.0)),
            Err(AppError::Validation(_))
        ));
        assert!(engine.orders().is_empty());
    }

    #[test]
    fn image_is_kept_verbatim() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);

        let mut with_image = new_order("user1", 5.0);
        with_image.item_image = Some("aGVsbG8gd29ybGQ=".to_string());
        let created = engine.create_order(with_image).unwrap();

        assert_eq!(created.order.item_image.as_deref(), Some("aGVsbG8gd29ybGQ="));
    }

    #[test]
    fn transition_on_unknown_order_is_not_found() {
        let engine = Engine::in_memory();
        add_identity(&engine, "rider1", Role::Rider);

        let err = engine
            .transition("missing", Transition::Accept, "rider1")
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn unknown_actor_cannot_accept() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        let id = engine.create_order(new_order("user1", 5.0)).unwrap().order.id;

        let err = engine.transition(&id, Transition::Accept, "ghost").unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
        assert_eq!(engine.order(&id).unwrap().order.status, OrderStatus::Pending);
    }

    #[test]
    fn invalid_attempts_leave_order_unchanged() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        add_identity(&engine, "rider1", Role::Rider);
        let id = engine.create_order(new_order("user1", 5.0)).unwrap().order.id;
        let before = engine.order(&id).unwrap();

        for transition in [Transition::MarkPickedUp, Transition::MarkDelivered] {
            let err = engine.transition(&id, transition, "rider1").unwrap_err();
            assert!(matches!(
                err,
                AppError::InvalidTransition {
                    current: OrderStatus::Pending,
                    ..
                }
            ));
        }

        assert_eq!(engine.order(&id).unwrap(), before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_accepts_have_exactly_one_winner() {
        let engine = Arc::new(Engine::in_memory());
        add_identity(&engine, "user1", Role::Customer);
        let riders: Vec<String> = (0..8).map(|i| format!("rider{i}")).collect();
        for rider in &riders {
            add_identity(&engine, rider, Role::Rider);
        }
        let id = engine.create_order(new_order("user1", 9.5)).unwrap().order.id;

        let handles: Vec<_> = riders
            .iter()
            .cloned()
            .map(|rider| {
                let engine = engine.clone();
                let id = id.clone();
                tokio::spawn(async move { engine.transition(&id, Transition::Accept, &rider) })
            })
            .collect();

        let mut winners = Vec::new();
        let mut losers = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(view) => winners.push(view.order.rider_id.unwrap()),
                Err(AppError::InvalidTransition { .. }) => losers += 1,
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }

        assert_eq!(winners.len(), 1);
        assert_eq!(losers, riders.len() - 1);
        let stored = engine.order(&id).unwrap().order;
        assert_eq!(stored.status, OrderStatus::Accepted);
        assert_eq!(stored.rider_id.as_ref(), Some(&winners[0]));
    }
}
