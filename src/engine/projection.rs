use crate::engine::Engine;
use crate::models::identity::Role;
use crate::models::order::{Order, OrderRecord, OrderStatus, OrderView};
use crate::models::stats::AdminStatistics;

impl Engine {
    /// Embeds the customer and rider as they exist right now. A reference
    /// that no longer resolves is left out instead of failing the read.
    pub fn populate(&self, order: Order) -> OrderView {
        let customer = self.identities.get(&order.customer_id);
        let rider = order
            .rider_id
            .as_deref()
            .and_then(|rider_id| self.identities.get(rider_id));

        OrderView {
            order,
            customer,
            rider,
        }
    }

    fn newest_first(&self, mut records: Vec<OrderRecord>) -> Vec<OrderView> {
        records.sort_by(|a, b| {
            b.order
                .created_at
                .cmp(&a.order.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        records
            .into_iter()
            .map(|record| self.populate(record.order))
            .collect()
    }

    pub fn orders_for_customer(&self, customer_id: &str) -> Vec<OrderView> {
        self.newest_first(
            self.orders
                .filter(&|order| order.customer_id == customer_id),
        )
    }

    /// Every order the rider was assigned, whatever its status.
    pub fn orders_for_rider(&self, rider_id: &str) -> Vec<OrderView> {
        self.newest_first(
            self.orders
                .filter(&|order| order.rider_id.as_deref() == Some(rider_id)),
        )
    }

    pub fn available_orders(&self) -> Vec<OrderView> {
        self.newest_first(
            self.orders
                .filter(&|order| order.status == OrderStatus::Pending),
        )
    }

    /// Store order, oldest first.
    pub fn all_orders(&self) -> Vec<OrderView> {
        self.orders
            .records()
            .into_iter()
            .map(|record| self.populate(record.order))
            .collect()
    }

    pub fn admin_statistics(&self) -> AdminStatistics {
        let total_revenue: f64 = self
            .orders
            .filter(&|order| order.status == OrderStatus::Delivered)
            .iter()
            .map(|record| record.order.fare)
            .sum();

        AdminStatistics {
            total_customers: self.identities.count_by_role(Role::Customer),
            total_riders: self.identities.count_by_role(Role::Rider),
            total_orders: self.orders.len(),
            total_revenue,
        }
    }

    /// Delivered orders per rider, computed from the order store. Must match
    /// each rider's cached `total_deliveries`.
    pub fn derived_delivery_count(&self, rider_id: &str) -> u64 {
        self.orders
            .filter(&|order| {
                order.status == OrderStatus::Delivered && order.rider_id.as_deref() == Some(rider_id)
            })
            .len() as u64
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::lifecycle::Transition;
    use crate::engine::testing::{add_identity, new_order};
    use crate::engine::Engine;
    use crate::models::identity::Role;
    use crate::models::order::OrderStatus;

    fn deliver(engine: &Engine, order_id: &str, rider_id: &str) {
        engine.transition(order_id, Transition::Accept, rider_id).unwrap();
        engine
            .transition(order_id, Transition::MarkPickedUp, rider_id)
            .unwrap();
        engine
            .transition(order_id, Transition::MarkDelivered, rider_id)
            .unwrap();
    }

    #[test]
    fn customer_sees_only_own_orders_newest_first() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        add_identity(&engine, "user2", Role::Customer);

        let first = engine.create_order(new_order("user1", 5.0)).unwrap();
        engine.create_order(new_order("user2", 6.0)).unwrap();
        let third = engine.create_order(new_order("user1", 7.0)).unwrap();

        let ids: Vec<String> = engine
            .orders_for_customer("user1")
            .into_iter()
            .map(|view| view.order.id)
            .collect();
        assert_eq!(ids, vec![third.order.id, first.order.id]);
        assert!(engine.orders_for_customer("nobody").is_empty());
    }

    #[test]
    fn rider_view_and_available_pool_are_disjoint_scopes() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        add_identity(&engine, "rider1", Role::Rider);
        add_identity(&engine, "rider2", Role::Rider);

        let taken = engine.create_order(new_order("user1", 5.0)).unwrap().order.id;
        let delivered = engine.create_order(new_order("user1", 6.0)).unwrap().order.id;
        let open = engine.create_order(new_order("user1", 7.0)).unwrap().order.id;

        engine.transition(&taken, Transition::Accept, "rider1").unwrap();
        deliver(&engine, &delivered, "rider1");

        let mine: Vec<String> = engine
            .orders_for_rider("rider1")
            .into_iter()
            .map(|view| view.order.id)
            .collect();
        assert_eq!(mine, vec![delivered.clone(), taken.clone()]);
        assert!(engine.orders_for_rider("rider2").is_empty());

        let available: Vec<String> = engine
            .available_orders()
            .into_iter()
            .map(|view| view.order.id)
            .collect();
        assert_eq!(available, vec![open]);
    }

    #[test]
    fn populate_reads_identities_at_query_time() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        add_identity(&engine, "rider1", Role::Rider);
        let id = engine.create_order(new_order("user1", 5.0)).unwrap().order.id;
        deliver(&engine, &id, "rider1");

        let view = engine.order(&id).unwrap();
        let rider = view.rider.unwrap();
        assert_eq!(rider.rider_profile().unwrap().total_deliveries, 1);
        assert_eq!(view.customer.unwrap().name, "user1 name");
    }

    #[test]
    fn dangling_references_are_left_absent() {
        let engine = Engine::in_memory();
        let view = engine.populate(crate::models::order::Order {
            id: "orphan".to_string(),
            customer_id: "gone".to_string(),
            rider_id: Some("also-gone".to_string()),
            pickup_address: "A".to_string(),
            drop_address: "B".to_string(),
            item_description: "box".to_string(),
            item_image: None,
            status: OrderStatus::Accepted,
            fare: 1.0,
            created_at: chrono::Utc::now(),
        });

        assert!(view.customer.is_none());
        assert!(view.rider.is_none());
        assert_eq!(view.order.rider_id.as_deref(), Some("also-gone"));
    }

    #[test]
    fn mutating_a_view_does_not_touch_the_store() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        let mut view = engine.create_order(new_order("user1", 5.0)).unwrap();

        view.order.status = OrderStatus::Delivered;
        if let Some(customer) = view.customer.as_mut() {
            customer.name = "Mallory".to_string();
        }

        let stored = engine.order(&view.order.id).unwrap();
        assert_eq!(stored.order.status, OrderStatus::Pending);
        assert_eq!(stored.customer.unwrap().name, "user1 name");
    }

    #[test]
    fn revenue_counts_only_delivered_fares() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        add_identity(&engine, "rider1", Role::Rider);
        add_identity(&engine, "admin1", Role::Admin);

        let a = engine.create_order(new_order("user1", 12.75)).unwrap().order.id;
        let b = engine.create_order(new_order("user1", 20.0)).unwrap().order.id;
        let c = engine.create_order(new_order("user1", 7.25)).unwrap().order.id;
        let d = engine.create_order(new_order("user1", 100.0)).unwrap().order.id;

        deliver(&engine, &a, "rider1");
        deliver(&engine, &c, "rider1");
        engine.transition(&b, Transition::Accept, "rider1").unwrap();
        engine.transition(&d, Transition::Cancel, "admin1").unwrap();

        let stats = engine.admin_statistics();
        assert_eq!(stats.total_customers, 1);
        assert_eq!(stats.total_riders, 1);
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.total_revenue, 20.0);
    }

    #[test]
    fn cached_counter_matches_derived_count() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        add_identity(&engine, "rider1", Role::Rider);
        add_identity(&engine, "rider2", Role::Rider);

        for rider in ["rider1", "rider2", "rider1"] {
            let id = engine.create_order(new_order("user1", 3.0)).unwrap().order.id;
            deliver(&engine, &id, rider);
        }
        let stalled = engine.create_order(new_order("user1", 3.0)).unwrap().order.id;
        engine.transition(&stalled, Transition::Accept, "rider2").unwrap();

        for rider in ["rider1", "rider2"] {
            let cached = engine
                .identity(rider)
                .unwrap()
                .rider_profile()
                .unwrap()
                .total_deliveries;
            assert_eq!(cached, engine.derived_delivery_count(rider));
        }
        assert_eq!(engine.derived_delivery_count("rider1"), 2);
    }

    #[test]
    fn all_orders_keeps_store_order() {
        let engine = Engine::in_memory();
        add_identity(&engine, "user1", Role::Customer);
        let first = engine.create_order(new_order("user1", 1.0)).unwrap().order.id;
        let second = engine.create_order(new_order("user1", 2.0)).unwrap().order.id;

        let ids: Vec<String> = engine
            .all_orders()
            .into_iter()
            .map(|view| view.order.id)
            .collect();
        assert_eq!(ids, vec![first, second]);
    }
}
