//! Order lifecycle engine.
//!
//! `Engine` owns handles to the identity and order stores and exposes the
//! commands (register, create, transition) and role-scoped queries. Every
//! query goes through [`Engine::populate`] so embedded identities follow a
//! single rule.

pub mod accounts;
pub mod lifecycle;
pub mod orders;
pub mod projection;

use std::sync::Arc;

use crate::store::memory::{MemoryIdentityStore, MemoryOrderStore};
use crate::store::snapshot::Snapshot;
use crate::store::{IdentityStore, OrderStore};

pub struct Engine {
    identities: Arc<dyn IdentityStore>,
    orders: Arc<dyn OrderStore>,
}

impl Engine {
    pub fn new(identities: Arc<dyn IdentityStore>, orders: Arc<dyn OrderStore>) -> Self {
        Self { identities, orders }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryIdentityStore::new()),
            Arc::new(MemoryOrderStore::new()),
        )
    }

    pub fn from_snapshot(mut snapshot: Snapshot) -> Self {
        snapshot.reconcile_delivery_counts();
        Self::new(
            Arc::new(MemoryIdentityStore::from_records(snapshot.identities)),
            Arc::new(MemoryOrderStore::from_records(snapshot.orders)),
        )
    }

    pub fn identities(&self) -> &dyn IdentityStore {
        self.identities.as_ref()
    }

    pub fn orders(&self) -> &dyn OrderStore {
        self.orders.as_ref()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.identities.as_ref(), self.orders.as_ref())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;

    use super::Engine;
    use crate::models::identity::{Identity, Profile, Role};
    use crate::models::order::NewOrder;

    /// Inserts an identity with a placeholder credential, skipping hashing.
    pub fn add_identity(engine: &Engine, id: &str, role: Role) -> Identity {
        engine
            .identities()
            .insert(
                Identity {
                    id: id.to_string(),
                    name: format!("{id} name"),
                    email: format!("{id}@example.com"),
                    phone: "555-0100".to_string(),
                    profile: Profile::for_role(role),
                    created_at: Utc::now(),
                },
                "unused".to_string(),
            )
            .unwrap()
    }

    pub fn new_order(customer_id: &str, fare: f64) -> NewOrder {
        NewOrder {
            customer_id: customer_id.to_string(),
            pickup_address: "A".to_string(),
            drop_address: "B".to_string(),
            item_description: "box".to_string(),
            item_image: None,
            fare,
        }
    }
}
