//! Repository interfaces for identities and orders.
//!
//! The engine only sees these traits; `memory` provides the DashMap-backed
//! implementation and `snapshot` makes it durable.

pub mod memory;
pub mod snapshot;

use crate::error::AppError;
use crate::models::identity::{ActiveStatus, GeoPoint, Identity, IdentityRecord, Role};
use crate::models::order::{Order, OrderRecord};

pub trait IdentityStore: Send + Sync {
    /// Fails with `DuplicateEmail` if any identity already uses the email.
    fn insert(&self, identity: Identity, password_hash: String) -> Result<Identity, AppError>;

    fn get(&self, id: &str) -> Option<Identity>;

    fn find_by_email(&self, email: &str) -> Option<IdentityRecord>;

    /// Identities of one role in insertion order.
    fn list_by_role(&self, role: Role) -> Vec<Identity>;

    fn count_by_role(&self, role: Role) -> usize;

    /// No-op when the id is unknown or not a rider.
    fn increment_delivery_count(&self, rider_id: &str);

    fn update_presence(
        &self,
        rider_id: &str,
        status: Option<ActiveStatus>,
        location: Option<GeoPoint>,
    ) -> Result<Identity, AppError>;

    fn records(&self) -> Vec<IdentityRecord>;
}

/// Closure applied to an order under its write lock.
pub type OrderMutation<'a> = dyn FnMut(&mut Order) -> Result<(), AppError> + 'a;

pub trait OrderStore: Send + Sync {
    fn insert(&self, order: Order) -> Order;

    fn get(&self, id: &str) -> Option<OrderRecord>;

    /// Applies `mutation` to a copy of the order and commits the copy only if
    /// the mutation succeeds. Concurrent updates of one order are serialized.
    fn update(&self, id: &str, mutation: &mut OrderMutation<'_>) -> Result<Order, AppError>;

    /// Matching orders in insertion order.
    fn filter(&self, predicate: &dyn Fn(&Order) -> bool) -> Vec<OrderRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> Vec<OrderRecord>;
}
