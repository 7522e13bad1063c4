use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::AppError;
use crate::models::identity::{ActiveStatus, GeoPoint, Identity, IdentityRecord, Profile, Role};
use crate::models::order::{Order, OrderRecord};
use crate::store::{IdentityStore, OrderMutation, OrderStore};

pub struct MemoryIdentityStore {
    identities: DashMap<String, IdentityRecord>,
    emails: DashMap<String, String>,
    next_seq: AtomicU64,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn from_records(records: Vec<IdentityRecord>) -> Self {
        let next_seq = records.iter().map(|record| record.seq + 1).max().unwrap_or(0);
        let identities = DashMap::new();
        let emails = DashMap::new();

        for record in records {
            emails.insert(record.identity.email.clone(), record.identity.id.clone());
            identities.insert(record.identity.id.clone(), record);
        }

        Self {
            identities,
            emails,
            next_seq: AtomicU64::new(next_seq),
        }
    }
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn insert(&self, identity: Identity, password_hash: String) -> Result<Identity, AppError> {
        match self.emails.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(AppError::DuplicateEmail(identity.email)),
            Entry::Vacant(slot) => {
                if self.identities.contains_key(&identity.id) {
                    return Err(AppError::Internal(format!(
                        "identity id {} already in use",
                        identity.id
                    )));
                }

                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                self.identities.insert(
                    identity.id.clone(),
                    IdentityRecord {
                        seq,
                        identity: identity.clone(),
                        password_hash,
                    },
                );
                slot.insert(identity.id.clone());
                Ok(identity)
            }
        }
    }

    fn get(&self, id: &str) -> Option<Identity> {
        self.identities
            .get(id)
            .map(|entry| entry.value().identity.clone())
    }

    fn find_by_email(&self, email: &str) -> Option<IdentityRecord> {
        let id = self.emails.get(email)?.value().clone();
        self.identities.get(&id).map(|entry| entry.value().clone())
    }

    fn list_by_role(&self, role: Role) -> Vec<Identity> {
        let mut records: Vec<IdentityRecord> = self
            .identities
            .iter()
            .filter(|entry| entry.value().identity.role() == role)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.seq);

        records.into_iter().map(|record| record.identity).collect()
    }

    fn count_by_role(&self, role: Role) -> usize {
        self.identities
            .iter()
            .filter(|entry| entry.value().identity.role() == role)
            .count()
    }

    fn increment_delivery_count(&self, rider_id: &str) {
        if let Some(mut entry) = self.identities.get_mut(rider_id) {
            if let Profile::Rider(profile) = &mut entry.identity.profile {
                profile.total_deliveries = profile.total_deliveries.saturating_add(1);
            }
        }
    }

    fn update_presence(
        &self,
        rider_id: &str,
        status: Option<ActiveStatus>,
        location: Option<GeoPoint>,
    ) -> Result<Identity, AppError> {
        let mut entry = self
            .identities
            .get_mut(rider_id)
            .ok_or_else(|| AppError::NotFound(format!("rider {rider_id} not found")))?;

        let Profile::Rider(profile) = &mut entry.identity.profile else {
            return Err(AppError::Validation(format!(
                "identity {rider_id} is not a rider"
            )));
        };

        if let Some(status) = status {
            profile.active_status = status;
        }
        if let Some(location) = location {
            profile.current_location = location;
        }

        Ok(entry.identity.clone())
    }

    fn records(&self) -> Vec<IdentityRecord> {
        let mut records: Vec<IdentityRecord> = self
            .identities
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.seq);
        records
    }
}

pub struct MemoryOrderStore {
    orders: DashMap<String, OrderRecord>,
    next_seq: AtomicU64,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn from_records(records: Vec<OrderRecord>) -> Self {
        let next_seq = records.iter().map(|record| record.seq + 1).max().unwrap_or(0);
        let orders = records
            .into_iter()
            .map(|record| (record.order.id.clone(), record))
            .collect();

        Self {
            orders,
            next_seq: AtomicU64::new(next_seq),
        }
    }
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore for MemoryOrderStore {
    fn insert(&self, order: Order) -> Order {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.orders.insert(
            order.id.clone(),
            OrderRecord {
                seq,
                order: order.clone(),
            },
        );
        order
    }

    fn get(&self, id: &str) -> Option<OrderRecord> {
        self.orders.get(id).map(|entry| entry.value().clone())
    }

    fn update(&self, id: &str, mutation: &mut OrderMutation<'_>) -> Result<Order, AppError> {
        let mut entry = self
            .orders
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

        let mut draft = entry.order.clone();
        mutation(&mut draft)?;
        entry.order = draft.clone();

        Ok(draft)
    }

    fn filter(&self, predicate: &dyn Fn(&Order) -> bool) -> Vec<OrderRecord> {
        let mut records: Vec<OrderRecord> = self
            .orders
            .iter()
            .filter(|entry| predicate(&entry.value().order))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.seq);
        records
    }

    fn len(&self) -> usize {
        self.orders.len()
    }

    fn records(&self) -> Vec<OrderRecord> {
        self.filter(&|_| true)
    }
}
