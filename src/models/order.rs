use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::identity::Identity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Accepted,
    PickedUp,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub rider_id: Option<String>,
    pub pickup_address: String,
    pub drop_address: String,
    pub item_description: String,
    /// Base64-encoded image attached at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_image: Option<String>,
    pub status: OrderStatus,
    pub fare: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub seq: u64,
    pub order: Order,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: String,
    pub pickup_address: String,
    pub drop_address: String,
    pub item_description: String,
    pub item_image: Option<String>,
    pub fare: f64,
}

/// Read-only projection of an order with its referenced identities embedded
/// as they are at read time.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rider: Option<Identity>,
}
