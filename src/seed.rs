use chrono::{Duration, Utc};
use tracing::info;

use crate::auth::password::hash_password;
use crate::engine::Engine;
use crate::error::AppError;
use crate::models::identity::{ActiveStatus, GeoPoint, Identity, Profile, RiderProfile};
use crate::models::order::{Order, OrderStatus};

struct SeedOrder {
    id: &'static str,
    customer_id: &'static str,
    rider_id: Option<&'static str>,
    pickup: &'static str,
    drop: &'static str,
    description: &'static str,
    status: OrderStatus,
    fare: f64,
    age_days: i64,
}

const SEED_ORDERS: [SeedOrder; 3] = [
    SeedOrder {
        id: "order1",
        customer_id: "user1",
        rider_id: Some("rider1"),
        pickup: "100 Art Museum Dr, Los Angeles",
        drop: "200 Santa Monica Pier, Santa Monica",
        description: "A valuable painting.",
        status: OrderStatus::Delivered,
        fare: 25.50,
        age_days: 2,
    },
    SeedOrder {
        id: "order2",
        customer_id: "user2",
        rider_id: Some("rider1"),
        pickup: "300 Griffith Observatory Rd, Los Angeles",
        drop: "400 Hollywood Blvd, Hollywood",
        description: "Telescope parts, handle with care.",
        status: OrderStatus::PickedUp,
        fare: 18.00,
        age_days: 1,
    },
    SeedOrder {
        id: "order3",
        customer_id: "user1",
        rider_id: None,
        pickup: "500 Grand Park, Los Angeles",
        drop: "600 Staples Center, Los Angeles",
        description: "Urgent legal documents.",
        status: OrderStatus::Pending,
        fare: 12.75,
        age_days: 0,
    },
];

fn identity(id: &str, name: &str, email: &str, phone: &str, profile: Profile) -> Identity {
    Identity {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        profile,
        created_at: Utc::now(),
    }
}

/// Loads the demo accounts and orders into empty stores. Every demo account
/// signs in with `password`. Does nothing unless both stores are empty.
pub fn seed_demo_data(engine: &Engine, password: &str) -> Result<(), AppError> {
    if !engine.orders().is_empty() || !engine.identities().records().is_empty() {
        info!("stores already populated; skipping demo seed");
        return Ok(());
    }

    let password_hash = hash_password(password)?;
    let delivered_by_rider = SEED_ORDERS
        .iter()
        .filter(|order| order.status == OrderStatus::Delivered && order.rider_id == Some("rider1"))
        .count() as u64;

    let accounts = [
        identity("user1", "Alice Johnson", "alice@example.com", "123-456-7890", Profile::Customer),
        identity("user2", "Bob Williams", "bob@example.com", "123-456-7891", Profile::Customer),
        identity(
            "rider1",
            "Charlie Brown",
            "charlie@example.com",
            "234-567-8901",
            Profile::Rider(RiderProfile {
                active_status: ActiveStatus::Online,
                current_location: GeoPoint {
                    lat: 34.05,
                    lng: -118.25,
                },
                total_deliveries: delivered_by_rider,
            }),
        ),
        identity("admin1", "Admin Eve", "admin@example.com", "345-678-9012", Profile::Admin),
    ];
    for account in accounts {
        engine
            .identities()
            .insert(account, password_hash.clone())?;
    }

    let now = Utc::now();
    for seed in &SEED_ORDERS {
        engine.orders().insert(Order {
            id: seed.id.to_string(),
            customer_id: seed.customer_id.to_string(),
            rider_id: seed.rider_id.map(str::to_string),
            pickup_address: seed.pickup.to_string(),
            drop_address: seed.drop.to_string(),
            item_description: seed.description.to_string(),
            item_image: None,
            status: seed.status,
            fare: seed.fare,
            created_at: now - Duration::days(seed.age_days),
        });
    }

    info!(
        identities = 4,
        orders = SEED_ORDERS.len(),
        "demo data seeded"
    );
    Ok(())
}
