use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Rider,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Rider => "rider",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const ORIGIN: GeoPoint = GeoPoint { lat: 0.0, lng: 0.0 };
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    Online,
    Offline,
}

/// Rider-only state. Location is advisory and never used for matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiderProfile {
    pub active_status: ActiveStatus,
    pub current_location: GeoPoint,
    pub total_deliveries: u64,
}

impl Default for RiderProfile {
    fn default() -> Self {
        Self {
            active_status: ActiveStatus::Offline,
            current_location: GeoPoint::ORIGIN,
            total_deliveries: 0,
        }
    }
}

/// Role-specific part of an identity, serialized inline with a `role` tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Customer,
    Rider(RiderProfile),
    Admin,
}

impl Profile {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Customer => Profile::Customer,
            Role::Rider => Profile::Rider(RiderProfile::default()),
            Role::Admin => Profile::Admin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(flatten)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn role(&self) -> Role {
        match self.profile {
            Profile::Customer => Role::Customer,
            Profile::Rider(_) => Role::Rider,
            Profile::Admin => Role::Admin,
        }
    }

    pub fn rider_profile(&self) -> Option<&RiderProfile> {
        match &self.profile {
            Profile::Rider(profile) => Some(profile),
            Profile::Customer | Profile::Admin => None,
        }
    }
}

/// Registration input before an id and timestamp are assigned.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub password: String,
}

/// What the identity store persists: the public identity plus its credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub seq: u64,
    pub identity: Identity,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::{Identity, Profile, RiderProfile, Role};

    fn rider() -> Identity {
        Identity {
            id: "rider1".to_string(),
            name: "Charlie Brown".to_string(),
            email: "charlie@example.com".to_string(),
            phone: "234-567-8901".to_string(),
            profile: Profile::Rider(RiderProfile::default()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rider_serializes_flat_with_role_tag() {
        let value = serde_json::to_value(rider()).unwrap();

        assert_eq!(value["role"], "rider");
        assert_eq!(value["active_status"], "offline");
        assert_eq!(value["current_location"], json!({ "lat": 0.0, "lng": 0.0 }));
        assert_eq!(value["total_deliveries"], 0);
    }

    #[test]
    fn customer_has_no_rider_fields() {
        let mut identity = rider();
        identity.profile = Profile::Customer;
        let value = serde_json::to_value(&identity).unwrap();

        assert_eq!(value["role"], "customer");
        assert!(value.get("total_deliveries").is_none());
        assert_eq!(identity.role(), Role::Customer);
        assert!(identity.rider_profile().is_none());
    }

    #[test]
    fn identity_deserializes_back_into_profile() {
        let original = rider();
        let text = serde_json::to_string(&original).unwrap();
        let parsed: Identity = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, original);
        assert_eq!(parsed.role(), Role::Rider);
    }
}
