use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password, verify_unknown_account};
use crate::engine::Engine;
use crate::error::AppError;
use crate::models::identity::{ActiveStatus, GeoPoint, Identity, NewIdentity, Profile, Role};

const MIN_PASSWORD_LEN: usize = 6;

fn validate_candidate(candidate: &NewIdentity) -> Result<(), AppError> {
    if candidate.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if candidate.email.trim().is_empty() || !candidate.email.contains('@') {
        return Err(AppError::Validation("email is not valid".to_string()));
    }
    if candidate.phone.trim().is_empty() {
        return Err(AppError::Validation("phone cannot be empty".to_string()));
    }
    if candidate.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

impl Engine {
    /// Creates an identity with a fresh id and a hashed credential. Riders
    /// start offline at the origin with no deliveries.
    pub fn register(&self, candidate: NewIdentity) -> Result<Identity, AppError> {
        validate_candidate(&candidate)?;

        // Cheap pre-check so duplicates skip hashing; the insert re-checks.
        if self.identities.find_by_email(&candidate.email).is_some() {
            return Err(AppError::DuplicateEmail(candidate.email));
        }

        let password_hash = hash_password(&candidate.password)?;
        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            name: candidate.name.trim().to_string(),
            email: candidate.email,
            phone: candidate.phone.trim().to_string(),
            profile: Profile::for_role(candidate.role),
            created_at: Utc::now(),
        };

        let identity = self.identities.insert(identity, password_hash)?;
        info!(
            identity_id = %identity.id,
            role = identity.role().as_str(),
            "identity registered"
        );

        Ok(identity)
    }

    /// Resolves an email across every role and checks the password. Unknown
    /// email and wrong password fail identically.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let Some(record) = self.identities.find_by_email(email) else {
            verify_unknown_account(password);
            warn!("login rejected");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &record.password_hash) {
            warn!(identity_id = %record.identity.id, "login rejected");
            return Err(AppError::InvalidCredentials);
        }

        Ok(record.identity)
    }

    pub fn identity(&self, id: &str) -> Result<Identity, AppError> {
        self.identities
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("identity {id} not found")))
    }

    pub fn list_by_role(&self, role: Role) -> Vec<Identity> {
        self.identities.list_by_role(role)
    }

    pub fn update_rider_presence(
        &self,
        rider_id: &str,
        status: Option<ActiveStatus>,
        location: Option<GeoPoint>,
    ) -> Result<Identity, AppError> {
        if let Some(point) = location {
            let valid = (-90.0..=90.0).contains(&point.lat) && (-180.0..=180.0).contains(&point.lng);
            if !valid {
                return Err(AppError::Validation(format!(
                    "location out of range: ({}, {})",
                    point.lat, point.lng
                )));
            }
        }

        self.identities.update_presence(rider_id, status, location)
    }
}
