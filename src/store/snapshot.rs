use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::models::identity::{IdentityRecord, Profile};
use crate::models::order::{OrderRecord, OrderStatus};
use crate::state::AppState;
use crate::store::{IdentityStore, OrderStore};

/// Full durable image of both stores.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub identities: Vec<IdentityRecord>,
    pub orders: Vec<OrderRecord>,
}

impl Snapshot {
    pub fn capture(identities: &dyn IdentityStore, orders: &dyn OrderStore) -> Self {
        Self {
            identities: identities.records(),
            orders: orders.records(),
        }
    }

    /// Rebuilds each rider's delivery counter from its Delivered orders.
    /// `capture` reads the stores one after the other, so a delivery that
    /// commits in between leaves the counter behind the orders.
    pub fn reconcile_delivery_counts(&mut self) {
        let mut delivered: HashMap<&str, u64> = HashMap::new();
        for record in &self.orders {
            if record.order.status != OrderStatus::Delivered {
                continue;
            }
            if let Some(rider_id) = record.order.rider_id.as_deref() {
                *delivered.entry(rider_id).or_default() += 1;
            }
        }

        for record in &mut self.identities {
            let Profile::Rider(profile) = &mut record.identity.profile else {
                continue;
            };
            let derived = delivered
                .get(record.identity.id.as_str())
                .copied()
                .unwrap_or(0);
            if profile.total_deliveries != derived {
                warn!(
                    rider_id = %record.identity.id,
                    stored = profile.total_deliveries,
                    derived,
                    "delivery counter out of step with orders; using derived count"
                );
                profile.total_deliveries = derived;
            }
        }
    }

    pub async fn load(path: &Path) -> Result<Option<Self>, AppError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(AppError::Internal(format!(
                    "failed to read snapshot {}: {err}",
                    path.display()
                )));
            }
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            AppError::Internal(format!("corrupt snapshot {}: {err}", path.display()))
        })
    }

    /// Writes to a sibling temp file and renames it over `path`.
    pub async fn write(&self, path: &Path) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(self)
            .map_err(|err| AppError::Internal(format!("failed to encode snapshot: {err}")))?;

        let tmp = temp_path(path);
        tokio::fs::write(&tmp, bytes).await.map_err(|err| {
            AppError::Internal(format!("failed to write {}: {err}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, path).await.map_err(|err| {
            AppError::Internal(format!("failed to replace {}: {err}", path.display()))
        })?;

        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Marks the stores dirty. Notifications coalesce while a write is pending.
pub fn request_snapshot(tx: &mpsc::Sender<()>) {
    if let Err(mpsc::error::TrySendError::Closed(())) = tx.try_send(()) {
        debug!("snapshot writer not running; skipping persistence");
    }
}

pub async fn run_snapshot_writer(state: Arc<AppState>, path: PathBuf, mut rx: mpsc::Receiver<()>) {
    info!(path = %path.display(), "snapshot writer started");

    while rx.recv().await.is_some() {
        let snapshot = state.engine.snapshot();
        match snapshot.write(&path).await {
            Ok(()) => debug!(
                identities = snapshot.identities.len(),
                orders = snapshot.orders.len(),
                "snapshot written"
            ),
            Err(err) => error!(error = %err, "failed to persist snapshot"),
        }
    }

    warn!("snapshot writer stopped: channel closed");
}
