use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::assistant::Assistant;
use crate::auth::session::SessionStore;
use crate::engine::Engine;
use crate::models::order::OrderView;
use crate::observability::metrics::Metrics;
use crate::pricing::FareQuoter;
use crate::store::snapshot::request_snapshot;

pub struct AppState {
    pub engine: Engine,
    pub sessions: SessionStore,
    pub fares: Arc<dyn FareQuoter>,
    pub assistant: Arc<dyn Assistant>,
    pub order_events_tx: broadcast::Sender<OrderView>,
    pub snapshot_tx: mpsc::Sender<()>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        engine: Engine,
        fares: Arc<dyn FareQuoter>,
        assistant: Arc<dyn Assistant>,
        event_buffer_size: usize,
    ) -> (Self, mpsc::Receiver<()>) {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(1);
        let (order_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        (
            Self {
                engine,
                sessions: SessionStore::new(),
                fares,
                assistant,
                order_events_tx,
                snapshot_tx,
                metrics: Metrics::new(),
            },
            snapshot_rx,
        )
    }

    /// Pushes a changed order to live subscribers and schedules persistence.
    pub fn publish_order(&self, view: &OrderView) {
        let _ = self.order_events_tx.send(view.clone());
        self.mark_dirty();
    }

    pub fn mark_dirty(&self) {
        request_snapshot(&self.snapshot_tx);
    }
}
