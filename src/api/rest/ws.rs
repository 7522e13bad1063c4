use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::rest::extract::AuthSession;
use crate::api::rest::orders::can_view;
use crate::error::AppError;
use crate::models::identity::Identity;
use crate::state::AppState;

/// Browsers cannot set headers on a WebSocket handshake, so the session
/// token travels in the query string.
#[derive(Deserialize)]
pub struct WsParams {
    pub token: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<WsParams>,
) -> Result<impl IntoResponse, AppError> {
    let session = AuthSession::resolve(&state, &params.token)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, session.identity)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Identity) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.order_events_tx.subscribe();
    let identity_id = identity.id.clone();

    info!(identity_id = %identity_id, "websocket client connected");

    let send_task = tokio::spawn(async move {
        loop {
            let view = match rx.recv().await {
                Ok(view) => view,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket subscriber lagged; clients should re-query");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if !can_view(&identity, &view.order) {
                continue;
            }

            let json = match serde_json::to_string(&view) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize order for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    run_until_either_exits(send_task, recv_task).await;

    info!(identity_id = %identity_id, "websocket client disconnected");
}

/// Waits for the first task to finish, then aborts the other and waits for
/// it to unwind so its subscription and socket half are released.
async fn run_until_either_exits(mut send_task: JoinHandle<()>, mut recv_task: JoinHandle<()>) {
    let survivor = tokio::select! {
        _ = &mut send_task => recv_task,
        _ = &mut recv_task => send_task,
    };
    survivor.abort();
    let _ = survivor.await;
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast;

    use super::run_until_either_exits;

    #[tokio::test]
    async fn idle_sender_is_dropped_once_the_client_leaves() {
        let (tx, _) = broadcast::channel::<u32>(4);
        let mut rx = tx.subscribe();

        // Never wakes: nothing is ever published.
        let send_task = tokio::spawn(async move {
            while rx.recv().await.is_ok() {}
        });
        let recv_task = tokio::spawn(async {});

        run_until_either_exits(send_task, recv_task).await;

        assert_eq!(tx.receiver_count(), 0);
    }
}
