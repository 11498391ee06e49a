//! WebSocket endpoint for realtime status updates.
//!
//! Clients join rooms with small JSON frames mirroring the dashboard/public
//! page protocol: `{"action": "join-organization", "organizationId": "..."}`
//! or `{"action": "join-status-page", "slug": "acme"}`. Events pushed to a
//! room are forwarded as text frames; see `services::realtime` for the
//! catalog.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::services::realtime::Topic;
use crate::state::AppState;

/// Create realtime routes
pub fn realtime_routes(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
enum ClientMessage {
    JoinOrganization {
        #[serde(rename = "organizationId")]
        organization_id: Uuid,
    },
    LeaveOrganization {
        #[serde(rename = "organizationId")]
        organization_id: Uuid,
    },
    JoinStatusPage {
        slug: String,
    },
    LeaveStatusPage {
        slug: String,
    },
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle one WebSocket connection for its lifetime.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let conn = state.realtime.next_conn_id();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    tracing::info!("realtime client {} connected", conn);

    // Forward events published to any joined room out to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let hub = state.realtime.clone();
    let recv_hub = hub.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ClientMessage>(text.as_str()) {
                        Ok(ClientMessage::JoinOrganization { organization_id }) => {
                            recv_hub.subscribe(conn, &tx, Topic::Organization(organization_id));
                            debug!("client {} joined org-{}", conn, organization_id);
                        }
                        Ok(ClientMessage::LeaveOrganization { organization_id }) => {
                            recv_hub.unsubscribe(conn, &Topic::Organization(organization_id));
                            debug!("client {} left org-{}", conn, organization_id);
                        }
                        Ok(ClientMessage::JoinStatusPage { slug }) => {
                            debug!("client {} joined status-{}", conn, slug);
                            recv_hub.subscribe(conn, &tx, Topic::StatusPage(slug));
                        }
                        Ok(ClientMessage::LeaveStatusPage { slug }) => {
                            debug!("client {} left status-{}", conn, slug);
                            recv_hub.unsubscribe(conn, &Topic::StatusPage(slug));
                        }
                        Err(e) => {
                            debug!("client {} sent unparseable frame: {}", conn, e);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("client {} requested close", conn);
                    break;
                }
                Err(e) => {
                    debug!("client {} socket error: {}", conn, e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Either task ending means the client is gone.
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    hub.disconnect(conn);
    tracing::info!("realtime client {} disconnected", conn);
}
