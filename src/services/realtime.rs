//! Realtime fan-out over topic-scoped subscriber groups.
//!
//! Two topic kinds exist: per-organization rooms for dashboard clients and
//! per-slug rooms for anonymous status-page viewers. Delivery is best-effort;
//! a reconnecting client re-fetches state through the read API, the socket
//! channel is never the source of truth.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Identifies one WebSocket connection for the lifetime of the process.
pub type ConnId = u64;

/// A named broadcast room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Dashboard room, keyed by organization id.
    Organization(Uuid),
    /// Public status-page room, keyed by organization slug.
    StatusPage(String),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Organization(id) => write!(f, "org-{}", id),
            Topic::StatusPage(slug) => write!(f, "status-{}", slug),
        }
    }
}

/// Event names pushed by the core.
pub const SERVICE_UPDATED: &str = "service-updated";
pub const INCIDENT_CREATED: &str = "incident-created";
pub const INCIDENT_UPDATED: &str = "incident-updated";
pub const STATUS_CHANGED: &str = "status-changed";

/// Wire envelope for a server-to-client push.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEvent {
    pub event: String,
    pub data: serde_json::Value,
}

impl OutboundEvent {
    pub fn new(event: &str, data: serde_json::Value) -> Self {
        Self {
            event: event.to_string(),
            data,
        }
    }

    pub fn service_updated(service_id: Uuid, name: &str, status: &str) -> Self {
        Self::new(
            SERVICE_UPDATED,
            serde_json::json!({
                "serviceId": service_id,
                "name": name,
                "status": status,
            }),
        )
    }

    pub fn incident_created(incident_id: Uuid, title: &str, organization_id: Uuid) -> Self {
        Self::new(
            INCIDENT_CREATED,
            serde_json::json!({
                "incidentId": incident_id,
                "title": title,
                "organizationId": organization_id,
            }),
        )
    }

    /// `newly_resolved` lets subscribers render a terminal update differently
    /// from an in-progress one.
    pub fn incident_updated(
        incident_id: Uuid,
        title: &str,
        status: &str,
        newly_resolved: bool,
    ) -> Self {
        Self::new(
            INCIDENT_UPDATED,
            serde_json::json!({
                "incidentId": incident_id,
                "title": title,
                "status": status,
                "newlyResolved": newly_resolved,
            }),
        )
    }

    pub fn status_changed(organization_id: Uuid, overall_status: &str) -> Self {
        Self::new(
            STATUS_CHANGED,
            serde_json::json!({
                "organizationId": organization_id,
                "overallStatus": overall_status,
            }),
        )
    }
}

/// Process-wide topic registry. Cloning shares the registry; it is owned by
/// `AppState` and injected into handlers rather than accessed as a global.
#[derive(Clone, Default)]
pub struct RealtimeHub {
    topics: Arc<RwLock<HashMap<Topic, HashMap<ConnId, UnboundedSender<String>>>>>,
    next_conn_id: Arc<AtomicU64>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a connection id for a newly accepted socket.
    pub fn next_conn_id(&self) -> ConnId {
        self.next_conn_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Join `topic`. Subscribing twice is a no-op; the newest sender wins.
    pub fn subscribe(&self, conn: ConnId, sender: &UnboundedSender<String>, topic: Topic) {
        let mut topics = self.topics.write();
        topics.entry(topic).or_default().insert(conn, sender.clone());
    }

    /// Leave `topic`. Leaving a topic the connection never joined is a no-op.
    pub fn unsubscribe(&self, conn: ConnId, topic: &Topic) {
        let mut topics = self.topics.write();
        if let Some(members) = topics.get_mut(topic) {
            members.remove(&conn);
            if members.is_empty() {
                topics.remove(topic);
            }
        }
    }

    /// Remove the connection from every topic it joined.
    pub fn disconnect(&self, conn: ConnId) {
        let mut topics = self.topics.write();
        topics.retain(|_, members| {
            members.remove(&conn);
            !members.is_empty()
        });
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics.read().get(topic).map_or(0, |m| m.len())
    }

    /// Deliver `event` to every current subscriber of `topic`. Connections
    /// that dropped mid-publish are skipped and pruned; delivery order within
    /// one topic matches publish call order. Returns the delivered count.
    pub fn publish(&self, topic: &Topic, event: &OutboundEvent) -> usize {
        let message = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("failed to serialize realtime event {}: {}", event.event, e);
                return 0;
            }
        };

        let mut dead: Vec<ConnId> = Vec::new();
        let mut delivered = 0;

        {
            let topics = self.topics.read();
            let Some(members) = topics.get(topic) else {
                return 0;
            };
            for (conn, sender) in members {
                if sender.send(message.clone()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(*conn);
                }
            }
        }

        if !dead.is_empty() {
            tracing::debug!(
                "pruning {} dead subscriber(s) from topic {}",
                dead.len(),
                topic
            );
            let mut topics = self.topics.write();
            if let Some(members) = topics.get_mut(topic) {
                for conn in dead {
                    members.remove(&conn);
                }
                if members.is_empty() {
                    topics.remove(topic);
                }
            }
        }

        delivered
    }
}
