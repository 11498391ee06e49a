use sea_orm::DatabaseConnection;

use crate::services::locks::KeyedLocks;
use crate::services::realtime::RealtimeHub;

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    /// Topic registry for realtime fan-out, owned here and injected into
    /// handlers; lifecycle is tied to the server process.
    pub realtime: RealtimeHub,
    /// Per-service write locks: serializes status mutations so the audit
    /// log's old->new chain stays unbroken.
    pub service_locks: KeyedLocks,
    /// Per-incident write locks: the replace-all association rewrite in
    /// incident updates is not safe under concurrent calls.
    pub incident_locks: KeyedLocks,
}

impl AppState {
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            realtime: RealtimeHub::new(),
            service_locks: KeyedLocks::new(),
            incident_locks: KeyedLocks::new(),
        }
    }
}
