//! Connection Registry
//!
//! Pairs incoming connections into sessions. The registry is an owned value
//! created at startup and shared through `AppState`; it only ever touches a
//! session through its [`SessionHandle`].

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tictactoe::{ConnectionId, Symbol};

use crate::error::RegistryError;
use crate::metrics::ServerMetrics;
use crate::session_actor::{SessionHandle, SessionInfo, SessionOptions, create_session};
use crate::ws::ServerMessage;

/// How long shutdown waits for each session to acknowledge.
const SHUTDOWN_ACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Where a newly registered connection ended up.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub session: SessionHandle,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCounts {
    /// Sessions with at least one bound connection
    pub live: usize,
    /// Sessions holding a single player waiting for an opponent (0 or 1)
    pub waiting: usize,
}

#[derive(Default)]
struct RegistryInner {
    /// The most recent session still in WaitingForPlayers
    open: Option<SessionHandle>,
    connections: HashMap<ConnectionId, SessionHandle>,
    shutting_down: bool,
}

impl RegistryInner {
    fn distinct_sessions(&self) -> Vec<SessionHandle> {
        let mut seen = HashMap::<Uuid, SessionHandle>::new();
        for handle in self.connections.values() {
            seen.entry(handle.id()).or_insert_with(|| handle.clone());
        }
        seen.into_values().collect()
    }
}

pub struct GameRegistry {
    inner: Mutex<RegistryInner>,
    options: SessionOptions,
    metrics: Arc<ServerMetrics>,
}

impl GameRegistry {
    pub fn new(options: SessionOptions, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            options,
            metrics,
        }
    }

    /// Bind `connection` to a session: the open one if any, otherwise a new
    /// session where it becomes X. Registrations are serialized so a
    /// session's second slot is handed out at most once.
    pub async fn register(
        &self,
        connection: ConnectionId,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Result<Assignment, RegistryError> {
        let mut inner = self.inner.lock().await;
        if inner.shutting_down {
            return Err(RegistryError::ShuttingDown);
        }

        if let Some(open) = inner.open.take() {
            match open.join(connection, outbound.clone()).await {
                Ok(symbol) => {
                    info!(conn_id = %connection, session_id = %open.id(), %symbol, "Paired with waiting player");
                    inner.connections.insert(connection, open.clone());
                    return Ok(Assignment {
                        session: open,
                        symbol,
                    });
                }
                Err(e) => {
                    debug!(session_id = %open.id(), "Open session unavailable: {}", e);
                }
            }
        }

        let session = create_session(self.options, self.metrics.clone());
        let symbol = session.join(connection, outbound).await?;
        info!(conn_id = %connection, session_id = %session.id(), %symbol, "Created new session");

        inner.connections.insert(connection, session.clone());
        inner.open = Some(session.clone());
        Ok(Assignment { session, symbol })
    }

    /// Detach `connection` from its session. Unknown connections are ignored.
    pub async fn unregister(&self, connection: ConnectionId) {
        let session = {
            let mut inner = self.inner.lock().await;
            let Some(session) = inner.connections.remove(&connection) else {
                return;
            };
            if inner
                .open
                .as_ref()
                .is_some_and(|open| open.id() == session.id())
            {
                inner.open = None;
            }
            session
        };

        // Outside the lock: the actor may be waiting on a slow peer
        session.leave(connection).await;
        debug!(conn_id = %connection, session_id = %session.id(), "Connection unregistered");
    }

    /// Live sessions, oldest first.
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        let sessions = self.inner.lock().await.distinct_sessions();

        let mut infos: Vec<SessionInfo> = join_all(sessions.iter().map(|s| s.info()))
            .await
            .into_iter()
            .flatten()
            .collect();
        infos.sort_by_key(|info| (info.created_at, info.id));
        infos
    }

    pub async fn counts(&self) -> RegistryCounts {
        let inner = self.inner.lock().await;
        RegistryCounts {
            live: inner.distinct_sessions().len(),
            waiting: usize::from(inner.open.is_some()),
        }
    }

    pub async fn is_shutting_down(&self) -> bool {
        self.inner.lock().await.shutting_down
    }

    /// Refuse further registrations and tell every live session to stop.
    pub async fn shutdown(&self) {
        let sessions = {
            let mut inner = self.inner.lock().await;
            inner.shutting_down = true;
            inner.open = None;
            let sessions = inner.distinct_sessions();
            inner.connections.clear();
            sessions
        };

        info!(sessions = sessions.len(), "Shutting down live sessions");
        join_all(sessions.iter().map(|session| async move {
            if tokio::time::timeout(SHUTDOWN_ACK_TIMEOUT, session.shutdown())
                .await
                .is_err()
            {
                warn!(session_id = %session.id(), "Session did not acknowledge shutdown");
            }
        }))
        .await;
    }
}
