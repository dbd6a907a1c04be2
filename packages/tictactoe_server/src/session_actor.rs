use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tictactoe::{ConnectionId, GameError, JoinError, MoveOutcome, Phase, Session, Symbol};

use crate::config::{DisconnectPolicy, ServerConfig};
use crate::error::{DispatchError, RegistryError};
use crate::metrics::ServerMetrics;
use crate::ws::{ServerMessage, SessionStatus};

/// Commands that can be sent to a session actor
#[derive(Debug)]
pub enum SessionCommand {
    Join {
        connection: ConnectionId,
        outbound: mpsc::Sender<ServerMessage>,
        respond_to: oneshot::Sender<Result<Symbol, JoinError>>,
    },
    Move {
        connection: ConnectionId,
        row: i64,
        col: i64,
        respond_to: oneshot::Sender<Result<MoveOutcome, GameError>>,
    },
    Snapshot {
        respond_to: oneshot::Sender<SessionStatus>,
    },
    Leave {
        connection: ConnectionId,
        respond_to: oneshot::Sender<()>,
    },
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

/// Information about a live session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: SessionStatus,
}

/// Per-session behaviour taken from the server config
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub disconnect_policy: DisconnectPolicy,
    pub announce_mover: bool,
}

impl SessionOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            disconnect_policy: config.disconnect_policy,
            announce_mover: config.announce_mover,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// Handle to communicate with a session actor
#[derive(Clone, Debug)]
pub struct SessionHandle {
    id: Uuid,
    created_at: DateTime<Utc>,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Bind `connection` to the next free symbol. On success the actor has
    /// already queued `Connect` on `outbound`.
    pub async fn join(
        &self,
        connection: ConnectionId,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Result<Symbol, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Join {
                connection,
                outbound,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::SessionGone)?;
        Ok(rx.await.map_err(|_| RegistryError::SessionGone)??)
    }

    pub async fn apply_move(
        &self,
        connection: ConnectionId,
        row: i64,
        col: i64,
    ) -> Result<MoveOutcome, DispatchError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Move {
                connection,
                row,
                col,
                respond_to: tx,
            })
            .await
            .map_err(|_| DispatchError::SessionGone)?;
        Ok(rx.await.map_err(|_| DispatchError::SessionGone)??)
    }

    pub async fn snapshot(&self) -> Result<SessionStatus, DispatchError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Snapshot { respond_to: tx })
            .await
            .map_err(|_| DispatchError::SessionGone)?;
        rx.await.map_err(|_| DispatchError::SessionGone)
    }

    pub async fn info(&self) -> Option<SessionInfo> {
        let status = self.snapshot().await.ok()?;
        Some(SessionInfo {
            id: self.id,
            created_at: self.created_at,
            status,
        })
    }

    /// Detach `connection`. A no-op if the actor is already gone.
    pub async fn leave(&self, connection: ConnectionId) {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(SessionCommand::Leave {
                connection,
                respond_to: tx,
            })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// Tell every bound client the server is going away and stop the actor.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(SessionCommand::Shutdown { respond_to: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// The actor that owns one game. All mutations of the session go through its
/// command queue, one at a time.
struct SessionActor {
    id: Uuid,
    session: Session,
    /// Back-references used only to push messages to bound players
    outbound: HashMap<Symbol, mpsc::Sender<ServerMessage>>,
    receiver: mpsc::Receiver<SessionCommand>,
    options: SessionOptions,
    metrics: Arc<ServerMetrics>,
}

enum Flow {
    Continue,
    Stop,
}

impl SessionActor {
    /// Spawn a new session actor and return its handle
    fn spawn(options: SessionOptions, metrics: Arc<ServerMetrics>) -> SessionHandle {
        let id = Uuid::now_v7();
        let (sender, receiver) = mpsc::channel(32);

        let actor = SessionActor {
            id,
            session: Session::new(),
            outbound: HashMap::new(),
            receiver,
            options,
            metrics,
        };

        tokio::spawn(async move {
            actor.run().await;
        });

        SessionHandle {
            id,
            created_at: Utc::now(),
            sender,
        }
    }

    async fn run(mut self) {
        debug!(session_id = %self.id, "Session actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::Join {
                    connection,
                    outbound,
                    respond_to,
                } => {
                    let result = self.handle_join(connection, outbound);
                    let _ = respond_to.send(result);
                }

                SessionCommand::Move {
                    connection,
                    row,
                    col,
                    respond_to,
                } => {
                    let result = self.handle_move(connection, row, col).await;
                    let _ = respond_to.send(result);
                }

                SessionCommand::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.snapshot());
                }

                SessionCommand::Leave {
                    connection,
                    respond_to,
                } => {
                    let flow = self.handle_leave(connection);
                    let _ = respond_to.send(());
                    if let Flow::Stop = flow {
                        break;
                    }
                }

                SessionCommand::Shutdown { respond_to } => {
                    for symbol in [Symbol::X, Symbol::O] {
                        self.notify(symbol, ServerMessage::ServerShutdown);
                    }
                    let _ = respond_to.send(());
                    break;
                }
            }
        }

        debug!(session_id = %self.id, "Session actor stopped");
    }

    fn handle_join(
        &mut self,
        connection: ConnectionId,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Result<Symbol, JoinError> {
        let symbol = self.session.bind(connection)?;
        self.outbound.insert(symbol, outbound);
        info!(session_id = %self.id, conn_id = %connection, %symbol, "Player joined session");

        // The new connection's queue is empty, so Connect is always its first message
        self.notify(symbol, ServerMessage::Connect { player: symbol });
        if self.session.phase() == Phase::InProgress {
            self.notify(symbol.other(), ServerMessage::PlayerJoined { player: symbol });
            info!(session_id = %self.id, "Game started");
        }
        Ok(symbol)
    }

    async fn handle_move(
        &mut self,
        connection: ConnectionId,
        row: i64,
        col: i64,
    ) -> Result<MoveOutcome, GameError> {
        let outcome = match self.session.apply_move(connection, row, col) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.move_rejected();
                debug!(session_id = %self.id, conn_id = %connection, row, col, "Move rejected: {}", e);
                return Err(e);
            }
        };

        self.metrics.move_accepted();
        if let MoveOutcome::Finished { outcome: result, .. } = outcome {
            self.metrics.game_finished();
            info!(session_id = %self.id, ?result, moves = self.session.moves_played(), "Game over");
        }

        self.broadcast(ServerMessage::from_move(outcome, self.options.announce_mover))
            .await;
        Ok(outcome)
    }

    fn handle_leave(&mut self, connection: ConnectionId) -> Flow {
        let Some(symbol) = self.session.symbol_of(connection) else {
            return Flow::Continue;
        };
        self.outbound.remove(&symbol);

        match self.session.phase() {
            Phase::WaitingForPlayers => {
                info!(session_id = %self.id, conn_id = %connection, "Waiting player left, discarding session");
                self.metrics.session_abandoned();
                return Flow::Stop;
            }
            Phase::InProgress => match self.options.disconnect_policy {
                DisconnectPolicy::Stall => {
                    info!(session_id = %self.id, %symbol, "Player left, game stalled");
                }
                DisconnectPolicy::Forfeit => {
                    if let Some(result) = self.session.forfeit(connection) {
                        self.metrics.game_finished();
                        info!(session_id = %self.id, %symbol, ?result, "Player left, game forfeited");
                        self.notify(
                            symbol.other(),
                            ServerMessage::GameOver {
                                winner: result.winner(),
                                final_move: None,
                            },
                        );
                    }
                }
            },
            Phase::Finished(_) => {}
        }

        if self.outbound.is_empty() {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    fn snapshot(&self) -> SessionStatus {
        SessionStatus {
            board: self.session.board().rows(),
            turn: self.session.turn(),
            phase: self.session.phase(),
            moves: self.session.moves_played(),
        }
    }

    /// Deliver to both players in order, waiting for queue space. A slow reader
    /// only holds up this session.
    async fn broadcast(&self, msg: ServerMessage) {
        for symbol in [Symbol::X, Symbol::O] {
            if let Some(tx) = self.outbound.get(&symbol) {
                if tx.send(msg.clone()).await.is_err() {
                    self.metrics.message_dropped();
                    debug!(session_id = %self.id, %symbol, "Broadcast target already closed");
                }
            }
        }
    }

    /// Best-effort single message that never waits for queue space.
    fn notify(&self, symbol: Symbol, msg: ServerMessage) {
        if let Some(tx) = self.outbound.get(&symbol) {
            if let Err(e) = tx.try_send(msg) {
                self.metrics.message_dropped();
                warn!(session_id = %self.id, %symbol, "Dropped notification: {}", e);
            }
        }
    }
}

/// Create a new session and return its handle
pub fn create_session(options: SessionOptions, metrics: Arc<ServerMetrics>) -> SessionHandle {
    metrics.session_created();
    SessionActor::spawn(options, metrics)
}
