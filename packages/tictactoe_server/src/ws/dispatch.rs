//! Per-connection message dispatcher.
//!
//! Turns one inbound frame into at most one call on the session actor. Any
//! failure becomes an `Error` message on the originating connection only;
//! nothing here ends the connection's loop.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use tictactoe::{ConnectionId, Symbol};

use crate::error::DispatchError;
use crate::metrics::ServerMetrics;
use crate::session_actor::SessionHandle;

use super::protocol::{ClientMessage, ProtocolError, ServerMessage, decode_client};

/// Per-connection context shared between the socket handler and the dispatcher.
pub(crate) struct ConnectionContext {
    pub connection_id: ConnectionId,
    pub symbol: Symbol,
    pub session: SessionHandle,
    /// This connection's own outbound queue
    pub tx: mpsc::Sender<ServerMessage>,
    pub metrics: Arc<ServerMetrics>,
}

/// Decode and dispatch one text frame.
pub(crate) async fn dispatch_text(ctx: &ConnectionContext, text: &str) {
    let result = match decode_client(text) {
        Ok(msg) => dispatch_client_message(ctx, msg).await,
        Err(e) => {
            ctx.metrics.malformed_message();
            Err(e.into())
        }
    };

    if let Err(e) = result {
        send_error(ctx, &e).await;
    }
}

/// Binary frames never carry a valid message.
pub(crate) async fn dispatch_binary(ctx: &ConnectionContext) {
    ctx.metrics.malformed_message();
    let err = ProtocolError::Malformed("binary frames are not supported".to_string());
    send_error(ctx, &err.into()).await;
}

pub(crate) async fn dispatch_client_message(
    ctx: &ConnectionContext,
    msg: ClientMessage,
) -> Result<(), DispatchError> {
    match msg {
        ClientMessage::Move { row, col } => {
            // The broadcast is sent by the session itself
            ctx.session.apply_move(ctx.connection_id, row, col).await?;
            Ok(())
        }
        ClientMessage::Status => {
            let status = ctx.session.snapshot().await?;
            if ctx.tx.send(ServerMessage::Status(status)).await.is_err() {
                ctx.metrics.message_dropped();
            }
            Ok(())
        }
    }
}

async fn send_error(ctx: &ConnectionContext, err: &DispatchError) {
    debug!(
        conn_id = %ctx.connection_id,
        symbol = %ctx.symbol,
        code = err.error_code(),
        "Request failed: {}",
        err
    );
    if ctx.tx.send(ServerMessage::error(err)).await.is_err() {
        ctx.metrics.message_dropped();
    }
}
