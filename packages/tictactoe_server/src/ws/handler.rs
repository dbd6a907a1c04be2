//! WebSocket Handler
//!
//! Registers the connection, then runs a writer that drains the outbound
//! queue and a reader that dispatches one frame at a time until either side
//! stops.

use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use tictactoe::ConnectionId;

use crate::AppState;

use super::dispatch::{ConnectionContext, dispatch_binary, dispatch_text};
use super::protocol::{ServerMessage, encode_server};

/// Handle one player's WebSocket connection
pub async fn handle_game_ws(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new();
    state.metrics.connection_opened();

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel for sending messages to the WebSocket
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(state.config.outbound_buffer);

    let assignment = match state.registry.register(connection_id, tx.clone()).await {
        Ok(assignment) => assignment,
        Err(e) => {
            warn!(conn_id = %connection_id, "Registration refused: {}", e);
            if let Ok(json) = encode_server(&ServerMessage::error(&e)) {
                let _ = ws_sender.send(Message::Text(json.into())).await;
            }
            let _ = ws_sender.send(Message::Close(None)).await;
            state.metrics.connection_closed();
            return;
        }
    };

    info!(
        conn_id = %connection_id,
        session_id = %assignment.session.id(),
        symbol = %assignment.symbol,
        "Player connected"
    );

    let ctx = ConnectionContext {
        connection_id,
        symbol: assignment.symbol,
        session: assignment.session,
        tx,
        metrics: state.metrics.clone(),
    };

    // Task to send messages to WebSocket
    let sender_task = async move {
        while let Some(msg) = rx.recv().await {
            let json = match encode_server(&msg) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            if msg == ServerMessage::ServerShutdown {
                let _ = ws_sender.send(Message::Close(None)).await;
                break;
            }
        }
    };

    // Task to handle incoming messages, strictly one at a time
    let input_task = async {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => dispatch_text(&ctx, text.as_str()).await,
                Ok(Message::Binary(_)) => dispatch_binary(&ctx).await,
                Ok(Message::Close(_)) => {
                    debug!(conn_id = %connection_id, "Client closed connection");
                    break;
                }
                Err(e) => {
                    debug!(conn_id = %connection_id, "WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = sender_task => debug!(conn_id = %connection_id, "Sender task ended"),
        _ = input_task => debug!(conn_id = %connection_id, "Input task ended"),
    }

    state.registry.unregister(connection_id).await;
    state.metrics.connection_closed();
    info!(conn_id = %connection_id, symbol = %ctx.symbol, "Player disconnected");
}
