use axum::{Json, extract::State, response::IntoResponse};

use crate::AppState;

/// List live sessions, oldest first
pub async fn list_sessions_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.list_sessions().await)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use tictactoe::ConnectionId;

    use crate::config::ServerConfig;
    use crate::{AppState, build_router};

    #[tokio::test]
    async fn test_lists_waiting_session() {
        let state = AppState::new(ServerConfig::default());
        let (tx, _rx) = mpsc::channel(4);
        let assignment = state
            .registry
            .register(ConnectionId::new(), tx)
            .await
            .unwrap();

        let response = build_router(state)
            .oneshot(Request::builder().uri("/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let sessions = json.as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["id"], assignment.session.id().to_string());
        assert_eq!(sessions[0]["phase"]["state"], "waiting_for_players");
        assert_eq!(sessions[0]["moves"], 0);
    }
}
