pub mod health;
pub mod sessions;
pub mod websocket;

// Re-export all handlers for easy route registration
pub use health::{health_handler, health_live_handler, metrics_handler};
pub use sessions::list_sessions_handler;
pub use websocket::game_websocket_handler;
