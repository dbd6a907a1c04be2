use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// File config (figment-deserialized from defaults / config file / env vars)
// =============================================================================
//
// Three equivalent ways to configure:
//
//   config.toml:     [game]
//                    disconnect_policy = "forfeit"
//
//   env var:         TTT_GAME__DISCONNECT_POLICY=forfeit   (double underscore = nesting)
//
//   CLI:             --host / --port override [server] after everything else

/// What happens to an in-progress game when one player's connection closes.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectPolicy {
    /// The game is left as-is; the remaining player is not told and waits forever.
    #[default]
    Stall,
    /// The remaining player wins and both sides of the session are finished.
    Forfeit,
}

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub game: GameFileConfig,
    #[serde(default)]
    pub protocol: ProtocolFileConfig,
}

/// Listener knobs (lives under `[server]`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-connection queue of messages waiting to be written to the socket
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for ServerFileConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

/// Game rules that are not part of tic-tac-toe itself (lives under `[game]`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GameFileConfig {
    #[serde(default)]
    pub disconnect_policy: DisconnectPolicy,
}

/// Wire format switches (lives under `[protocol]`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolFileConfig {
    /// Include the mover's symbol in `Move` broadcasts. Turn off only for
    /// clients that expect the bare `{row, col}` echo.
    #[serde(default = "default_announce_mover")]
    pub announce_mover: bool,
}

impl Default for ProtocolFileConfig {
    fn default() -> Self {
        Self {
            announce_mover: default_announce_mover(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_outbound_buffer() -> usize {
    32
}
fn default_announce_mover() -> bool {
    true
}

/// Build a figment that layers: defaults → config file (if any) → TTT_* env vars.
///
/// Env vars use double-underscore for nesting into sections:
///   `TTT_SERVER__PORT=9000`  →  `server.port = 9000`
///   `TTT_PROTOCOL__ANNOUNCE_MOVER=false`  →  `protocol.announce_mover = false`
pub fn load_config(config_file: Option<&Path>) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    let mut figment = Figment::from(Serialized::defaults(FileConfig::default()));
    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed("TTT_").split("__"))
}

/// Values given on the command line. They win over every other source.
#[derive(Clone, Debug, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
}

// =============================================================================
// Runtime config (derived from FileConfig, used throughout the server)
// =============================================================================

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub outbound_buffer: usize,
    pub disconnect_policy: DisconnectPolicy,
    pub announce_mover: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let fc = FileConfig::default();
        Self {
            host: fc.server.host,
            port: fc.server.port,
            outbound_buffer: fc.server.outbound_buffer,
            disconnect_policy: fc.game.disconnect_policy,
            announce_mover: fc.protocol.announce_mover,
        }
    }
}

impl ServerConfig {
    pub fn from_file(fc: &FileConfig, overrides: &CliOverrides) -> Result<Self> {
        if fc.server.outbound_buffer == 0 {
            bail!("server.outbound_buffer must be at least 1");
        }
        Ok(Self {
            host: overrides
                .host
                .clone()
                .unwrap_or_else(|| fc.server.host.clone()),
            port: overrides.port.unwrap_or(fc.server.port),
            outbound_buffer: fc.server.outbound_buffer,
            disconnect_policy: fc.game.disconnect_policy,
            announce_mover: fc.protocol.announce_mover,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
