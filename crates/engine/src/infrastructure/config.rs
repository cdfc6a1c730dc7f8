//! Process configuration read from the environment.
//!
//! Every knob has a default so the engine starts with no environment at all.

use std::net::SocketAddr;
use std::time::Duration;

use connect4_domain::DEFAULT_SEARCH_DEPTH;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("invalid listen address {0:?}")]
    Address(String),
}

/// Timings and bot settings used by the session hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// How long a friend-mode joiner waits before a bot is seated opposite them
    pub matchmaking_timeout: Duration,
    /// How long a disconnected player's seat stays human before the bot takes over
    pub bot_takeover_delay: Duration,
    /// How long a disconnected player may reconnect before the session is torn down
    pub reconnect_grace: Duration,
    /// Pause before each bot move
    pub bot_move_delay: Duration,
    pub bot_search_depth: u8,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            matchmaking_timeout: Duration::from_secs(10),
            bot_takeover_delay: Duration::from_secs(10),
            reconnect_grace: Duration::from_secs(30),
            bot_move_delay: Duration::from_millis(500),
            bot_search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }
}

/// Origins allowed to call the HTTP endpoints from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    /// SQLite file for results; `None` keeps everything in memory
    pub database_path: Option<String>,
    /// `None` means no CORS layer
    pub cors: Option<CorsOrigins>,
    pub hub: HubConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = HubConfig::default();

        let server_port = match get("SERVER_PORT").or_else(|| get("PORT")) {
            Some(raw) => parse_number("SERVER_PORT", raw)?,
            None => 8080,
        };

        let hub = HubConfig {
            matchmaking_timeout: secs_or(
                get("MATCHMAKING_TIMEOUT_SECS"),
                "MATCHMAKING_TIMEOUT_SECS",
                defaults.matchmaking_timeout,
            )?,
            bot_takeover_delay: secs_or(
                get("BOT_TAKEOVER_SECS"),
                "BOT_TAKEOVER_SECS",
                defaults.bot_takeover_delay,
            )?,
            reconnect_grace: secs_or(
                get("RECONNECT_GRACE_SECS"),
                "RECONNECT_GRACE_SECS",
                defaults.reconnect_grace,
            )?,
            bot_move_delay: match get("BOT_MOVE_DELAY_MS") {
                Some(raw) => Duration::from_millis(parse_number("BOT_MOVE_DELAY_MS", raw)?),
                None => defaults.bot_move_delay,
            },
            bot_search_depth: match get("BOT_SEARCH_DEPTH") {
                Some(raw) => {
                    let depth: u8 = parse_number("BOT_SEARCH_DEPTH", raw.clone())?;
                    if depth == 0 {
                        return Err(ConfigError::Invalid {
                            key: "BOT_SEARCH_DEPTH",
                            expected: "a positive integer",
                            value: raw,
                        });
                    }
                    depth
                }
                None => defaults.bot_search_depth,
            },
        };

        Ok(Self {
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port,
            database_path: get("DATABASE_PATH"),
            cors: get("CORS_ALLOWED_ORIGINS").and_then(parse_cors),
            hub,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.server_host, self.server_port);
        raw.parse().map_err(|_| ConfigError::Address(raw))
    }
}

fn parse_cors(raw: String) -> Option<CorsOrigins> {
    if raw == "*" {
        return Some(CorsOrigins::Any);
    }
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!origins.is_empty()).then_some(CorsOrigins::List(origins))
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        expected: "a non-negative integer",
        value: raw,
    })
}

fn secs_or(
    raw: Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match raw {
        Some(raw) => Ok(Duration::from_secs(parse_number(key, raw)?)),
        None => Ok(default),
    }
}
