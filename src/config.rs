//! Configuration management with validation and defaults
//!
//! Centralized configuration for the wagering engine: serving, ledger
//! access, game economics, and session housekeeping.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LuckboxConfig {
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    pub games: GamesConfig,
    pub sessions: SessionsConfig,
}

/// HTTP serving configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10_000,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// External user-record store access.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Base URL of the user collection, e.g. https://host/users
    pub base_url: String,
    /// Optional access key appended to every request, kept server-side.
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    /// Balance granted to a newly created player.
    pub initial_balance: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/users".to_string(),
            api_key: None,
            request_timeout_secs: 10,
            initial_balance: 1_000,
        }
    }
}

/// Per-game economics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    pub slots: SlotsConfig,
    pub roulette: RouletteConfig,
    pub blackjack: BlackjackConfig,
    pub mines: MinesConfig,
}

/// Slots economics. The small-win probability is derived from these at
/// spin time, never configured directly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotsConfig {
    pub cost: u64,
    /// Target return to player, expected payout / cost.
    pub rtp: f64,
    pub big_probability: f64,
    pub big_payout: u64,
    pub small_payout: u64,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            cost: 100,
            rtp: 0.95,
            big_probability: 0.06,
            big_payout: 800,
            small_payout: 200,
        }
    }
}

/// Roulette economics.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RouletteConfig {
    pub cost: u64,
    /// Payout for a matched red or black pick.
    pub color_payout: u64,
    /// Payout for a matched green pick (the single zero).
    pub green_payout: u64,
}

impl Default for RouletteConfig {
    fn default() -> Self {
        Self {
            cost: 150,
            color_payout: 300,
            green_payout: 1_500,
        }
    }
}

/// Blackjack economics.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackjackConfig {
    /// Fixed stake deducted when a round starts.
    pub bet: u64,
}

impl Default for BlackjackConfig {
    fn default() -> Self {
        Self { bet: 200 }
    }
}

/// Mines economics.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MinesConfig {
    pub min_mines: u8,
    pub max_mines: u8,
    /// Multiplicative margin applied to the fair odds of every reveal.
    pub house_margin: f64,
    /// Smallest per-step multiplier a safe reveal can pay.
    pub floor_multiplier: f64,
}

impl Default for MinesConfig {
    fn default() -> Self {
        Self {
            min_mines: 1,
            max_mines: 24,
            house_margin: 0.95,
            floor_multiplier: 1.02,
        }
    }
}

/// Session table housekeeping and the per-player burst guard.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Idle time after which a session may be evicted.
    pub idle_timeout_secs: u64,
    /// How often the eviction sweep runs.
    pub sweep_interval_secs: u64,
    /// Burst guard window length.
    pub rate_window_millis: u64,
    /// Actions allowed inside one window; the next one is rejected.
    pub rate_max_actions: u32,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3_600,
            sweep_interval_secs: 60,
            rate_window_millis: 2_000,
            rate_max_actions: 15,
        }
    }
}

impl LuckboxConfig {
    /// Load configuration from a TOML file. Missing sections fall back to
    /// defaults.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path, e)))?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }

    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "ledger.base_url must not be empty".to_string(),
            ));
        }

        let slots = &self.games.slots;
        if slots.cost == 0 {
            return Err(ConfigError::InvalidValue(
                "slots.cost must be > 0".to_string(),
            ));
        }
        if !(slots.rtp > 0.0 && slots.rtp <= 1.0) {
            return Err(ConfigError::InvalidValue(
                "slots.rtp must be in (0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&slots.big_probability) {
            return Err(ConfigError::InvalidValue(
                "slots.big_probability must be in [0, 1]".to_string(),
            ));
        }
        if slots.small_payout == 0 {
            return Err(ConfigError::InvalidValue(
                "slots.small_payout must be > 0".to_string(),
            ));
        }

        if self.games.roulette.cost == 0 {
            return Err(ConfigError::InvalidValue(
                "roulette.cost must be > 0".to_string(),
            ));
        }

        if self.games.blackjack.bet == 0 {
            return Err(ConfigError::InvalidValue(
                "blackjack.bet must be > 0".to_string(),
            ));
        }

        let mines = &self.games.mines;
        if mines.min_mines == 0 || mines.max_mines > 24 || mines.min_mines > mines.max_mines {
            return Err(ConfigError::InvalidValue(
                "mines bounds must satisfy 1 <= min_mines <= max_mines <= 24".to_string(),
            ));
        }
        if !(mines.house_margin > 0.0 && mines.house_margin <= 1.0) {
            return Err(ConfigError::InvalidValue(
                "mines.house_margin must be in (0, 1]".to_string(),
            ));
        }
        if mines.floor_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue(
                "mines.floor_multiplier must be >= 1".to_string(),
            ));
        }

        let sessions = &self.sessions;
        if sessions.rate_window_millis == 0 || sessions.rate_max_actions == 0 {
            return Err(ConfigError::InvalidValue(
                "sessions rate guard must allow at least one action per window".to_string(),
            ));
        }
        if sessions.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "sessions.sweep_interval_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl SessionsConfig {
    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_millis)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl LedgerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    InvalidValue(String),
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
            ConfigError::Io(msg) => write!(f, "Failed to read configuration: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
