//! Configuration management for ChargeDeck
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::catalog::Charger;
use crate::error::{ChargeDeckError, Result};
use crate::format::DateFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

mod defaults;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "CHARGEDECK_CONFIG";

/// Upper bound for `session.max_power_kw`
pub const MAX_POWER_KW_LIMIT: f64 = 80.0;

/// Longest accepted tick period (one minute)
pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct Config {
    /// Web server binding configuration
    pub web: WebConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Key/value state storage
    pub storage: StorageConfig,

    /// Live session simulation parameters
    pub session: SessionConfig,

    /// Locale used for currency and date rendering
    pub locale: LocaleConfig,

    /// Chargers owned by this account
    pub chargers: Vec<Charger>,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level overriding `level`
    pub console_level: Option<String>,

    /// Optional file-specific level overriding `level`
    pub file_level: Option<String>,

    /// Optional level for the web log stream overriding `level`
    pub web_level: Option<String>,

    /// Path to log file
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Where persisted dashboard state lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding the key/value state
    pub state_file: String,
}

/// Live session simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct SessionConfig {
    /// Tick period in milliseconds; every tick is one simulated second
    pub tick_interval_ms: u64,

    /// Charger the live session runs on
    pub active_charger_id: String,

    /// The single charger whose sessions are billed
    pub commercial_charger_id: String,

    /// Energy price per kWh in the configured currency
    pub rate_per_kwh: f64,

    /// State of charge at session start (%)
    pub initial_percent: f64,

    /// Energy already delivered at session start (kWh)
    pub initial_kwh: f64,

    /// Power draw at session start (kW)
    pub initial_power_kw: f64,

    /// Amount already billed at session start
    pub initial_amount: f64,

    /// State-of-charge gain per charging tick (percentage points)
    pub percent_per_tick: f64,

    /// Upper clamp for the simulated power draw (kW)
    pub max_power_kw: f64,

    /// Maximum random power change per tick while supply is present (kW)
    pub power_jitter_kw: f64,

    /// Factor applied to the power draw per tick while supply is absent
    pub supply_decay: f64,

    /// Energy needed per percent of state of charge, used for the ETA (kWh)
    pub kwh_per_percent: f64,

    /// Target state of charge for the ETA (%)
    pub target_percent: f64,

    /// Whether the vehicle reported a mobile charge request; gates the ETA
    pub mobile_request: bool,

    /// Fixed RNG seed for reproducible telemetry
    pub seed: Option<u64>,
}

/// Locale used for currency and date rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct LocaleConfig {
    /// ISO 4217 currency code
    pub currency_code: String,

    /// Symbol rendered next to amounts
    pub currency_symbol: String,

    /// Render the symbol before the amount
    pub symbol_first: bool,

    /// Number of fraction digits
    pub decimals: u8,

    /// Thousands separator
    pub thousands_separator: String,

    /// Decimal separator
    pub decimal_separator: String,

    /// Date pattern (DD/MM/YYYY, MM/DD/YYYY or YYYY-MM-DD)
    pub date_format: String,

    /// IANA timezone name
    pub timezone: String,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `CHARGEDECK_CONFIG` or the default locations
    pub fn load() -> Result<Self> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(explicit);
        }

        let default_paths = [
            "chargedeck.yaml",
            "/data/chargedeck.yaml",
            "/etc/chargedeck/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.web.port == 0 {
            return Err(ChargeDeckError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        if self.storage.state_file.trim().is_empty() {
            return Err(ChargeDeckError::validation(
                "storage.state_file",
                "State file path cannot be empty",
            ));
        }

        self.validate_session()?;
        self.validate_locale()?;
        self.validate_chargers()?;

        Ok(())
    }

    fn validate_session(&self) -> Result<()> {
        let s = &self.session;
        if s.tick_interval_ms == 0 || s.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(ChargeDeckError::validation(
                "session.tick_interval_ms",
                format!("Must be between 1 and {}", MAX_TICK_INTERVAL_MS),
            ));
        }
        for (field, value) in [
            ("session.rate_per_kwh", s.rate_per_kwh),
            ("session.initial_percent", s.initial_percent),
            ("session.initial_kwh", s.initial_kwh),
            ("session.initial_power_kw", s.initial_power_kw),
            ("session.initial_amount", s.initial_amount),
            ("session.percent_per_tick", s.percent_per_tick),
            ("session.max_power_kw", s.max_power_kw),
            ("session.power_jitter_kw", s.power_jitter_kw),
            ("session.supply_decay", s.supply_decay),
            ("session.kwh_per_percent", s.kwh_per_percent),
            ("session.target_percent", s.target_percent),
        ] {
            if !value.is_finite() {
                return Err(ChargeDeckError::validation(field, "Must be a finite number"));
            }
        }
        if !(0.0..=100.0).contains(&s.initial_percent) {
            return Err(ChargeDeckError::validation(
                "session.initial_percent",
                "Must be between 0 and 100",
            ));
        }
        if s.percent_per_tick <= 0.0 || s.percent_per_tick > 100.0 {
            return Err(ChargeDeckError::validation(
                "session.percent_per_tick",
                "Must be in (0, 100]",
            ));
        }
        if s.max_power_kw <= 0.0 || s.max_power_kw > MAX_POWER_KW_LIMIT {
            return Err(ChargeDeckError::validation(
                "session.max_power_kw",
                format!("Must be in (0, {}]", MAX_POWER_KW_LIMIT),
            ));
        }
        if s.rate_per_kwh < 0.0
            || s.initial_kwh < 0.0
            || s.initial_amount < 0.0
            || s.initial_power_kw < 0.0
        {
            return Err(ChargeDeckError::validation(
                "session",
                "Rate, initial energy, power and amount cannot be negative",
            ));
        }
        if s.power_jitter_kw < 0.0 || s.power_jitter_kw > s.max_power_kw {
            return Err(ChargeDeckError::validation(
                "session.power_jitter_kw",
                "Must be between 0 and session.max_power_kw",
            ));
        }
        if !(0.0..=1.0).contains(&s.supply_decay) {
            return Err(ChargeDeckError::validation(
                "session.supply_decay",
                "Must be between 0 and 1",
            ));
        }
        if s.kwh_per_percent <= 0.0 {
            return Err(ChargeDeckError::validation(
                "session.kwh_per_percent",
                "Must be positive",
            ));
        }
        if !(0.0..=100.0).contains(&s.target_percent) {
            return Err(ChargeDeckError::validation(
                "session.target_percent",
                "Must be between 0 and 100",
            ));
        }
        Ok(())
    }

    fn validate_locale(&self) -> Result<()> {
        if self.locale.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ChargeDeckError::validation(
                "locale.timezone",
                format!("Unknown timezone '{}'", self.locale.timezone),
            ));
        }
        if self.locale.date_format.parse::<DateFormat>().is_err() {
            return Err(ChargeDeckError::validation(
                "locale.date_format",
                format!("Unsupported date format '{}'", self.locale.date_format),
            ));
        }
        if self.locale.decimals > 4 {
            return Err(ChargeDeckError::validation(
                "locale.decimals",
                "At most 4 fraction digits are supported",
            ));
        }
        Ok(())
    }

    fn validate_chargers(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for charger in &self.chargers {
            if charger.id.trim().is_empty() {
                return Err(ChargeDeckError::validation(
                    "chargers.id",
                    "Charger id cannot be empty",
                ));
            }
            if !seen.insert(charger.id.as_str()) {
                return Err(ChargeDeckError::validation(
                    "chargers.id",
                    format!("Duplicate charger id '{}'", charger.id),
                ));
            }
        }
        if !self.chargers.is_empty() {
            for (field, id) in [
                ("session.active_charger_id", &self.session.active_charger_id),
                (
                    "session.commercial_charger_id",
                    &self.session.commercial_charger_id,
                ),
            ] {
                if !seen.contains(id.as_str()) {
                    return Err(ChargeDeckError::validation(
                        field,
                        format!("Unknown charger '{}'", id),
                    ));
                }
            }
        }
        Ok(())
    }
}
