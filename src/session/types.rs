use crate::config::{MAX_POWER_KW_LIMIT, SessionConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a live session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Energy is flowing
    Charging,
    /// Paused by the owner
    PausedManual,
    /// Paused because the charger lost its power supply
    PausedSupplyLost,
    /// Battery full; terminal
    Ended,
}

impl SessionPhase {
    pub fn is_paused(self) -> bool {
        matches!(self, Self::PausedManual | Self::PausedSupplyLost)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Charging => "Charging",
            Self::PausedManual => "Paused",
            Self::PausedSupplyLost => "Paused (no power supply)",
            Self::Ended => "Completed",
        }
    }
}

/// Something the owner should be told about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionNotice {
    Paused,
    Resumed,
    SupplyLost,
    SupplyRestored,
    Completed,
    Reset,
}

impl SessionNotice {
    pub fn message(self) -> &'static str {
        match self {
            Self::Paused => "Charging paused",
            Self::Resumed => "Charging resumed",
            Self::SupplyLost => "Power supply lost. Charging paused until supply returns",
            Self::SupplyRestored => "Power supply restored. You can resume charging",
            Self::Completed => "Charging complete. Battery is full",
            Self::Reset => "Session restarted",
        }
    }
}

/// A command the current phase does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionRejection {
    #[error("Cannot resume: power supply is unavailable")]
    SupplyUnavailable,
    #[error("Charging session has ended: battery is full")]
    Ended,
}

/// Simulation constants, taken from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    pub rate_per_kwh: f64,
    pub percent_per_tick: f64,
    pub max_power_kw: f64,
    pub power_jitter_kw: f64,
    pub supply_decay: f64,
    pub kwh_per_percent: f64,
    pub target_percent: f64,
    pub mobile_request: bool,
}

/// Unvalidated configs still yield a usable power range
impl From<&SessionConfig> for SessionParams {
    fn from(c: &SessionConfig) -> Self {
        let max_power_kw = if c.max_power_kw.is_finite() && c.max_power_kw > 0.0 {
            c.max_power_kw.min(MAX_POWER_KW_LIMIT)
        } else {
            MAX_POWER_KW_LIMIT
        };
        let power_jitter_kw = if c.power_jitter_kw.is_finite() {
            c.power_jitter_kw.clamp(0.0, max_power_kw)
        } else {
            0.0
        };
        Self {
            rate_per_kwh: c.rate_per_kwh,
            percent_per_tick: c.percent_per_tick,
            max_power_kw,
            power_jitter_kw,
            supply_decay: c.supply_decay,
            kwh_per_percent: c.kwh_per_percent,
            target_percent: c.target_percent,
            mobile_request: c.mobile_request,
        }
    }
}

/// What the live session screen renders
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub charger_id: String,
    pub phase: SessionPhase,
    pub status: String,
    pub percent: f64,
    pub kwh: f64,
    pub power_kw: f64,
    /// `None` unless the charger is the commercial one
    pub amount: Option<f64>,
    pub amount_display: String,
    pub elapsed_seconds: u64,
    pub elapsed: String,
    pub supply_present: bool,
    pub eta_seconds: Option<u64>,
    pub eta: String,
    pub notice: Option<String>,
    pub updated_at: DateTime<Utc>,
}
