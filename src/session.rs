//! Live charging session simulation
//!
//! [`LiveSession`] is a pure state machine: it never reads the clock and takes
//! its randomness from the caller, so every transition can be tested directly.
//! [`runner`] drives it from a tokio interval.

pub mod runner;
mod types;

pub use types::{SessionNotice, SessionParams, SessionPhase, SessionRejection, SessionSnapshot};

use crate::config::SessionConfig;
use crate::format::{self, LocaleSettings, NOT_APPLICABLE, UNAVAILABLE};
use chrono::Utc;
use rand::Rng;

/// Power below this is reported as zero while decaying
const POWER_FLOOR_KW: f64 = 0.05;

/// Simulated charging session
#[derive(Debug, Clone)]
pub struct LiveSession {
    id: String,
    charger_id: String,
    billable: bool,
    params: SessionParams,
    percent: f64,
    kwh: f64,
    amount: f64,
    power_kw: f64,
    elapsed_seconds: u64,
    phase: SessionPhase,
    supply_present: bool,
    last_notice: Option<SessionNotice>,
}

impl LiveSession {
    /// Start a session on `config.active_charger_id`, charging with supply present
    pub fn new(config: &SessionConfig, billable: bool) -> Self {
        let params = SessionParams::from(config);
        let percent = config.initial_percent.clamp(0.0, 100.0);
        let mut session = Self {
            id: uuid::Uuid::new_v4().to_string(),
            charger_id: config.active_charger_id.clone(),
            billable,
            power_kw: config.initial_power_kw.clamp(0.0, params.max_power_kw),
            params,
            percent,
            kwh: config.initial_kwh.max(0.0),
            amount: config.initial_amount.max(0.0),
            elapsed_seconds: 0,
            phase: SessionPhase::Charging,
            supply_present: true,
            last_notice: None,
        };
        if session.percent >= 100.0 {
            session.phase = SessionPhase::Ended;
        }
        session
    }

    /// Advance one simulated second with an explicit power change (kW)
    ///
    /// Returns the notices raised by this tick.
    pub fn tick_with(&mut self, power_delta_kw: f64) -> Vec<SessionNotice> {
        let mut notices = Vec::new();

        self.power_kw = if self.supply_present {
            self.power_kw + power_delta_kw
        } else {
            let decayed = self.power_kw * self.params.supply_decay;
            if decayed < POWER_FLOOR_KW { 0.0 } else { decayed }
        };
        self.power_kw = clamp_or_zero(self.power_kw, self.params.max_power_kw);

        if self.phase == SessionPhase::Charging && self.supply_present {
            self.elapsed_seconds += 1;
            let delta_kwh = self.power_kw / 3600.0;
            self.kwh += delta_kwh;
            self.amount += (delta_kwh * self.params.rate_per_kwh).round();
            self.percent = (self.percent + self.params.percent_per_tick).min(100.0);

            if self.percent >= 100.0 {
                self.phase = SessionPhase::Ended;
                notices.push(SessionNotice::Completed);
            }
        }

        if !self.supply_present && self.phase == SessionPhase::Charging {
            self.phase = SessionPhase::PausedSupplyLost;
            notices.push(SessionNotice::SupplyLost);
        }

        if let Some(last) = notices.last() {
            self.last_notice = Some(*last);
        }
        notices
    }

    /// Advance one simulated second with a random power perturbation
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<SessionNotice> {
        let jitter = self.params.power_jitter_kw;
        let delta = if self.supply_present && jitter > 0.0 {
            rng.random_range(-jitter..=jitter)
        } else {
            0.0
        };
        self.tick_with(delta)
    }

    /// Pause charging; pausing a paused session is a no-op
    pub fn pause(&mut self) -> Result<Option<SessionNotice>, SessionRejection> {
        match self.phase {
            SessionPhase::Ended => Err(SessionRejection::Ended),
            SessionPhase::Charging => {
                self.phase = SessionPhase::PausedManual;
                Ok(self.note(SessionNotice::Paused))
            }
            SessionPhase::PausedManual | SessionPhase::PausedSupplyLost => Ok(None),
        }
    }

    /// Resume charging
    ///
    /// A manual pause always resumes. A supply-loss pause resumes only once
    /// supply is back. An ended session never resumes.
    pub fn resume(&mut self) -> Result<Option<SessionNotice>, SessionRejection> {
        match self.phase {
            SessionPhase::Ended => Err(SessionRejection::Ended),
            SessionPhase::PausedSupplyLost if !self.supply_present => {
                Err(SessionRejection::SupplyUnavailable)
            }
            SessionPhase::PausedManual | SessionPhase::PausedSupplyLost => {
                self.phase = SessionPhase::Charging;
                Ok(self.note(SessionNotice::Resumed))
            }
            SessionPhase::Charging => Ok(None),
        }
    }

    /// Flip the simulated supply flag; losing supply takes effect on the next tick
    pub fn set_supply(&mut self, present: bool) -> Option<SessionNotice> {
        let restored = present && !self.supply_present;
        self.supply_present = present;
        if restored {
            self.note(SessionNotice::SupplyRestored)
        } else {
            None
        }
    }

    fn note(&mut self, notice: SessionNotice) -> Option<SessionNotice> {
        self.last_notice = Some(notice);
        Some(notice)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn charger_id(&self) -> &str {
        &self.charger_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn kwh(&self) -> f64 {
        self.kwh
    }

    pub fn power_kw(&self) -> f64 {
        self.power_kw
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn supply_present(&self) -> bool {
        self.supply_present
    }

    /// Accrued cost regardless of billing; see [`LiveSession::amount_due`]
    pub fn accrued_amount(&self) -> f64 {
        self.amount
    }

    /// Cost shown to the owner; only the commercial charger bills
    pub fn amount_due(&self) -> Option<f64> {
        self.billable.then_some(self.amount)
    }

    pub fn elapsed_hms(&self) -> String {
        format::format_hms(self.elapsed_seconds)
    }

    /// Seconds until the target state of charge at the current power
    ///
    /// Uses a fixed energy-per-percent figure. Only available when the vehicle
    /// made a mobile charge request and power is flowing.
    pub fn eta_seconds(&self) -> Option<u64> {
        if !self.params.mobile_request {
            return None;
        }
        let remaining = (self.params.target_percent - self.percent).max(0.0);
        if remaining == 0.0 {
            return Some(0);
        }
        if self.power_kw <= 0.0 {
            return None;
        }
        let hours = remaining * self.params.kwh_per_percent / self.power_kw;
        Some((hours * 3600.0).round() as u64)
    }

    pub fn snapshot(&self, locale: &LocaleSettings) -> SessionSnapshot {
        let amount = self.amount_due();
        let eta_seconds = self.eta_seconds();
        SessionSnapshot {
            session_id: self.id.clone(),
            charger_id: self.charger_id.clone(),
            phase: self.phase,
            status: self.phase.label().to_string(),
            percent: self.percent,
            kwh: self.kwh,
            power_kw: self.power_kw,
            amount,
            amount_display: amount.map_or_else(|| NOT_APPLICABLE.to_string(), |a| locale.amount(a)),
            elapsed_seconds: self.elapsed_seconds,
            elapsed: self.elapsed_hms(),
            supply_present: self.supply_present,
            eta_seconds,
            eta: eta_seconds.map_or_else(|| UNAVAILABLE.to_string(), format::format_hms),
            notice: self.last_notice.map(|n| n.message().to_string()),
            updated_at: Utc::now(),
        }
    }
}

fn clamp_or_zero(value: f64, max: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, max) }
}
