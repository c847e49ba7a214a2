//! # ChargeDeck - private EV charger dashboard service
//!
//! Backend for an EV charger owner's dashboard: a first-run onboarding
//! wizard whose progress survives restarts, a simulated live charging
//! session, session history with invoices, time-of-use tariffs and
//! locale-aware formatting, all served over a JSON/SSE HTTP API.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration and validation
//! - `logging`: structured logging and the live log stream
//! - `persistence`: key/value state storage
//! - `onboarding`: onboarding wizard state
//! - `catalog`: chargers and connectors
//! - `session`: live session state machine and its tick runner
//! - `events`: dashboard events and sinks
//! - `history`: past sessions, totals and invoices
//! - `tariff`: tariff templates and price input
//! - `format`: currency, date and duration rendering
//! - `app`: composition root
//! - `web`: HTTP server and REST API

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod history;
pub mod logging;
pub mod onboarding;
pub mod persistence;
pub mod session;
pub mod tariff;
pub mod web;

// Re-export commonly used types
pub use app::Dashboard;
pub use config::Config;
pub use error::{ChargeDeckError, Result};

#[cfg(test)]
mod config_tests;
