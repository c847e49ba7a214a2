//! Dashboard events and where they go
//!
//! Screens report user actions, the session runner reports notices and the
//! onboarding store reports progress. Everything flows through an
//! [`EventSink`] so the HTTP layer, the log and the session history can each
//! observe the same stream.

use crate::logging::{StructuredLogger, get_logger};
use crate::onboarding::Progress;
use crate::session::{SessionNotice, SessionSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// User actions a screen can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Save,
    Delete,
    Submit,
    Cancel,
    Navigate,
    Export,
    Share,
    Download,
}

/// Change reported by the onboarding wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum OnboardingChange {
    Started,
    StepCompleted { step: String },
    Advanced,
    ChargerSelected { charger_id: String },
    Finished,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// A screen-level user action; the dashboard only records these
    ScreenAction {
        screen: String,
        action: ActionKind,
        #[serde(skip_serializing_if = "serde_json::Value::is_null")]
        payload: serde_json::Value,
    },
    Session {
        notice: SessionNotice,
        message: String,
        snapshot: SessionSnapshot,
    },
    Onboarding {
        #[serde(flatten)]
        change: OnboardingChange,
        progress: Progress,
    },
}

impl DashboardEvent {
    pub fn session(notice: SessionNotice, snapshot: SessionSnapshot) -> Self {
        Self::Session {
            notice,
            message: notice.message().to_string(),
            snapshot,
        }
    }

    /// Name used for the SSE `event:` field
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScreenAction { .. } => "action",
            Self::Session { .. } => "session",
            Self::Onboarding { .. } => "onboarding",
        }
    }
}

/// Receiver of dashboard events
///
/// Implementations must not block; `emit` is called from the session tick
/// loop and from request handlers.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &DashboardEvent);
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &DashboardEvent) {}
}

/// Writes events to the structured log
#[derive(Debug, Clone)]
pub struct LoggingSink {
    logger: StructuredLogger,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self {
            logger: get_logger("events"),
        }
    }
}

impl Default for LoggingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LoggingSink {
    fn emit(&self, event: &DashboardEvent) {
        match event {
            DashboardEvent::ScreenAction { screen, action, .. } => {
                self.logger
                    .info(&format!("Screen action {:?} on {}", action, screen));
            }
            DashboardEvent::Session {
                notice, snapshot, ..
            } => {
                let msg = format!(
                    "Session {} on {}: {} ({:.2}%)",
                    snapshot.session_id,
                    snapshot.charger_id,
                    notice.message(),
                    snapshot.percent
                );
                match notice {
                    SessionNotice::SupplyLost => self.logger.warn(&msg),
                    _ => self.logger.info(&msg),
                }
            }
            DashboardEvent::Onboarding { change, progress } => {
                self.logger.info(&format!(
                    "Onboarding {:?} (step {}/{})",
                    change, progress.current, progress.total
                ));
            }
        }
    }
}

/// Fans events out to live subscribers (SSE clients)
///
/// Events sent while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<DashboardEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: &DashboardEvent) {
        let _ = self.tx.send(event.clone());
    }
}

/// Forwards each event to every inner sink, in order
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &DashboardEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
