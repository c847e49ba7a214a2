//! Composition root
//!
//! Builds every component from a validated [`Config`], wires the event sinks
//! and spawns the session runner.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::Result;
use crate::events::{BroadcastSink, EventSink, FanoutSink, LoggingSink};
use crate::format::LocaleSettings;
use crate::history::{self, SessionHistory};
use crate::logging::{StructuredLogger, get_logger};
use crate::onboarding::OnboardingStore;
use crate::persistence::{FileStore, KeyValueStore};
use crate::session::runner::{RunnerContext, SessionRunner};
use crate::tariff::TariffBook;
use crate::web::AppState;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Buffered events per SSE subscriber before it starts lagging
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The running dashboard service
pub struct Dashboard {
    state: AppState,
    runner: SessionRunner,
    logger: StructuredLogger,
}

impl Dashboard {
    /// Build with the file-backed store named in `config.storage`
    ///
    /// Must be called from within a tokio runtime.
    pub fn bootstrap(config: Config) -> Result<Self> {
        let store = FileStore::open(&config.storage.state_file)?;
        Self::with_store(config, Box::new(store))
    }

    /// Build on an explicit key/value store
    pub fn with_store(config: Config, store: Box<dyn KeyValueStore>) -> Result<Self> {
        config.validate()?;
        let logger = get_logger("app");

        let locale = LocaleSettings::from_config(&config.locale)?;
        let catalog = Catalog::new(config.chargers.clone(), &config.session.commercial_charger_id)?;
        let history = Arc::new(SessionHistory::with_samples(history::DEFAULT_CAPACITY));
        let broadcast = BroadcastSink::new(EVENT_CHANNEL_CAPACITY);
        let events: Arc<dyn EventSink> = Arc::new(
            FanoutSink::new()
                .with(Arc::new(LoggingSink::new()))
                .with(Arc::new(broadcast.clone()))
                .with(history.clone()),
        );

        let billable = catalog.is_commercial(&config.session.active_charger_id);
        let runner = SessionRunner::spawn(RunnerContext {
            config: config.session.clone(),
            billable,
            locale: locale.clone(),
            sink: events.clone(),
        });

        let onboarding = OnboardingStore::open(store);
        logger.info(&format!(
            "Dashboard ready: {} chargers, live session on {} (billed: {}), onboarding {}",
            catalog.list().len(),
            config.session.active_charger_id,
            billable,
            if onboarding.is_onboarding() { "in progress" } else { "idle" }
        ));

        let state = AppState {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            onboarding: Arc::new(Mutex::new(onboarding)),
            session: runner.handle(),
            history,
            tariffs: Arc::new(RwLock::new(TariffBook::sample())),
            locale: Arc::new(locale),
            events,
            broadcast,
        };

        Ok(Self {
            state,
            runner,
            logger,
        })
    }

    /// Handles for the HTTP layer
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Stop the session runner
    pub async fn shutdown(self) {
        self.logger.info("Stopping session runner");
        self.runner.shutdown().await;
    }
}
