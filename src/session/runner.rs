//! Tick loop driving a [`LiveSession`]
//!
//! The runner owns the session. Callers talk to it through a cloneable
//! [`SessionHandle`]: commands go in over an mpsc channel, the latest snapshot
//! comes back on a watch channel.

use super::{LiveSession, SessionNotice, SessionRejection, SessionSnapshot};
use crate::config::{MAX_TICK_INTERVAL_MS, SessionConfig};
use crate::error::{ChargeDeckError, Result};
use crate::events::{DashboardEvent, EventSink};
use crate::format::LocaleSettings;
use crate::logging::{LogContext, StructuredLogger, get_logger, get_logger_with_context};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

const COMMAND_QUEUE_DEPTH: usize = 32;

/// Commands accepted by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Pause,
    Resume,
    SetSupply(bool),
    /// Replace the session with a fresh one from configuration
    Reset,
}

type Reply = std::result::Result<Arc<SessionSnapshot>, SessionRejection>;

struct Envelope {
    command: SessionCommand,
    reply: oneshot::Sender<Reply>,
}

/// Everything the runner needs to build and publish sessions
pub struct RunnerContext {
    pub config: SessionConfig,
    /// Whether the active charger bills its sessions
    pub billable: bool,
    pub locale: LocaleSettings,
    pub sink: Arc<dyn EventSink>,
}

/// Cheap cloneable access to a running session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Envelope>,
    snapshots: watch::Receiver<Arc<SessionSnapshot>>,
}

impl SessionHandle {
    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every snapshot published after this call
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        let mut rx = self.snapshots.clone();
        rx.mark_unchanged();
        rx
    }

    /// Send a command and wait for the snapshot it produced
    pub async fn send(&self, command: SessionCommand) -> Result<Arc<SessionSnapshot>> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Envelope { command, reply })
            .await
            .map_err(|_| ChargeDeckError::generic("Session runner has stopped"))?;
        let outcome = rx
            .await
            .map_err(|_| ChargeDeckError::generic("Session runner dropped the command"))?;
        Ok(outcome?)
    }

    pub async fn pause(&self) -> Result<Arc<SessionSnapshot>> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<Arc<SessionSnapshot>> {
        self.send(SessionCommand::Resume).await
    }

    pub async fn set_supply(&self, present: bool) -> Result<Arc<SessionSnapshot>> {
        self.send(SessionCommand::SetSupply(present)).await
    }

    pub async fn reset(&self) -> Result<Arc<SessionSnapshot>> {
        self.send(SessionCommand::Reset).await
    }
}

/// A spawned tick loop
pub struct SessionRunner {
    handle: SessionHandle,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SessionRunner {
    /// Spawn the loop on the current tokio runtime
    pub fn spawn(ctx: RunnerContext) -> Self {
        let session = LiveSession::new(&ctx.config, ctx.billable);
        let initial = Arc::new(session.snapshot(&ctx.locale));
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let rng = match ctx.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let worker = Worker {
            logger: session_logger(&session),
            session,
            rng,
            ctx,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(worker.run(cmd_rx, shutdown_rx));

        Self {
            handle: SessionHandle {
                commands: cmd_tx,
                snapshots: snapshot_rx,
            },
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            get_logger("session").error(&format!("Session runner task failed: {}", e));
        }
    }
}

fn session_logger(session: &LiveSession) -> StructuredLogger {
    get_logger_with_context(
        LogContext::new("session")
            .with_session_id(session.id().to_string())
            .with_charger_id(session.charger_id().to_string()),
    )
}

struct Worker {
    session: LiveSession,
    rng: StdRng,
    ctx: RunnerContext,
    snapshots: watch::Sender<Arc<SessionSnapshot>>,
    logger: StructuredLogger,
}

impl Worker {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Envelope>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let period = Duration::from_millis(
            self.ctx
                .config
                .tick_interval_ms
                .clamp(1, MAX_TICK_INTERVAL_MS),
        );
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.logger.info(&format!(
            "Session runner started ({} ms per tick)",
            period.as_millis()
        ));

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    let notices = self.session.tick(&mut self.rng);
                    self.publish(&notices);
                }
                maybe = commands.recv() => match maybe {
                    Some(envelope) => self.handle_command(envelope),
                    None => {
                        self.logger.info("All session handles dropped");
                        break;
                    }
                }
            }
        }
    }

    fn handle_command(&mut self, envelope: Envelope) {
        let outcome = match envelope.command {
            SessionCommand::Pause => self.session.pause(),
            SessionCommand::Resume => self.session.resume(),
            SessionCommand::SetSupply(present) => Ok(self.session.set_supply(present)),
            SessionCommand::Reset => {
                self.session = LiveSession::new(&self.ctx.config, self.ctx.billable);
                self.logger = session_logger(&self.session);
                Ok(Some(SessionNotice::Reset))
            }
        };

        let reply = match outcome {
            Ok(notice) => {
                let notices: Vec<_> = notice.into_iter().collect();
                Ok(self.publish(&notices))
            }
            Err(rejection) => {
                self.logger.debug(&format!(
                    "Rejected {:?}: {}",
                    envelope.command, rejection
                ));
                Err(rejection)
            }
        };
        // The caller may have given up waiting
        let _ = envelope.reply.send(reply);
    }

    fn publish(&self, notices: &[SessionNotice]) -> Arc<SessionSnapshot> {
        let snapshot = Arc::new(self.session.snapshot(&self.ctx.locale));
        self.snapshots.send_replace(snapshot.clone());
        for notice in notices {
            self.ctx
                .sink
                .emit(&DashboardEvent::session(*notice, (*snapshot).clone()));
        }
        snapshot
    }
}
