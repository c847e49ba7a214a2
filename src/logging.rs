//! Structured logging and tracing for ChargeDeck
//!
//! Console, rolling file and broadcast layers are installed once per process.
//! The broadcast layer feeds the `/api/logs/stream` SSE endpoint; its level can
//! be changed at runtime without touching the other layers.

mod broadcast;
mod level;
mod state;
mod structured;

use crate::config::LoggingConfig;
use crate::error::{ChargeDeckError, Result};
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use broadcast::subscribe_log_lines;
pub use level::{parse_line_level, parse_log_level, set_web_log_level_str};
pub use state::{get_web_log_level, set_web_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use broadcast::{BroadcastMakeWriter, get_or_init_log_tx};
use level::{level_rank, min_level};
use state::{INIT_ERROR, INIT_ONCE, LOG_GUARD, WEB_LOG_LEVEL};

/// Environment variable that forces console-only logging
pub const DISABLE_FILE_LOG_ENV: &str = "CHARGEDECK_DISABLE_FILE_LOG";

/// Initialize logging system based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let base_level = parse_log_level(&config.level)?;
            let layer_level = |opt: &Option<String>| {
                opt.as_deref()
                    .and_then(|s| parse_log_level(s).ok())
                    .unwrap_or(base_level)
            };
            let console_level = layer_level(&config.console_level);
            let file_level = layer_level(&config.file_level);
            let web_level = layer_level(&config.web_level);

            // Global filter must admit the most verbose layer
            let most_verbose = min_level(min_level(console_level, file_level), web_level);
            let filter = build_env_filter(most_verbose);

            if should_use_console_only() {
                init_console_only_logging(filter, config.json_format, console_level, web_level);
            } else {
                init_file_logging(config, filter, console_level, file_level, web_level)?;
            }
            let _ = WEB_LOG_LEVEL.set(std::sync::RwLock::new(web_level));
            Ok(())
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(ChargeDeckError::config(err.clone()));
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("chargedeck={},tower_http=info", level).into())
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os(DISABLE_FILE_LOG_ENV).is_some()
}

fn broadcast_layer<S>(json_format: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let make = BroadcastMakeWriter {
        tx: get_or_init_log_tx(),
    };
    let base = fmt::layer()
        .with_writer(make)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_ansi(false);
    // Capture everything; the SSE handler applies the runtime web level
    if json_format {
        base.json().with_filter(LevelFilter::TRACE).boxed()
    } else {
        base.with_filter(LevelFilter::TRACE).boxed()
    }
}

fn console_layer<S>(json_format: bool, level: Level) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let base = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    if json_format {
        base.json().with_filter(LevelFilter::from_level(level)).boxed()
    } else {
        base.with_filter(LevelFilter::from_level(level)).boxed()
    }
}

fn init_console_only_logging(
    filter: EnvFilter,
    json_format: bool,
    console_level: Level,
    web_level: Level,
) {
    let result = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(json_format, console_level))
        .with(broadcast_layer(json_format))
        .try_init();

    if result.is_ok() {
        info!(
            "Logging initialized - console_level: {:?}, web_level: {:?}, console-only",
            console_level, web_level
        );
    }
}

fn init_file_logging(
    config: &LoggingConfig,
    filter: EnvFilter,
    console_level: Level,
    file_level: Level,
    web_level: Level,
) -> Result<()> {
    let configured = Path::new(&config.file);
    let (dir, prefix) = if configured.extension().is_some() {
        (
            configured.parent().unwrap_or(configured),
            configured
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("chargedeck"),
        )
    } else {
        (configured, "chargedeck")
    };

    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build(dir)
        .map_err(|e| ChargeDeckError::io(format!("Failed to create log file appender: {}", e)))?;

    let (non_blocking_appender, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = {
        let base = fmt::layer()
            .with_writer(non_blocking_appender)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_ansi(false);
        if config.json_format {
            base.json()
                .with_filter(LevelFilter::from_level(file_level))
                .boxed()
        } else {
            base.with_filter(LevelFilter::from_level(file_level))
                .boxed()
        }
    };

    let console = config
        .console_output
        .then(|| console_layer(config.json_format, console_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(broadcast_layer(config.json_format))
        .with(console)
        .try_init()
        .map_err(|e| ChargeDeckError::config(format!("Logging already initialized: {}", e)))?;

    info!(
        "Logging initialized - console_level: {:?}, file_level: {:?}, web_level: {:?}, file: {}",
        console_level, file_level, web_level, config.file
    );
    Ok(())
}

/// Whether a formatted line passes the current runtime web level
pub fn should_emit_to_web(line: &str) -> bool {
    let current = get_web_log_level();
    match parse_line_level(line) {
        Some(line_lvl) => level_rank(line_lvl) >= level_rank(current),
        None => true,
    }
}
