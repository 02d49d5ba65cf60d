//! Environment-aware structured logging.
//!
//! Console output for interactive use, plus an optional JSON file layer for
//! post-hoc analysis of workflow executions.

use std::path::Path;
use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize console-only logging. Safe to call more than once.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(env_filter()),
        );

        // A global subscriber may already exist (embedding applications own it).
        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}

/// Initialize logging with an additional JSON file layer under `log_dir`.
pub fn init_logging_with_file(log_dir: &Path) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let file_appender = tracing_appender::rolling::daily(log_dir, "dealflow-core.log");
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_filter(env_filter()),
            )
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .json()
                    .with_filter(env_filter()),
            );

        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        } else {
            tracing::info!(log_dir = %log_dir.display(), "structured logging initialized");
        }

        // The writer guard must live for the process lifetime.
        std::mem::forget(guard);
    });
}
