use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;
use tracing_core::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, reload, EnvFilter, Layer};

pub type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

pub const LOG_ENV_VAR: &str = "MPK_LOG";

pub struct LoggingState {
    pub reload_handle: ReloadHandle,
    pub active_level: Mutex<tracing::Level>,
}

pub fn get_default_env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy()
}

/// Logs go to stderr so that stdout only carries command output.
pub fn setup_logging() -> (
    Arc<dyn tracing::Subscriber + Send + Sync + 'static>,
    Arc<LoggingState>,
) {
    let (env_filter, reload_handle) =
        reload::Layer::<EnvFilter, tracing_subscriber::Registry>::new(get_default_env_filter());

    let env_filter = env_filter.boxed();

    let logging_state = Arc::new(LoggingState {
        reload_handle,
        active_level: Mutex::new(Level::INFO),
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .boxed();
    let layers = env_filter.and_then(fmt_layer).boxed();

    let registry = tracing_subscriber::registry()
        .with(layers)
        .with(ErrorLayer::default());

    (Arc::new(registry), logging_state)
}

impl LoggingState {
    /// Swaps the filter for one with `new_level` as its default directive.
    pub fn change_log_level(&self, new_level: Level) -> Result<(), String> {
        let mut active_level = self.active_level.lock();
        if *active_level == new_level {
            return Ok(());
        }

        let new_filter = get_default_env_filter().add_directive(new_level.into());
        self.reload_handle
            .reload(new_filter)
            .map_err(|err| format!("Failed to change log level from {active_level} to {new_level}: {err}"))?;

        *active_level = new_level;
        Ok(())
    }
}

pub fn parse_level(level: &str) -> Option<Level> {
    match level {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
