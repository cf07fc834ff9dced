//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from settings
//! - Provide the LogSink capability the lifecycle core logs through
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - The sink is built once with its component baked in and never closes
//!   the underlying subscriber

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// The logging capability the sleeping listener needs.
pub trait LogSink: Send + Sync {
    fn info(&self, text: &str);
    fn warn(&self, text: &str);
    fn error(&self, text: &str);
}

/// LogSink that forwards to `tracing` under a fixed component name.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    component: &'static str,
}

impl TracingSink {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new("bedrock")
    }
}

impl LogSink for TracingSink {
    fn info(&self, text: &str) {
        tracing::info!(component = self.component, "{}", text);
    }

    fn warn(&self, text: &str) {
        tracing::warn!(component = self.component, "{}", text);
    }

    fn error(&self, text: &str) {
        tracing::error!(component = self.component, "{}", text);
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sleeping_bedrock={}", config.log_level)));

    let (full, compact) = match config.log_format {
        LogFormat::Full => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Compact => (None, Some(tracing_subscriber::fmt::layer().compact())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(full)
        .with(compact)
        .try_init()
}
