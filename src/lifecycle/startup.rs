//! Startup orchestration.
//!
//! # Responsibilities
//! - Build a headless engine configuration from settings
//! - Apply best-effort config adjustments (cheapest world generator)
//! - Register the connection handler, then bootstrap the engine
//! - Classify bootstrap faults as tolerable or fatal
//!
//! # Design Decisions
//! - The handler is installed before bootstrap, so it survives a
//!   tolerable fault
//! - A fatal fault tears the engine down before returning, so no event
//!   can be delivered afterwards

use thiserror::Error;

use crate::config::Settings;
use crate::engine::{
    ConnectionHandler, EngineError, EngineFactory, EngineOptions, Severity, ShutdownOptions,
    TransportEngine,
};
use crate::lifecycle::state::ListenerState;
use crate::observability::{metrics, LogSink};

/// Generator with no simulation cost.
pub const FALLBACK_GENERATOR: &str = "flat";

/// Errors returned by `init()`.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Bootstrap failed with a fault the listener cannot run through.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[source] EngineError),

    /// init() was called on an instance that already left Uninitialized.
    #[error("cannot initialize from state {0}")]
    InvalidState(ListenerState),
}

/// Runs the startup sequence for one engine.
pub struct StartupSequencer<'a> {
    settings: &'a Settings,
    log: &'a dyn LogSink,
}

impl<'a> StartupSequencer<'a> {
    pub fn new(settings: &'a Settings, log: &'a dyn LogSink) -> Self {
        Self { settings, log }
    }

    /// Engine options for headless, no-simulation operation.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            headless: true,
            motd: self.settings.login_message.clone(),
            server_name: self.settings.server_name.clone(),
            max_players: self.settings.max_players,
        }
    }

    /// Configure, create and bootstrap an engine.
    ///
    /// On success returns the live engine and either `Listening` or
    /// `ListeningDegraded`.
    pub async fn start<F: EngineFactory>(
        &self,
        factory: &F,
        handler: ConnectionHandler,
    ) -> Result<(F::Engine, ListenerState), StartupError> {
        let mut config = factory.configure(&self.engine_options());
        match config.force_generator(FALLBACK_GENERATOR) {
            Ok(changed) => tracing::debug!(changed, generator = FALLBACK_GENERATOR, "Forced world generator"),
            Err(e) => tracing::debug!(error = %e, "World generator adjustment skipped"),
        }

        let mut engine = factory.create(config);
        engine.on_connection_attempt(handler);

        let port = self.settings.bedrock_port;
        self.log.info(&format!("[BedRock] Starting on {}", port));

        match engine.bootstrap(self.settings.bind_address, port).await {
            Ok(()) => {
                self.log
                    .info(&format!("[BedRock] Successfully started on port {}", port));
                Ok((engine, ListenerState::Listening))
            }
            Err(e) if e.severity() == Severity::Tolerable => {
                metrics::record_tolerable_startup_fault();
                self.log.warn(&format!(
                    "[BedRock] World generation warning (expected for sleeping server): {}",
                    e
                ));
                self.log.info(
                    "[BedRock] Connection listener still active, Bedrock players can connect to wake the server",
                );
                Ok((engine, ListenerState::ListeningDegraded))
            }
            Err(e) => {
                self.log.error(&format!("[BedRock] Init error: {}", e));
                if let Err(teardown) = engine.shutdown(ShutdownOptions { stay_alive: true }).await {
                    tracing::debug!(error = %teardown, "Teardown after failed bootstrap");
                }
                Err(StartupError::Bootstrap(e))
            }
        }
    }
}
