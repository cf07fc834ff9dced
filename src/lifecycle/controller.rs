//! Lifecycle controller for one sleeping listener.
//!
//! # Responsibilities
//! - Own the engine for its entire life and tear it down exactly once
//! - Serialize init() and close() against each other
//! - Keep close() from hanging on an unresponsive engine
//!
//! # Design Decisions
//! - close() without a live engine logs and returns Ok
//! - Failed is terminal: the orchestrator discards the instance
//! - State is published on a watch channel so readers never wait on the
//!   init/close lock

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::config::Settings;
use crate::engine::{EngineError, EngineFactory, ShutdownOptions, TransportEngine};
use crate::lifecycle::startup::{StartupError, StartupSequencer};
use crate::lifecycle::state::ListenerState;
use crate::net::ConnectionInterceptor;
use crate::observability::LogSink;
use crate::resilience::timeouts::{with_deadline, DeadlineExceeded};
use crate::wake::WakeCallback;

/// Errors returned by `close()`.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("engine shutdown failed: {0}")]
    Engine(#[source] EngineError),

    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),
}

/// A sleeping Bedrock listener.
pub struct SleepingBedrock<F: EngineFactory> {
    settings: Arc<Settings>,
    factory: F,
    log: Arc<dyn LogSink>,
    wake: WakeCallback,
    engine: Mutex<Option<F::Engine>>,
    state: watch::Sender<ListenerState>,
}

impl<F: EngineFactory> SleepingBedrock<F> {
    pub fn new(settings: Arc<Settings>, factory: F, log: Arc<dyn LogSink>, wake: WakeCallback) -> Self {
        let (state, _) = watch::channel(ListenerState::Uninitialized);
        Self {
            settings,
            factory,
            log,
            wake,
            engine: Mutex::new(None),
            state,
        }
    }

    /// Current state.
    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Observe state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    /// Start listening.
    ///
    /// Resolves once bootstrap completed. A tolerable fault still resolves
    /// `Ok` with the instance in `ListeningDegraded`.
    pub async fn init(&self) -> Result<(), StartupError> {
        let mut slot = self.engine.lock().await;

        let current = self.state();
        if current != ListenerState::Uninitialized {
            return Err(StartupError::InvalidState(current));
        }
        self.state.send_replace(ListenerState::Starting);

        let interceptor = Arc::new(ConnectionInterceptor::new(
            self.settings.login_message.clone(),
            self.settings.hide_ip_in_logs,
            Arc::clone(&self.log),
            Arc::clone(&self.wake),
        ));

        let sequencer = StartupSequencer::new(&self.settings, self.log.as_ref());
        match sequencer.start(&self.factory, interceptor.into_handler()).await {
            Ok((engine, state)) => {
                *slot = Some(engine);
                self.state.send_replace(state);
                Ok(())
            }
            Err(e) => {
                self.state.send_replace(ListenerState::Failed);
                Err(e)
            }
        }
    }

    /// Stop listening without stopping the host process.
    pub async fn close(&self) -> Result<(), ShutdownError> {
        let mut slot = self.engine.lock().await;

        let Some(mut engine) = slot.take() else {
            self.log
                .info(&format!("[BedRock] Not running ({}), nothing to close", self.state()));
            return Ok(());
        };

        self.log.info("[BedRock] Closing...");
        let deadline = Duration::from_secs(self.settings.shutdown_timeout_secs);
        let result = with_deadline(
            "engine shutdown",
            deadline,
            engine.shutdown(ShutdownOptions { stay_alive: true }),
        )
        .await;

        // Dropped on every outcome; a hung engine is abandoned, not retried.
        drop(engine);
        self.state.send_replace(ListenerState::Closed);

        match result {
            Ok(Ok(())) => {
                self.log.info("[BedRock] Closed");
                Ok(())
            }
            Ok(Err(e)) => {
                self.log.error(&format!("[BedRock] Close error: {}", e));
                Err(ShutdownError::Engine(e))
            }
            Err(elapsed) => {
                self.log.error(&format!("[BedRock] Close error: {}", elapsed));
                Err(ShutdownError::Timeout(elapsed))
            }
        }
    }
}
