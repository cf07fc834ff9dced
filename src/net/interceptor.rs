//! Connection interceptor.
//!
//! # Responsibilities
//! - Log each attempt, honouring the hide-address flag
//! - Reject the session with the login message and release it
//! - Fire the wake callback exactly once per attempt
//!
//! # Design Decisions
//! - No retries: a failed disconnect or close is logged and counted
//! - The wake callback runs even when the transport step failed
//! - A panicking wake callback is logged; the engine loop keeps running

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::engine::{ConnectionAttempt, ConnectionHandler};
use crate::net::connection::ConnectionId;
use crate::observability::{metrics, LogSink};
use crate::wake::{PlayerSignal, WakeCallback};

/// Handles pre-session connection attempts for one listener.
pub struct ConnectionInterceptor {
    login_message: String,
    hide_ip_in_logs: bool,
    signal: PlayerSignal,
    log: Arc<dyn LogSink>,
    wake: WakeCallback,
}

impl ConnectionInterceptor {
    pub fn new(
        login_message: impl Into<String>,
        hide_ip_in_logs: bool,
        log: Arc<dyn LogSink>,
        wake: WakeCallback,
    ) -> Self {
        Self {
            login_message: login_message.into(),
            hide_ip_in_logs,
            signal: PlayerSignal::Bedrock,
            log,
            wake,
        }
    }

    /// Adapt into the handler shape the engine registers.
    pub fn into_handler(self: Arc<Self>) -> ConnectionHandler {
        Arc::new(move |attempt: &mut dyn ConnectionAttempt| self.handle(attempt))
    }

    pub fn handle(&self, attempt: &mut dyn ConnectionAttempt) {
        let id = ConnectionId::next();
        metrics::record_connection_attempt(self.signal.as_str());

        if self.hide_ip_in_logs {
            self.log.info("[BedRock] A player connected");
        } else {
            self.log
                .info(&format!("[BedRock] A player connected from {}", attempt.peer_addr()));
        }

        if let Err(e) = attempt.disconnect(&self.login_message) {
            metrics::record_disconnect_failure("disconnect");
            self.log
                .warn(&format!("[BedRock] Failed to disconnect {}: {}", id, e));
        }
        if let Err(e) = attempt.close() {
            metrics::record_disconnect_failure("close");
            self.log
                .warn(&format!("[BedRock] Failed to close {}: {}", id, e));
        }

        tracing::debug!(attempt = %id, signal = %self.signal, "Raising wake signal");
        let wake = &self.wake;
        let signal = self.signal;
        match panic::catch_unwind(AssertUnwindSafe(|| wake(signal))) {
            Ok(()) => metrics::record_wake_signal(signal.as_str()),
            Err(payload) => {
                metrics::record_wake_failure(signal.as_str());
                self.log.error(&format!(
                    "[BedRock] Wake callback panicked for {}: {}",
                    id,
                    panic_message(payload.as_ref())
                ));
            }
        }
    }
}

/// Text carried by a panic payload, if any.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.as_str()
    } else {
        "non-string panic payload"
    }
}
