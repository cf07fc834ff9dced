//! Wake signal handed to the orchestrator.

use std::fmt;
use std::sync::Arc;

/// Platform of a client that tried to join while the server was asleep.
///
/// Carries no identity: two attempts from the same peer are two signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PlayerSignal {
    /// A Bedrock edition client.
    Bedrock,
}

impl PlayerSignal {
    /// Label used for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerSignal::Bedrock => "bedrock",
        }
    }
}

impl fmt::Display for PlayerSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrator hook invoked once per intercepted connection.
///
/// Runs on the engine's event loop, so it must return quickly.
pub type WakeCallback = Arc<dyn Fn(PlayerSignal) + Send + Sync>;
