//! Engine fault taxonomy.

use thiserror::Error;

/// How the startup sequencer must treat a bootstrap fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Raised by a subsystem the sleeping listener never uses.
    Tolerable,
    /// Anything else: the listener cannot be trusted to be up.
    Fatal,
}

/// Errors surfaced by a transport engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// World or terrain generation failed while bootstrapping.
    #[error("world generation failed: {0}")]
    WorldGeneration(String),

    /// A world's settings cannot be changed after load.
    #[error("world '{0}' is locked")]
    WorldLocked(String),

    /// The engine has no generator with this name.
    #[error("unknown generator '{0}'")]
    UnknownGenerator(String),

    /// Failed to bind the listen socket.
    #[error("failed to bind: {0}")]
    Bind(#[source] std::io::Error),

    /// Transport-level I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// bootstrap() was called on a running engine.
    #[error("engine already bootstrapped")]
    AlreadyBootstrapped,

    /// The engine has no running transport to act on.
    #[error("engine not bootstrapped")]
    NotBootstrapped,

    /// The pending session was already closed.
    #[error("session already closed")]
    SessionClosed,

    /// Text-only fault from an engine that does not type its errors.
    #[error("{0}")]
    Opaque(String),
}

impl EngineError {
    /// Classify this fault for the startup sequencer.
    pub fn severity(&self) -> Severity {
        match self {
            EngineError::WorldGeneration(_) => Severity::Tolerable,
            EngineError::Opaque(message) => Severity::of_message(message),
            _ => Severity::Fatal,
        }
    }
}

const WORLD_FAULT_KEYWORDS: [&str; 4] = ["generator", "overworld", "terrain", "world generation"];

impl Severity {
    /// Boundary classification for engines that only report text.
    pub fn of_message(message: &str) -> Self {
        let lowered = message.to_ascii_lowercase();
        if WORLD_FAULT_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            Severity::Tolerable
        } else {
            Severity::Fatal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_generation_is_tolerable() {
        let err = EngineError::WorldGeneration("Invalid generator: overworld".into());
        assert_eq!(err.severity(), Severity::Tolerable);
    }

    #[test]
    fn bind_failure_is_fatal() {
        let err = EngineError::Bind(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "address in use",
        ));
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[test]
    fn opaque_messages_are_classified_by_keyword() {
        assert_eq!(
            EngineError::Opaque("Invalid generator: overworld".into()).severity(),
            Severity::Tolerable
        );
        assert_eq!(
            EngineError::Opaque("Terrain cache corrupt".into()).severity(),
            Severity::Tolerable
        );
        assert_eq!(
            EngineError::Opaque("EACCES: permission denied".into()).severity(),
            Severity::Fatal
        );
    }
}
