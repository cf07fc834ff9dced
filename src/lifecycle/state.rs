//! Listener state machine.
//!
//! # State Transitions
//! ```text
//! Uninitialized → Starting: init()
//! Starting → Listening: bootstrap succeeded
//! Starting → ListeningDegraded: tolerable bootstrap fault
//! Starting → Failed: fatal bootstrap fault (terminal)
//! Listening | ListeningDegraded → Closed: close()
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Uninitialized,
    Starting,
    Listening,
    ListeningDegraded,
    Failed,
    Closed,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListenerState::Uninitialized => "uninitialized",
            ListenerState::Starting => "starting",
            ListenerState::Listening => "listening",
            ListenerState::ListeningDegraded => "listening (degraded)",
            ListenerState::Failed => "failed",
            ListenerState::Closed => "closed",
        };
        f.write_str(name)
    }
}
