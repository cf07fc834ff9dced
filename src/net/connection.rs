//! Connection attempt identity.
//!
//! Every intercepted attempt gets a process-unique id so its disconnect and
//! wake steps can be correlated in logs without recording the peer address.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ATTEMPT: AtomicU64 = AtomicU64::new(1);

/// Log-facing handle for one intercepted attempt, shown as `attempt-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Take the next id. Ids only need to differ, not to order events.
    pub fn next() -> Self {
        Self(NEXT_ATTEMPT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}
