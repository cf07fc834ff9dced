//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! init() (controller.rs → startup.rs):
//!     Settings → headless engine config → register interceptor
//!     → bootstrap → Listening | ListeningDegraded | Failed
//!
//! close() (controller.rs):
//!     take engine → shutdown(stay_alive) under deadline → Closed
//!
//! Process (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → binary calls close()
//! ```
//!
//! # Design Decisions
//! - Ordered startup: handler registration before bootstrap
//! - Only world generation faults are tolerated at startup
//! - Shutdown has a deadline: an unresponsive engine is abandoned

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use controller::{ShutdownError, SleepingBedrock};
pub use shutdown::Shutdown;
pub use startup::{StartupError, StartupSequencer};
pub use state::ListenerState;
