//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle + interceptor:
//!     → logging.rs (LogSink adapter over tracing)
//!     → metrics.rs (connection / wake / fault counters)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - The core only needs info/warn/error text, so it sees a narrow LogSink
//! - Engine internals log through tracing directly with structured fields
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogSink, TracingSink};
