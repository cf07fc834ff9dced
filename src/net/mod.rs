//! Connection interception subsystem.
//!
//! # Data Flow
//! ```text
//! Engine event loop raises a connection attempt
//!     → connection.rs (attempt id for log correlation)
//!     → interceptor.rs (log → disconnect → close → wake)
//!     → orchestrator's WakeCallback
//! ```
//!
//! # Design Decisions
//! - Registered once before bootstrap, never unregistered
//! - Every attempt is rejected; none reaches protocol negotiation
//! - Transport faults never swallow the wake signal

pub mod connection;
pub mod interceptor;

pub use connection::ConnectionId;
pub use interceptor::ConnectionInterceptor;
