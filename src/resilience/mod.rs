//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! close():
//!     → timeouts.rs (deadline around engine teardown)
//! ```
//!
//! # Design Decisions
//! - Teardown always has a deadline, even for engines that hang

pub mod timeouts;
