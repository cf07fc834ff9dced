//! Sleeping Bedrock listener library.

pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod wake;

pub use config::Settings;
pub use engine::UdpEngineFactory;
pub use lifecycle::{ListenerState, Shutdown, SleepingBedrock};
pub use wake::{PlayerSignal, WakeCallback};
