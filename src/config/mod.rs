//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → shared via Arc with the lifecycle controller and interceptor
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; the orchestrator owns them
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, ConfigError};
pub use schema::{LogFormat, ObservabilityConfig, Settings};
pub use validation::{validate_settings, ValidationError};
