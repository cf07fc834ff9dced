//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port non-zero, timeouts > 0)
//! - Validate observability addresses and levels
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Settings → Result<(), Vec<ValidationError>>
//! - Runs before settings are handed to the lifecycle controller

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::Settings;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Longest login message, in bytes. It is advertised in the pong MOTD.
pub const MAX_LOGIN_MESSAGE_LEN: usize = 256;

/// A single semantic problem with the settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("bedrock_port must be between 1 and 65535")]
    PortOutOfRange,

    #[error("login_message must not be empty")]
    EmptyLoginMessage,

    #[error("login_message is {0} bytes, the limit is {max}", max = MAX_LOGIN_MESSAGE_LEN)]
    LoginMessageTooLong(usize),

    #[error("shutdown_timeout_secs must be greater than zero")]
    ZeroShutdownTimeout,

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Validate settings, collecting every problem found.
pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.bedrock_port == 0 {
        errors.push(ValidationError::PortOutOfRange);
    }

    if settings.login_message.trim().is_empty() {
        errors.push(ValidationError::EmptyLoginMessage);
    } else if settings.login_message.len() > MAX_LOGIN_MESSAGE_LEN {
        errors.push(ValidationError::LoginMessageTooLong(
            settings.login_message.len(),
        ));
    }

    if settings.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }

    let observability = &settings.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(observability.log_level.clone()));
    }

    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
