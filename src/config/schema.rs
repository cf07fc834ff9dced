//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Default Bedrock port.
pub const DEFAULT_BEDROCK_PORT: u16 = 19132;

/// Root settings for the sleeping listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// UDP port the listener occupies.
    pub bedrock_port: u16,

    /// Address to bind on (all interfaces by default).
    pub bind_address: IpAddr,

    /// Message shown to players whose connection is rejected.
    pub login_message: String,

    /// Keep peer addresses out of the logs.
    pub hide_ip_in_logs: bool,

    /// Second MOTD line advertised to server lists.
    pub server_name: String,

    /// Player cap advertised to server lists.
    pub max_players: u32,

    /// Deadline for engine teardown on close.
    pub shutdown_timeout_secs: u64,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bedrock_port: DEFAULT_BEDROCK_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            login_message: "Server is sleeping, it will start soon".to_string(),
            hide_ip_in_logs: false,
            server_name: "Sleeping server".to_string(),
            max_players: 10,
            shutdown_timeout_secs: 5,
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line layout.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Full,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
