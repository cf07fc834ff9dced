//! Transport engine seam.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     EngineFactory::configure(options) → EngineConfig
//!     EngineFactory::create(config)     → engine
//!     engine.on_connection_attempt(handler)
//!     engine.bootstrap(addr, port)      → Ok | Tolerable | Fatal
//!
//! Per datagram (udp.rs event loop):
//!     raknet.rs decode → ping: answer pong
//!                      → open connection request: handler(&mut attempt)
//!
//! Teardown:
//!     engine.shutdown({ stay_alive })
//! ```
//!
//! # Design Decisions
//! - The lifecycle core only sees these traits; the wire protocol belongs
//!   to the engine
//! - Faults are typed (error.rs); only Opaque errors are classified by text
//!   at the boundary
//! - Handlers are synchronous and run on the engine's single event loop

pub mod error;
pub mod raknet;
pub mod udp;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;

pub use error::{EngineError, Severity};
pub use udp::{UdpEngine, UdpEngineFactory};

/// Inputs the sequencer hands to the factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Run without world simulation.
    pub headless: bool,
    /// First MOTD line shown in server lists.
    pub motd: String,
    /// Second MOTD line shown in server lists.
    pub server_name: String,
    /// Advertised player cap.
    pub max_players: u32,
}

/// A world the engine would load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldConfig {
    pub name: String,
    pub generator: String,
    /// Locked worlds reject setting changes.
    pub locked: bool,
}

/// Engine configuration produced by [`EngineFactory::configure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub options: EngineOptions,
    pub worlds: Vec<WorldConfig>,
    /// Generators this engine knows how to run.
    pub available_generators: Vec<String>,
}

impl EngineConfig {
    /// Switch every world to `generator`.
    ///
    /// Stops at the first world that cannot be changed; worlds before it
    /// keep the new generator. Returns the number of worlds changed.
    pub fn force_generator(&mut self, generator: &str) -> Result<usize, EngineError> {
        if !self.available_generators.iter().any(|g| g == generator) {
            return Err(EngineError::UnknownGenerator(generator.to_string()));
        }

        let mut changed = 0;
        for world in &mut self.worlds {
            if world.generator == generator {
                continue;
            }
            if world.locked {
                return Err(EngineError::WorldLocked(world.name.clone()));
            }
            world.generator = generator.to_string();
            changed += 1;
        }
        Ok(changed)
    }
}

/// Teardown hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownOptions {
    /// Stop only this engine; leave the host process running.
    pub stay_alive: bool,
}

/// A connection attempt surfaced before any session is established.
pub trait ConnectionAttempt: Send {
    fn peer_addr(&self) -> SocketAddr;

    /// Reject the session with a user-visible message.
    fn disconnect(&mut self, message: &str) -> Result<(), EngineError>;

    /// Release the session's transport resources.
    fn close(&mut self) -> Result<(), EngineError>;
}

/// Handler registered for pre-session connection attempts.
pub type ConnectionHandler = Arc<dyn Fn(&mut dyn ConnectionAttempt) + Send + Sync>;

/// A running (or runnable) transport engine.
#[async_trait]
pub trait TransportEngine: Send + Sync + 'static {
    /// Register the pre-session connection handler. Replaces any earlier one.
    fn on_connection_attempt(&mut self, handler: ConnectionHandler);

    /// Bind and start delivering events.
    async fn bootstrap(&mut self, bind_address: IpAddr, port: u16) -> Result<(), EngineError>;

    /// Stop delivering events and release the socket.
    async fn shutdown(&mut self, options: ShutdownOptions) -> Result<(), EngineError>;
}

/// Builds engines; injected into the lifecycle controller.
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: TransportEngine;

    fn configure(&self, options: &EngineOptions) -> EngineConfig;

    fn create(&self, config: EngineConfig) -> Self::Engine;
}
