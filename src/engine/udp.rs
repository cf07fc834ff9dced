//! Built-in RakNet transport engine.
//!
//! # Responsibilities
//! - Bind the UDP socket and run one receive loop per engine
//! - Answer server-list pings with the sleeping MOTD
//! - Surface Open Connection Request 1 as a [`ConnectionAttempt`]
//! - Report headless world generation faults after the socket is up
//!
//! Peer addresses are never logged here; the interceptor decides whether
//! they may appear in logs.

use std::net::{IpAddr, SocketAddr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::engine::raknet::{self, Motd, OfflineMessage};
use crate::engine::{
    ConnectionAttempt, ConnectionHandler, EngineConfig, EngineError, EngineFactory, EngineOptions,
    ShutdownOptions, TransportEngine, WorldConfig,
};
use crate::lifecycle::shutdown::Shutdown;

/// Largest datagram a Bedrock client sends during the offline exchange.
const MAX_DATAGRAM: usize = 1500;

/// Generators that need no simulation and therefore load headless.
const HEADLESS_GENERATORS: [&str; 2] = ["flat", "void"];

/// Factory for [`UdpEngine`].
#[derive(Debug, Clone, Default)]
pub struct UdpEngineFactory {
    host_shutdown: Option<Shutdown>,
}

impl UdpEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engines built by this factory trigger `shutdown` when torn down
    /// without the stay-alive hint.
    pub fn with_host_shutdown(shutdown: Shutdown) -> Self {
        Self {
            host_shutdown: Some(shutdown),
        }
    }
}

impl EngineFactory for UdpEngineFactory {
    type Engine = UdpEngine;

    fn configure(&self, options: &EngineOptions) -> EngineConfig {
        EngineConfig {
            options: options.clone(),
            worlds: vec![WorldConfig {
                name: "world".to_string(),
                generator: "overworld".to_string(),
                locked: false,
            }],
            available_generators: vec![
                "overworld".to_string(),
                "flat".to_string(),
                "void".to_string(),
            ],
        }
    }

    fn create(&self, config: EngineConfig) -> UdpEngine {
        UdpEngine::new(config, self.host_shutdown.clone())
    }
}

/// Handle to a bound receive loop.
struct Running {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

/// RakNet offline-handshake engine over a Tokio UDP socket.
pub struct UdpEngine {
    config: EngineConfig,
    handler: Arc<Mutex<Option<ConnectionHandler>>>,
    server_guid: u64,
    host_shutdown: Option<Shutdown>,
    running: Option<Running>,
}

impl UdpEngine {
    pub fn new(config: EngineConfig, host_shutdown: Option<Shutdown>) -> Self {
        Self {
            config,
            handler: Arc::new(Mutex::new(None)),
            server_guid: rand::random(),
            host_shutdown,
            running: None,
        }
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    pub fn server_guid(&self) -> u64 {
        self.server_guid
    }
}

#[async_trait]
impl TransportEngine for UdpEngine {
    fn on_connection_attempt(&mut self, handler: ConnectionHandler) {
        match self.handler.lock() {
            Ok(mut slot) => *slot = Some(handler),
            Err(poisoned) => *poisoned.into_inner() = Some(handler),
        }
    }

    async fn bootstrap(&mut self, bind_address: IpAddr, port: u16) -> Result<(), EngineError> {
        if self.running.is_some() {
            return Err(EngineError::AlreadyBootstrapped);
        }
        if !self.config.options.headless {
            return Err(EngineError::Opaque(
                "the UDP engine only runs headless".to_string(),
            ));
        }

        let socket = UdpSocket::bind(SocketAddr::new(bind_address, port))
            .await
            .map_err(EngineError::Bind)?;
        let local_addr = socket.local_addr()?;

        let options = &self.config.options;
        let motd = Motd {
            headline: &options.motd,
            server_name: &options.server_name,
            max_players: options.max_players,
            server_guid: self.server_guid,
            port: local_addr.port(),
        }
        .render();

        let shutdown = Shutdown::new();
        let event_loop = EventLoop {
            socket: Arc::new(socket),
            handler: Arc::clone(&self.handler),
            server_guid: self.server_guid,
            motd,
        };
        let task = tokio::spawn(event_loop.run(shutdown.subscribe()));

        self.running = Some(Running {
            local_addr,
            shutdown,
            task,
        });
        tracing::info!(address = %local_addr, guid = self.server_guid, "RakNet listener bound");

        // The socket stays up; world loading is the only thing that failed.
        if let Some(world) = self
            .config
            .worlds
            .iter()
            .find(|w| !HEADLESS_GENERATORS.contains(&w.generator.as_str()))
        {
            return Err(EngineError::WorldGeneration(format!(
                "Invalid generator: {}",
                world.generator
            )));
        }

        Ok(())
    }

    async fn shutdown(&mut self, options: ShutdownOptions) -> Result<(), EngineError> {
        let running = self.running.take().ok_or(EngineError::NotBootstrapped)?;

        running.shutdown.trigger();
        running
            .task
            .await
            .map_err(|e| EngineError::Opaque(format!("event loop task failed: {}", e)))?;

        tracing::info!(address = %running.local_addr, "RakNet listener stopped");

        if !options.stay_alive {
            if let Some(host) = &self.host_shutdown {
                host.trigger();
            }
        }
        Ok(())
    }
}

impl Drop for UdpEngine {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.shutdown.trigger();
        }
    }
}

struct EventLoop {
    socket: Arc<UdpSocket>,
    handler: Arc<Mutex<Option<ConnectionHandler>>>,
    server_guid: u64,
    motd: String,
}

impl EventLoop {
    async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let received = tokio::select! {
                _ = shutdown.recv() => break,
                received = self.socket.recv_from(&mut buf) => received,
            };
            match received {
                Ok((len, peer)) => self.dispatch(&buf[..len], peer).await,
                // ICMP unreachable from a vanished client surfaces here on some platforms.
                Err(e) => tracing::debug!(error = %e, "UDP receive failed"),
            }
        }
    }

    async fn dispatch(&self, datagram: &[u8], peer: SocketAddr) {
        match raknet::decode(datagram) {
            Ok(OfflineMessage::UnconnectedPing { ping_time, .. }) => {
                let pong = raknet::encode_pong(ping_time, self.server_guid, &self.motd);
                if let Err(e) = self.socket.send_to(&pong, peer).await {
                    tracing::debug!(error = %e, "Failed to send pong");
                }
            }
            Ok(OfflineMessage::OpenConnectionRequest1 { protocol, mtu }) => {
                tracing::debug!(protocol, mtu, "Open connection request");
                let handler = match self.handler.lock() {
                    Ok(slot) => slot.clone(),
                    Err(poisoned) => poisoned.into_inner().clone(),
                };

                let mut attempt = PendingSession {
                    socket: Arc::clone(&self.socket),
                    peer,
                    protocol,
                    server_guid: self.server_guid,
                    closed: false,
                };
                match handler {
                    Some(handler) => {
                        // A handler panic must not end the receive loop.
                        if panic::catch_unwind(AssertUnwindSafe(|| handler(&mut attempt))).is_err() {
                            tracing::error!("Connection handler panicked");
                        }
                    }
                    None => {
                        tracing::warn!("No connection handler registered, rejecting");
                        let _ = attempt.disconnect("");
                    }
                }
                // Nothing proceeds past the offline exchange.
                let _ = attempt.close();
            }
            Err(e) => tracing::trace!(error = %e, "Dropping datagram"),
        }
    }
}

/// A client that sent Open Connection Request 1 and is waiting for a reply.
struct PendingSession {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    protocol: u8,
    server_guid: u64,
    closed: bool,
}

impl ConnectionAttempt for PendingSession {
    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn disconnect(&mut self, message: &str) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::SessionClosed);
        }
        let reply = raknet::encode_rejection(self.protocol, self.server_guid);
        self.socket.try_send_to(&reply, self.peer)?;
        tracing::debug!(reason = message, "Rejected connection attempt");
        Ok(())
    }

    fn close(&mut self) -> Result<(), EngineError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn options() -> EngineOptions {
        EngineOptions {
            headless: true,
            motd: "Server sleeping".into(),
            server_name: "Lobby".into(),
            max_players: 5,
        }
    }

    fn flat_engine() -> UdpEngine {
        let factory = UdpEngineFactory::new();
        let mut config = factory.configure(&options());
        config.force_generator("flat").unwrap();
        factory.create(config)
    }

    fn open_connection_request(protocol: u8) -> Vec<u8> {
        let mut datagram = vec![raknet::ID_OPEN_CONNECTION_REQUEST_1];
        datagram.extend_from_slice(&raknet::OFFLINE_MAGIC);
        datagram.push(protocol);
        datagram.resize(576, 0);
        datagram
    }

    async fn recv(socket: &UdpSocket) -> Vec<u8> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .expect("no reply")
            .unwrap();
        buf.truncate(len);
        buf
    }

    #[tokio::test]
    async fn default_world_fails_headless_but_keeps_listening() {
        let factory = UdpEngineFactory::new();
        let mut engine = factory.create(factory.configure(&options()));

        let err = engine.bootstrap(LOCALHOST, 0).await.unwrap_err();
        assert!(matches!(&err, EngineError::WorldGeneration(msg) if msg == "Invalid generator: overworld"));
        assert!(engine.local_addr().is_some());

        engine.shutdown(ShutdownOptions { stay_alive: true }).await.unwrap();
        assert!(engine.local_addr().is_none());
    }

    #[tokio::test]
    async fn answers_ping_with_motd() {
        let mut engine = flat_engine();
        engine.bootstrap(LOCALHOST, 0).await.unwrap();
        let server = engine.local_addr().unwrap();

        let client = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
        let mut ping = vec![raknet::ID_UNCONNECTED_PING];
        ping.extend_from_slice(&1234i64.to_be_bytes());
        ping.extend_from_slice(&raknet::OFFLINE_MAGIC);
        ping.extend_from_slice(&9u64.to_be_bytes());
        client.send_to(&ping, server).await.unwrap();

        let pong = recv(&client).await;
        assert_eq!(pong[0], raknet::ID_UNCONNECTED_PONG);
        assert_eq!(&pong[1..9], &1234i64.to_be_bytes());
        assert_eq!(&pong[9..17], &engine.server_guid().to_be_bytes());
        let motd = String::from_utf8_lossy(&pong[35..]).to_string();
        assert!(motd.starts_with("MCPE;Server sleeping;"));
        assert!(motd.contains(";Lobby;"));

        engine.shutdown(ShutdownOptions { stay_alive: true }).await.unwrap();
    }

    #[tokio::test]
    async fn connection_request_reaches_handler_and_is_rejected() {
        let mut engine = flat_engine();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        engine.on_connection_attempt(Arc::new(move |attempt: &mut dyn ConnectionAttempt| {
            seen.fetch_add(1, Ordering::SeqCst);
            attempt.disconnect("Server sleeping").unwrap();
            attempt.close().unwrap();
            assert!(matches!(
                attempt.disconnect("again"),
                Err(EngineError::SessionClosed)
            ));
        }));
        engine.bootstrap(LOCALHOST, 0).await.unwrap();
        let server = engine.local_addr().unwrap();

        let client = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
        client
            .send_to(&open_connection_request(raknet::RAKNET_PROTOCOL_VERSION), server)
            .await
            .unwrap();
        let reply = recv(&client).await;
        assert_eq!(reply[0], raknet::ID_NO_FREE_INCOMING_CONNECTIONS);

        client.send_to(&open_connection_request(9), server).await.unwrap();
        let reply = recv(&client).await;
        assert_eq!(reply[0], raknet::ID_INCOMPATIBLE_PROTOCOL_VERSION);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        engine.shutdown(ShutdownOptions { stay_alive: true }).await.unwrap();
    }

    #[tokio::test]
    async fn panicking_handler_keeps_loop_alive() {
        let mut engine = flat_engine();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        engine.on_connection_attempt(Arc::new(move |attempt: &mut dyn ConnectionAttempt| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("handler bug");
            }
            let _ = attempt.disconnect("Server sleeping");
        }));
        engine.bootstrap(LOCALHOST, 0).await.unwrap();
        let server = engine.local_addr().unwrap();

        let client = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
        client
            .send_to(&open_connection_request(raknet::RAKNET_PROTOCOL_VERSION), server)
            .await
            .unwrap();
        client
            .send_to(&open_connection_request(raknet::RAKNET_PROTOCOL_VERSION), server)
            .await
            .unwrap();
        let reply = recv(&client).await;
        assert_eq!(reply[0], raknet::ID_NO_FREE_INCOMING_CONNECTIONS);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        engine.shutdown(ShutdownOptions { stay_alive: true }).await.unwrap();
    }

    #[tokio::test]
    async fn bootstrap_twice_is_rejected() {
        let mut engine = flat_engine();
        engine.bootstrap(LOCALHOST, 0).await.unwrap();
        assert!(matches!(
            engine.bootstrap(LOCALHOST, 0).await,
            Err(EngineError::AlreadyBootstrapped)
        ));
        engine.shutdown(ShutdownOptions { stay_alive: true }).await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_without_bootstrap_errors() {
        let mut engine = flat_engine();
        assert!(matches!(
            engine.shutdown(ShutdownOptions { stay_alive: true }).await,
            Err(EngineError::NotBootstrapped)
        ));
    }

    #[tokio::test]
    async fn stay_alive_controls_host_shutdown() {
        let host = Shutdown::new();
        let mut host_rx = host.subscribe();
        let factory = UdpEngineFactory::with_host_shutdown(host.clone());

        let mut config = factory.configure(&options());
        config.force_generator("flat").unwrap();
        let mut engine = factory.create(config.clone());
        engine.bootstrap(LOCALHOST, 0).await.unwrap();
        engine.shutdown(ShutdownOptions { stay_alive: true }).await.unwrap();
        assert!(host_rx.try_recv().is_err());

        let mut engine = factory.create(config);
        engine.bootstrap(LOCALHOST, 0).await.unwrap();
        engine.shutdown(ShutdownOptions { stay_alive: false }).await.unwrap();
        assert!(host_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn bind_conflict_is_fatal() {
        let taken = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let mut engine = flat_engine();
        let err = engine.bootstrap(LOCALHOST, port).await.unwrap_err();
        assert!(matches!(err, EngineError::Bind(_)));
        assert_eq!(err.severity(), crate::engine::Severity::Fatal);
    }
}
