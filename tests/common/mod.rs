//! Shared fakes for lifecycle integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sleeping_bedrock::config::Settings;
use sleeping_bedrock::engine::{
    ConnectionAttempt, ConnectionHandler, EngineConfig, EngineError, EngineFactory, EngineOptions,
    ShutdownOptions, TransportEngine, WorldConfig,
};
use sleeping_bedrock::observability::LogSink;
use sleeping_bedrock::{PlayerSignal, WakeCallback};

/// Settings from the reference scenario.
pub fn scenario_settings(hide_ip: bool) -> Settings {
    Settings {
        bedrock_port: 19132,
        login_message: "Server sleeping".to_string(),
        hide_ip_in_logs: hide_ip,
        ..Settings::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// LogSink that keeps every line.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, text)| *l == level && text.contains(needle))
    }

    pub fn any_contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, text)| text.contains(needle))
    }

    fn push(&self, level: Level, text: &str) {
        self.lines.lock().unwrap().push((level, text.to_string()));
    }
}

impl LogSink for RecordingSink {
    fn info(&self, text: &str) {
        self.push(Level::Info, text);
    }
    fn warn(&self, text: &str) {
        self.push(Level::Warn, text);
    }
    fn error(&self, text: &str) {
        self.push(Level::Error, text);
    }
}

/// Wake callback that records every signal.
pub fn recording_wake() -> (WakeCallback, Arc<Mutex<Vec<PlayerSignal>>>) {
    let signals = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&signals);
    let wake: WakeCallback = Arc::new(move |signal: PlayerSignal| {
        sink.lock().unwrap().push(signal);
    });
    (wake, signals)
}

/// Scripted result of `bootstrap`.
#[derive(Clone)]
pub enum Bootstrap {
    Ok,
    WorldGeneration(&'static str),
    Opaque(&'static str),
    BindFailure,
}

impl Bootstrap {
    fn result(&self) -> Result<(), EngineError> {
        match self {
            Bootstrap::Ok => Ok(()),
            Bootstrap::WorldGeneration(msg) => Err(EngineError::WorldGeneration(msg.to_string())),
            Bootstrap::Opaque(msg) => Err(EngineError::Opaque(msg.to_string())),
            Bootstrap::BindFailure => Err(EngineError::Bind(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "address already in use",
            ))),
        }
    }
}

/// Scripted behaviour of `shutdown`.
#[derive(Clone, Copy)]
pub enum Teardown {
    Ok,
    Fail,
    Hang,
}

#[derive(Default)]
struct TapState {
    handler: Option<ConnectionHandler>,
    live: bool,
    configured: Option<EngineConfig>,
    bootstraps: Vec<(IpAddr, u16)>,
    shutdowns: Vec<ShutdownOptions>,
}

/// Test-side view into the fake engine.
#[derive(Clone, Default)]
pub struct EngineTap {
    state: Arc<Mutex<TapState>>,
}

impl EngineTap {
    /// Deliver a connection attempt the way the engine loop would.
    ///
    /// Returns `None` when the engine is not delivering events.
    pub fn connect(&self, peer: &str) -> Option<FakeAttempt> {
        self.connect_with(FakeAttempt::new(peer))
    }

    pub fn connect_with(&self, mut attempt: FakeAttempt) -> Option<FakeAttempt> {
        let handler = {
            let state = self.state.lock().unwrap();
            if !state.live {
                return None;
            }
            state.handler.clone()?
        };
        handler(&mut attempt);
        Some(attempt)
    }

    pub fn configured(&self) -> Option<EngineConfig> {
        self.state.lock().unwrap().configured.clone()
    }

    pub fn bootstraps(&self) -> Vec<(IpAddr, u16)> {
        self.state.lock().unwrap().bootstraps.clone()
    }

    pub fn shutdowns(&self) -> Vec<ShutdownOptions> {
        self.state.lock().unwrap().shutdowns.clone()
    }

    pub fn is_live(&self) -> bool {
        self.state.lock().unwrap().live
    }
}

/// Factory for the fake engine.
pub struct FakeFactory {
    pub bootstrap: Bootstrap,
    pub teardown: Teardown,
    pub lock_worlds: bool,
    pub tap: EngineTap,
}

impl FakeFactory {
    pub fn new(bootstrap: Bootstrap) -> Self {
        Self {
            bootstrap,
            teardown: Teardown::Ok,
            lock_worlds: false,
            tap: EngineTap::default(),
        }
    }

    pub fn with_teardown(mut self, teardown: Teardown) -> Self {
        self.teardown = teardown;
        self
    }

    pub fn with_locked_worlds(mut self) -> Self {
        self.lock_worlds = true;
        self
    }
}

impl EngineFactory for FakeFactory {
    type Engine = FakeEngine;

    fn configure(&self, options: &EngineOptions) -> EngineConfig {
        EngineConfig {
            options: options.clone(),
            worlds: vec![WorldConfig {
                name: "world".to_string(),
                generator: "overworld".to_string(),
                locked: self.lock_worlds,
            }],
            available_generators: vec!["overworld".to_string(), "flat".to_string()],
        }
    }

    fn create(&self, config: EngineConfig) -> FakeEngine {
        self.tap.state.lock().unwrap().configured = Some(config);
        FakeEngine {
            bootstrap: self.bootstrap.clone(),
            teardown: self.teardown,
            tap: self.tap.clone(),
        }
    }
}

pub struct FakeEngine {
    bootstrap: Bootstrap,
    teardown: Teardown,
    tap: EngineTap,
}

#[async_trait]
impl TransportEngine for FakeEngine {
    fn on_connection_attempt(&mut self, handler: ConnectionHandler) {
        self.tap.state.lock().unwrap().handler = Some(handler);
    }

    async fn bootstrap(&mut self, bind_address: IpAddr, port: u16) -> Result<(), EngineError> {
        {
            let mut state = self.tap.state.lock().unwrap();
            state.bootstraps.push((bind_address, port));
            // The transport binds before world loading can fail.
            state.live = true;
        }
        tokio::task::yield_now().await;
        self.bootstrap.result()
    }

    async fn shutdown(&mut self, options: ShutdownOptions) -> Result<(), EngineError> {
        self.tap.state.lock().unwrap().shutdowns.push(options);
        match self.teardown {
            Teardown::Ok => {
                let mut state = self.tap.state.lock().unwrap();
                state.live = false;
                state.handler = None;
                Ok(())
            }
            Teardown::Fail => Err(EngineError::Opaque("socket close failed".to_string())),
            Teardown::Hang => std::future::pending().await,
        }
    }
}

/// Connection attempt that records what the interceptor did to it.
pub struct FakeAttempt {
    pub peer: SocketAddr,
    pub disconnects: Vec<String>,
    pub closes: usize,
    pub fail_disconnect: bool,
}

impl FakeAttempt {
    pub fn new(peer: &str) -> Self {
        Self {
            peer: peer.parse().unwrap(),
            disconnects: Vec::new(),
            closes: 0,
            fail_disconnect: false,
        }
    }

    pub fn failing(peer: &str) -> Self {
        Self {
            fail_disconnect: true,
            ..Self::new(peer)
        }
    }
}

impl ConnectionAttempt for FakeAttempt {
    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn disconnect(&mut self, message: &str) -> Result<(), EngineError> {
        self.disconnects.push(message.to_string());
        if self.fail_disconnect {
            Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "send failed",
            )))
        } else {
            Ok(())
        }
    }

    fn close(&mut self) -> Result<(), EngineError> {
        self.closes += 1;
        Ok(())
    }
}
