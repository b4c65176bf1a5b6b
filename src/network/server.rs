//! WebSocket Game Server
//!
//! Async WebSocket transport. Each connection gets a reader loop feeding
//! [`DuelService`] and a writer task draining the participant's queue.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::network::handler::DuelService;
use crate::network::protocol::ServerMessage;
use crate::network::session::{Participant, ParticipantId, SessionConfig};

/// Outbound queue depth per connection.
const OUTBOUND_QUEUE: usize = 64;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Match rules.
    pub session: SessionConfig,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
            max_connections: 1000,
            session: SessionConfig::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A configuration variable that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {var}")]
pub struct ConfigError {
    /// Environment variable name.
    pub var: &'static str,
    /// Offending value.
    pub value: String,
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// `BIND_ADDR`, `PORT`, `MAX_CONNECTIONS`, `CLASH_INTERVAL_MS` and
    /// `STARTING_HEALTH` override the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        fn parse<T: std::str::FromStr, F: Fn(&str) -> Option<String>>(
            lookup: &F,
            var: &'static str,
        ) -> Result<Option<T>, ConfigError> {
            match lookup(var) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| ConfigError { var, value }),
                None => Ok(None),
            }
        }

        let mut config = Self::default();
        if let Some(ip) = parse::<IpAddr, _>(&lookup, "BIND_ADDR")? {
            config.bind_addr.set_ip(ip);
        }
        if let Some(port) = parse::<u16, _>(&lookup, "PORT")? {
            config.bind_addr.set_port(port);
        }
        if let Some(max) = parse::<usize, _>(&lookup, "MAX_CONNECTIONS")? {
            config.max_connections = max;
        }
        if let Some(ms) = parse::<u64, _>(&lookup, "CLASH_INTERVAL_MS")? {
            config.session.clash_interval = Duration::from_millis(ms);
        }
        if let Some(health) = parse::<i32, _>(&lookup, "STARTING_HEALTH")? {
            config.session.starting_health = health;
        }
        Ok(config)
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Bad configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Matchmaking and live matches.
    service: Arc<DuelService>,
    /// Open connections.
    connections: Arc<AtomicUsize>,
    /// Next participant id.
    next_id: AtomicU64,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let service = Arc::new(DuelService::new(config.session.clone()));

        Self {
            config,
            service,
            connections: Arc::new(AtomicUsize::new(0)),
            next_id: AtomicU64::new(1),
            shutdown_tx,
        }
    }

    /// Run the server until [`GameServer::shutdown`] is called.
    #[instrument(skip(self), fields(addr = %self.config.bind_addr))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server v{} listening on {}", self.config.version, listener.local_addr()?);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connections.load(Ordering::SeqCst) >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let id = ParticipantId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let service = self.service.clone();
        let connections = self.connections.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        connections.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    connections.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_QUEUE);

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                let _ = ws_sender.close().await;
            });

            debug!("Connection {} is participant {}", addr, id);
            service.on_connect(Participant::new(id, msg_tx)).await;

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                service.on_message(id, &text).await;
                            }
                            Some(Ok(Message::Binary(data))) => {
                                service.on_binary(id, &data).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                warn!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup
            service.on_disconnect(id).await;
            sender_task.abort();
            connections.fetch_sub(1, Ordering::SeqCst);

            info!("Client {} cleaned up", addr);
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Matchmaking and live matches.
    pub fn service(&self) -> &Arc<DuelService> {
        &self.service
    }

    /// Get active connection count.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Get live match count.
    pub async fn match_count(&self) -> usize {
        self.service.match_count().await
    }
}
