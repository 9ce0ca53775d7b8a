//! Push WebSocket server.
//!
//! Listens on a TCP port, upgrades every connection to WebSocket and
//! registers it in the [`PushHub`] under a fresh channel id.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::accept_async_with_config;
use tokio_util::sync::CancellationToken;

use filedrop_protocol::constants::WS_MAX_MESSAGE_SIZE;
use filedrop_protocol::{ConnectedPayload, EventName, PushMessage};
use filedrop_transfer::ChannelId;

use crate::ServerError;
use crate::connection;
use crate::hub::PushHub;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: IpAddr,
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }
}

/// The push WebSocket server.
pub struct PushServer {
    config: ServerConfig,
    hub: PushHub,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl PushServer {
    pub fn new(config: ServerConfig, hub: PushHub) -> Arc<Self> {
        Arc::new(Self {
            config,
            hub,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// The registry connections are added to.
    pub fn hub(&self) -> &PushHub {
        &self.hub
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Stops accepting and closes every open connection.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the accept loop until [`shutdown`](Self::shutdown) is called.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let addr = SocketAddr::new(self.config.host, self.config.port);
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("push server listening on {local_addr}");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("push server shutting down");
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, peer_addr).await {
                                    tracing::error!(%peer_addr, "connection error: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Upgrades one TCP connection and announces its channel id.
    async fn handle_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), ServerError> {
        let mut ws_config = tokio_tungstenite::tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let ws_stream = accept_async_with_config(stream, Some(ws_config)).await?;

        let channel_id = ChannelId::new(uuid::Uuid::new_v4().to_string());
        tracing::info!(%peer_addr, channel = %channel_id, "push client connected");

        let conn = connection::spawn_connection(
            ws_stream,
            channel_id.clone(),
            self.hub.clone(),
            self.cancel.clone(),
        );

        let hello = PushMessage::new(
            EventName::Connected,
            Some(&ConnectedPayload {
                channel_id: channel_id.to_string(),
            }),
        )?;
        if let Err(e) = conn.sender().send_msg(&hello) {
            tracing::warn!(channel = %channel_id, "failed to announce channel: {e}");
            conn.close();
        }
        Ok(())
    }
}
