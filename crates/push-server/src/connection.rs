//! Client connection management: read/write pumps, ping/pong, send buffering.

use filedrop_protocol::PushMessage;
use filedrop_protocol::constants::{WS_PING_PERIOD, WS_PONG_WAIT};
use filedrop_transfer::ChannelId;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_util::sync::CancellationToken;

use crate::SEND_BUFFER_SIZE;
use crate::hub::PushHub;

/// Handle for sending messages to one push client.
///
/// Cloneable and cheap; wraps an `mpsc::Sender`.
#[derive(Clone)]
pub struct Sender {
    tx: mpsc::Sender<WsMessage>,
}

impl Sender {
    pub(crate) fn new(tx: mpsc::Sender<WsMessage>) -> Self {
        Self { tx }
    }

    /// Queues a [`PushMessage`] as JSON text without waiting.
    pub fn send_msg(&self, msg: &PushMessage) -> Result<(), SendError> {
        let json = serde_json::to_string(msg)?;
        self.tx
            .try_send(WsMessage::Text(json.into()))
            .map_err(|e| match e {
                TrySendError::Full(_) => SendError::Full,
                TrySendError::Closed(_) => SendError::Closed,
            })
    }

    /// Returns `true` if the send channel is still open.
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Error returned when a message cannot be queued.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("send buffer full")]
    Full,

    #[error("connection closed")]
    Closed,

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Active connection to a push client.
///
/// The read/write pumps run as background tasks; this is just a handle.
pub struct PushConnection {
    channel_id: ChannelId,
    sender: Sender,
    cancel: CancellationToken,
}

impl PushConnection {
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Returns a cloneable [`Sender`] for this connection.
    pub fn sender(&self) -> Sender {
        self.sender.clone()
    }

    /// Signals both pumps to stop.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

/// Starts the read and write pumps for an upgraded WebSocket.
///
/// The channel is registered in `hub` before the pumps start and removed
/// when the read pump ends. The pumps stop when the client goes away or
/// `server_cancel` fires.
pub fn spawn_connection<S>(
    ws_stream: S,
    channel_id: ChannelId,
    hub: PushHub,
    server_cancel: CancellationToken,
) -> PushConnection
where
    S: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + futures_util::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error>
        + Send
        + 'static,
{
    let (tx, rx) = mpsc::channel::<WsMessage>(SEND_BUFFER_SIZE);
    let cancel = server_cancel.child_token();
    let sender = Sender { tx };

    let conn = PushConnection {
        channel_id: channel_id.clone(),
        sender: sender.clone(),
        cancel: cancel.clone(),
    };

    hub.register(channel_id.clone(), sender.clone());

    let (ws_sink, ws_stream) = ws_stream.split();

    tokio::spawn(write_pump(ws_sink, rx, cancel.clone()));

    let read_cancel = cancel;
    tokio::spawn(async move {
        read_pump(ws_stream, sender, read_cancel.clone()).await;
        // Stop the write pump too.
        read_cancel.cancel();
        hub.unregister(&channel_id);
        tracing::info!(channel = %channel_id, "push client disconnected");
    });

    conn
}

/// Write pump: drains the send channel and sends WS pings.
async fn write_pump<S>(mut sink: S, mut rx: mpsc::Receiver<WsMessage>, cancel: CancellationToken)
where
    S: futures_util::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error> + Send + Unpin,
{
    let mut ping_interval = tokio::time::interval(WS_PING_PERIOD);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            msg = rx.recv() => {
                match msg {
                    Some(ws_msg) => {
                        if let Err(e) = sink.send(ws_msg).await {
                            tracing::error!("write pump send error: {e}");
                            break;
                        }
                    }
                    None => break,
                }
            }

            _ = ping_interval.tick() => {
                if let Err(e) = sink.send(WsMessage::Ping(Vec::new().into())).await {
                    tracing::error!("write pump ping error: {e}");
                    break;
                }
            }
        }
    }

    // Best-effort close frame.
    let _ = sink.close().await;
}

/// Read pump: watches liveness and answers pings.
///
/// Push clients have nothing to say; text and binary frames are ignored.
async fn read_pump<S>(mut stream: S, sender: Sender, cancel: CancellationToken)
where
    S: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + Send
        + Unpin,
{
    let mut pong_deadline = tokio::time::interval(WS_PONG_WAIT);
    pong_deadline.reset();
    let mut got_pong = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            _ = pong_deadline.tick() => {
                if !got_pong {
                    tracing::warn!("pong timeout, closing connection");
                    break;
                }
                got_pong = false;
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Pong(_))) => {
                        got_pong = true;
                        pong_deadline.reset();
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = sender.tx.try_send(WsMessage::Pong(data));
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        tracing::debug!("received close frame");
                        break;
                    }
                    Some(Ok(other)) => {
                        tracing::debug!(len = other.len(), "ignoring client frame");
                    }
                    Some(Err(e)) => {
                        tracing::error!("read pump error: {e}");
                        break;
                    }
                    None => break,
                }
            }
        }
    }
}
