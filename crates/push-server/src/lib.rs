//! WebSocket push channel for upload progress.
//!
//! Every client that connects gets its own channel id, announced in a
//! `connected` event. Upload sessions address progress events to that id
//! through the [`PushHub`], which implements the transfer crate's
//! [`Notifier`](filedrop_transfer::Notifier) port.

mod connection;
mod hub;
mod server;

pub use connection::{PushConnection, SendError, Sender};
pub use hub::PushHub;
pub use server::{PushServer, ServerConfig};

/// Per-client send buffer capacity.
///
/// Progress is rate limited per file, so this only fills up when a
/// client stops reading. Further events are dropped until it drains.
pub const SEND_BUFFER_SIZE: usize = 256;

/// Errors produced by the push server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
