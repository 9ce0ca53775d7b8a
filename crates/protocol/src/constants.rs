use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Minimum gap between two progress notifications for the same file.
pub const DEFAULT_NOTIFICATION_INTERVAL: Duration = Duration::from_millis(200);

/// Time to wait for a pong (or any other frame) before a push client
/// is considered gone.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// How often the server pings push clients (must be < `WS_PONG_WAIT`).
pub const WS_PING_PERIOD: Duration = Duration::from_secs(25);

/// Maximum inbound message size on the push channel (64 KiB).
///
/// Clients only send control frames, so anything larger is a misbehaving peer.
pub const WS_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Body returned for requests that match no upload/listing route.
pub const DEFAULT_REPLY: &str = "Hello world";

/// Name of a push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    /// Progress of a file currently being uploaded.
    #[serde(rename = "file-upload")]
    FileUpload,

    /// Sent once to a client right after it connects, carrying its channel id.
    #[serde(rename = "connected")]
    Connected,

    /// Forward compatibility: unknown event names deserialize here.
    #[serde(other)]
    Unknown,
}

impl EventName {
    /// Returns the on-wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::FileUpload => "file-upload",
            EventName::Connected => "connected",
            EventName::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
