use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use filedrop_protocol::UploadProgressPayload;

/// Opaque identifier of the push client that receives progress for an upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChannelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-file progress bookkeeping, owned by exactly one running transfer.
///
/// `bytes_transferred` only grows and `last_notification_at` only moves
/// forward once set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferState {
    bytes_transferred: u64,
    last_notification_at: Option<Instant>,
}

impl TransferState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes seen so far.
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// When the last progress event was emitted, if any.
    pub fn last_notification_at(&self) -> Option<Instant> {
        self.last_notification_at
    }

    /// Accounts for a chunk of `len` bytes and returns the new total.
    pub fn record(&mut self, len: usize) -> u64 {
        self.bytes_transferred = self.bytes_transferred.saturating_add(len as u64);
        self.bytes_transferred
    }

    /// Records that a notification went out at `at`.
    ///
    /// Earlier instants are ignored.
    pub fn mark_notified(&mut self, at: Instant) {
        match self.last_notification_at {
            Some(last) if at < last => {}
            _ => self.last_notification_at = Some(at),
        }
    }
}

/// Snapshot of a transfer's progress, built fresh for every emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub channel_id: ChannelId,
    pub file_name: String,
    pub bytes_transferred: u64,
}

impl ProgressEvent {
    /// Returns the payload pushed to the client.
    pub fn payload(&self) -> UploadProgressPayload {
        UploadProgressPayload {
            process_already: self.bytes_transferred,
            file_name: self.file_name.clone(),
        }
    }
}
