use std::sync::Arc;

use filedrop_protocol::EventName;

use crate::types::ChannelId;

/// Why a push notification could not be delivered.
///
/// Delivery is best-effort: the instrumentor logs these and carries on.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("no client connected on channel {0}")]
    UnknownChannel(ChannelId),

    #[error("channel {0} is closed")]
    ChannelClosed(ChannelId),

    #[error("send buffer full for channel {0}")]
    BufferFull(ChannelId),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fire-and-forget push capability.
///
/// Implementations must not block: a slow client may lose events but
/// must never stall a transfer.
pub trait Notifier: Send + Sync {
    fn send(
        &self,
        channel: &ChannelId,
        event: EventName,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn send(
        &self,
        channel: &ChannelId,
        event: EventName,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        (**self).send(channel, event, payload)
    }
}
