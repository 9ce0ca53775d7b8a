use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use filedrop_protocol::{EventName, PushMessage};
use filedrop_transfer::{ChannelId, Notifier, NotifyError};

use crate::connection::{SendError, Sender};

/// Registry of connected push clients, keyed by channel id.
///
/// Cloning is cheap and every clone sees the same registry.
#[derive(Clone, Default)]
pub struct PushHub {
    channels: Arc<Mutex<HashMap<ChannelId, Sender>>>,
}

impl PushHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<ChannelId, Sender>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, channel: ChannelId, sender: Sender) {
        tracing::debug!(%channel, "channel registered");
        self.channels().insert(channel, sender);
    }

    pub fn unregister(&self, channel: &ChannelId) {
        if self.channels().remove(channel).is_some() {
            tracing::debug!(%channel, "channel unregistered");
        }
    }

    pub fn contains(&self, channel: &ChannelId) -> bool {
        self.channels().contains_key(channel)
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.channels().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for PushHub {
    fn send(
        &self,
        channel: &ChannelId,
        event: EventName,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        let sender = self
            .channels()
            .get(channel)
            .cloned()
            .ok_or_else(|| NotifyError::UnknownChannel(channel.clone()))?;

        let msg = PushMessage::new(event, Some(&payload))?;
        sender.send_msg(&msg).map_err(|e| match e {
            SendError::Full => NotifyError::BufferFull(channel.clone()),
            SendError::Closed => NotifyError::ChannelClosed(channel.clone()),
            SendError::Encode(e) => NotifyError::Encode(e),
        })
    }
}
