use serde::{Deserialize, Serialize};

use crate::constants::EventName;

/// Envelope for every message on the push channel.
///
/// The `payload` field uses `serde_json::value::RawValue` so the receiver
/// only pays for deserialization once it knows the event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub event: EventName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Box<serde_json::value::RawValue>>,
}

impl PushMessage {
    /// Creates a new message with the given event and payload.
    pub fn new<T: Serialize>(event: EventName, payload: Option<&T>) -> Result<Self, serde_json::Error> {
        let raw = match payload {
            Some(p) => {
                let json = serde_json::to_string(p)?;
                Some(serde_json::value::RawValue::from_string(json)?)
            }
            None => None,
        };
        Ok(Self {
            event,
            payload: raw,
        })
    }

    /// Deserializes the payload into the given type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, serde_json::Error> {
        match &self.payload {
            Some(raw) => Ok(Some(serde_json::from_str(raw.get())?)),
            None => Ok(None),
        }
    }
}
