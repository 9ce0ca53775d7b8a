//! Wire types shared by the filedrop HTTP surface and the push channel.

pub mod constants;
pub mod envelope;
pub mod messages;

// Re-export primary types for convenience.
pub use constants::EventName;
pub use envelope::PushMessage;
pub use messages::{ConnectedPayload, ErrorResponse, UploadProgressPayload, UploadResponse};
