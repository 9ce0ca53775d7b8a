use serde::{Deserialize, Serialize};

/// Text returned to the uploader once every file of a request is stored.
///
/// The spelling is part of the wire contract existing clients match on.
pub const UPLOAD_SUCCESS_TEXT: &str = "Files uploaded with sucess!";

// ---------------------------------------------------------------------------
// Push payloads
// ---------------------------------------------------------------------------

/// Payload of a `file-upload` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgressPayload {
    /// Bytes of this file received so far.
    pub process_already: u64,
    pub file_name: String,
}

/// Payload of the `connected` event a push client receives on connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    /// Identifier to pass back as `?socketId=` when uploading.
    pub channel_id: String,
}

// ---------------------------------------------------------------------------
// HTTP bodies
// ---------------------------------------------------------------------------

/// Body of a successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub result: String,
}

impl UploadResponse {
    pub fn success() -> Self {
        Self {
            result: UPLOAD_SUCCESS_TEXT.into(),
        }
    }
}

/// Body of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
