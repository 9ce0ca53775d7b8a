//! Streaming upload pipeline: receive → instrument → persist.
//!
//! Each uploaded file flows from an inbound byte stream through a
//! [`ProgressInstrumentor`] (which reports rate-limited progress over a
//! [`Notifier`]) into a sink opened by a [`SinkOpener`]. Only one chunk is
//! in flight at a time, so a slow sink slows down the reader instead of
//! growing a buffer.

mod clock;
mod notify;
mod pipeline;
mod progress;
mod rate_limit;
mod session;
mod sink;
mod types;

#[cfg(test)]
mod testing;

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

pub use clock::{Clock, SystemClock};
pub use notify::{NotifyError, Notifier};
pub use pipeline::run_transfer;
pub use progress::{ProgressInstrumentor, ProgressReporter};
pub use rate_limit::can_emit;
pub use session::{FileSource, IncomingFile, SessionSummary, StoredFile, UploadSession};
pub use sink::{FsSinkOpener, SinkOpener};
pub use types::{ChannelId, ProgressEvent, TransferState};

/// A boxed future returned by the crate's ports.
pub type TransferFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Inbound bytes of a single uploaded file.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Errors produced by a transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The inbound stream (or the decoder feeding it) failed.
    #[error("inbound stream failed: {0}")]
    SourceFailed(#[source] io::Error),

    /// The destination could not be opened, written or closed.
    #[error("failed to persist {}: {source}", path.display())]
    SinkFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    pub(crate) fn sink(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TransferError::SinkFailed {
            path: path.into(),
            source,
        }
    }
}
