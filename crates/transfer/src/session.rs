use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use filedrop_protocol::constants::DEFAULT_NOTIFICATION_INTERVAL;

use crate::clock::{Clock, SystemClock};
use crate::notify::Notifier;
use crate::pipeline::run_transfer;
use crate::progress::ProgressReporter;
use crate::sink::{FsSinkOpener, SinkOpener};
use crate::types::ChannelId;
use crate::{ByteStream, TransferError, TransferFuture};

/// One file part handed out by a multipart decoder.
pub struct IncomingFile {
    pub field_name: String,
    pub file_name: String,
    pub body: ByteStream,
}

impl fmt::Debug for IncomingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingFile")
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

/// Pull-driven multipart decoder.
///
/// The next file is requested only after the previous one has been fully
/// persisted. `Ok(None)` means the body has no more files.
pub trait FileSource: Send {
    fn next_file(&mut self) -> TransferFuture<'_, io::Result<Option<IncomingFile>>>;
}

/// A file that made it to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Outcome of a session in which every file was persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub files: Vec<StoredFile>,
}

impl SessionSummary {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

/// Binds uploads from one request to a push channel and a destination
/// directory.
pub struct UploadSession<O: SinkOpener = FsSinkOpener> {
    channel_id: ChannelId,
    destination_dir: PathBuf,
    interval: Duration,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    opener: O,
}

impl UploadSession<FsSinkOpener> {
    pub fn new(
        channel_id: ChannelId,
        destination_dir: impl Into<PathBuf>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            channel_id,
            destination_dir: destination_dir.into(),
            interval: DEFAULT_NOTIFICATION_INTERVAL,
            notifier,
            clock: Arc::new(SystemClock),
            opener: FsSinkOpener,
        }
    }
}

impl<O: SinkOpener> UploadSession<O> {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Swaps the sink opener, e.g. for an in-memory one in tests.
    pub fn with_sink_opener<P: SinkOpener>(self, opener: P) -> UploadSession<P> {
        UploadSession {
            channel_id: self.channel_id,
            destination_dir: self.destination_dir,
            interval: self.interval,
            notifier: self.notifier,
            clock: self.clock,
            opener,
        }
    }

    /// Destination of `file_name`: the directory, a `/`, then the name.
    ///
    /// The name is used as given; separators and `..` are not filtered.
    pub fn destination_for(&self, file_name: &str) -> PathBuf {
        let mut path = OsString::from(self.destination_dir.as_os_str());
        path.push("/");
        path.push(file_name);
        PathBuf::from(path)
    }

    fn reporter(&self) -> ProgressReporter {
        ProgressReporter::new(self.channel_id.clone(), Arc::clone(&self.notifier))
            .with_interval(self.interval)
            .with_clock(Arc::clone(&self.clock))
    }

    /// Persists a single file part.
    pub async fn on_file(&self, file: IncomingFile) -> Result<StoredFile, TransferError> {
        let path = self.destination_for(&file.file_name);
        tracing::debug!(
            field = %file.field_name,
            file = %file.file_name,
            path = %path.display(),
            "receiving file"
        );

        let bytes = run_transfer(
            file.body,
            &file.file_name,
            &path,
            &self.opener,
            self.reporter(),
        )
        .await?;

        Ok(StoredFile {
            file_name: file.file_name,
            path,
            bytes,
        })
    }

    /// Drains `source`, persisting each file in arrival order.
    ///
    /// A failed file does not stop the others. Once the source is
    /// exhausted, the first failure (if any) is returned. A decoder error
    /// ends the session since no further parts can be read.
    pub async fn run<S>(&self, source: &mut S) -> Result<SessionSummary, TransferError>
    where
        S: FileSource + ?Sized,
    {
        let mut summary = SessionSummary::default();
        let mut first_error: Option<TransferError> = None;

        loop {
            let file = match source.next_file().await {
                Ok(Some(file)) => file,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(channel = %self.channel_id, "multipart decoding failed: {e}");
                    first_error.get_or_insert(TransferError::SourceFailed(e));
                    break;
                }
            };

            let file_name = file.file_name.clone();
            match self.on_file(file).await {
                Ok(stored) => summary.files.push(stored),
                Err(e) => {
                    tracing::error!(channel = %self.channel_id, file = %file_name, "upload failed: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!(
                    channel = %self.channel_id,
                    files = summary.files.len(),
                    bytes = summary.total_bytes(),
                    "upload session complete"
                );
                Ok(summary)
            }
        }
    }
}
