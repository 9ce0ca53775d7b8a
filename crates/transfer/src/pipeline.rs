use std::path::Path;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::progress::{ProgressInstrumentor, ProgressReporter};
use crate::sink::SinkOpener;
use crate::{ByteStream, TransferError};

/// Streams one file from `body` into a sink opened at `path`.
///
/// Chunks pass through a [`ProgressInstrumentor`] on their way to the
/// sink. Each chunk is fully written before the next one is pulled, so a
/// slow sink slows down the reader.
///
/// On a source error the sink is closed and whatever was already written
/// stays on disk. Dropping the returned future releases the sink.
///
/// Returns the number of bytes persisted.
pub async fn run_transfer<O>(
    body: ByteStream,
    file_name: &str,
    path: &Path,
    opener: &O,
    reporter: ProgressReporter,
) -> Result<u64, TransferError>
where
    O: SinkOpener + ?Sized,
{
    let mut sink = opener
        .open(path)
        .await
        .map_err(|e| TransferError::sink(path, e))?;

    let mut instrumented = ProgressInstrumentor::new(body, file_name, reporter);

    while let Some(item) = instrumented.next().await {
        match item {
            Ok(chunk) => sink
                .write_all(&chunk)
                .await
                .map_err(|e| TransferError::sink(path, e))?,
            Err(e) => {
                tracing::warn!(file = %file_name, "upload interrupted: {e}");
                if let Err(close_err) = sink.shutdown().await {
                    tracing::debug!(file = %file_name, "close after interruption failed: {close_err}");
                }
                return Err(TransferError::SourceFailed(e));
            }
        }
    }

    sink.flush()
        .await
        .map_err(|e| TransferError::sink(path, e))?;
    sink.shutdown()
        .await
        .map_err(|e| TransferError::sink(path, e))?;

    let total = instrumented.state().bytes_transferred();
    tracing::info!(file = %file_name, bytes = total, "File [{file_name}] finished");
    Ok(total)
}
