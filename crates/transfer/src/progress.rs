use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;

use filedrop_protocol::EventName;
use filedrop_protocol::constants::DEFAULT_NOTIFICATION_INTERVAL;

use crate::clock::{Clock, SystemClock};
use crate::notify::Notifier;
use crate::rate_limit::can_emit;
use crate::types::{ChannelId, ProgressEvent, TransferState};

/// Where and how often progress for one upload session is reported.
///
/// Cheap to clone; every file of a session gets its own copy.
#[derive(Clone)]
pub struct ProgressReporter {
    channel_id: ChannelId,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl ProgressReporter {
    /// Creates a reporter using the system clock and the default interval.
    pub fn new(channel_id: ChannelId, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            channel_id,
            notifier,
            clock: Arc::new(SystemClock),
            interval: DEFAULT_NOTIFICATION_INTERVAL,
        }
    }

    /// Sets the minimum gap between two events for the same file.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Replaces the clock used for rate limiting.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sends `event`, logging (never propagating) delivery failures.
    fn emit(&self, event: &ProgressEvent) {
        let payload = match serde_json::to_value(event.payload()) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(file = %event.file_name, "failed to encode progress: {e}");
                return;
            }
        };

        match self
            .notifier
            .send(&event.channel_id, EventName::FileUpload, payload)
        {
            Ok(()) => tracing::info!(
                file = %event.file_name,
                bytes = event.bytes_transferred,
                channel = %event.channel_id,
                "file {} got {} bytes",
                event.file_name,
                event.bytes_transferred
            ),
            Err(e) => tracing::warn!(
                file = %event.file_name,
                channel = %event.channel_id,
                "progress notification dropped: {e}"
            ),
        }
    }
}

/// Pass-through stage that counts bytes and reports progress.
///
/// Chunks come out exactly as they went in (same boundaries, order and
/// content). A chunk is counted once the consumer comes back for the next
/// item, so a chunk the consumer failed to persist is never reported.
/// After each count, if the rate limiter allows it, a [`ProgressEvent`]
/// with the new total is sent. The first chunk always passes the rate check.
pub struct ProgressInstrumentor<S> {
    inner: S,
    file_name: String,
    reporter: ProgressReporter,
    state: TransferState,
    /// Length of the chunk handed out but not yet counted.
    in_flight: Option<usize>,
}

impl<S> ProgressInstrumentor<S> {
    pub fn new(inner: S, file_name: impl Into<String>, reporter: ProgressReporter) -> Self {
        Self {
            inner,
            file_name: file_name.into(),
            reporter,
            state: TransferState::new(),
            in_flight: None,
        }
    }

    /// Progress bookkeeping so far. Excludes the chunk still held by the
    /// consumer.
    pub fn state(&self) -> &TransferState {
        &self.state
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn observe(&mut self, len: usize) {
        let total = self.state.record(len);
        let now = self.reporter.clock.now();
        if !can_emit(self.state.last_notification_at(), now, self.reporter.interval) {
            return;
        }

        self.state.mark_notified(now);
        let event = ProgressEvent {
            channel_id: self.reporter.channel_id.clone(),
            file_name: self.file_name.clone(),
            bytes_transferred: total,
        };
        self.reporter.emit(&event);
    }
}

impl<S> Stream for ProgressInstrumentor<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(len) = this.in_flight.take() {
            this.observe(len);
        }
        match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
            Some(Ok(chunk)) => {
                this.in_flight = Some(chunk.len());
                Poll::Ready(Some(Ok(chunk)))
            }
            other => Poll::Ready(other),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
