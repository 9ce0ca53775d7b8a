//! Test doubles for the crate's ports.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use tokio::io::AsyncWrite;

use filedrop_protocol::EventName;

use crate::{ByteStream, ChannelId, Clock, Notifier, NotifyError, SinkOpener, TransferFuture};

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Builds a finite stream out of string chunks.
pub(crate) fn chunks(parts: &[&str]) -> ByteStream {
    let items: Vec<io::Result<Bytes>> = parts
        .iter()
        .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
        .collect();
    Box::pin(stream::iter(items))
}

/// Yields `parts`, then fails with a connection reset.
pub(crate) fn chunks_then_error(parts: &[&str]) -> ByteStream {
    let err = stream::once(async {
        Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "client went away",
        ))
    });
    Box::pin(chunks(parts).chain(err))
}

/// Yields `parts`, then never produces another item.
pub(crate) fn chunks_then_stall(parts: &[&str]) -> ByteStream {
    Box::pin(chunks(parts).chain(stream::pending()))
}

/// Yields `parts`, bumping `pulled` every time a chunk leaves the source.
pub(crate) fn counted_chunks(parts: &[&str], pulled: Arc<AtomicUsize>) -> ByteStream {
    Box::pin(chunks(parts).inspect(move |_| {
        pulled.fetch_add(1, Ordering::SeqCst);
    }))
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Returns pre-programmed instants, repeating the last one once exhausted.
pub(crate) struct ScriptedClock {
    script: Mutex<VecDeque<Instant>>,
    last: Mutex<Instant>,
}

impl ScriptedClock {
    pub(crate) fn new(script: Vec<Instant>) -> Self {
        let first = script.first().copied().unwrap_or_else(Instant::now);
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(first),
        }
    }
}

impl Clock for ScriptedClock {
    fn now(&self) -> Instant {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = next;
        }
        *last
    }
}

// ---------------------------------------------------------------------------
// Notifiers
// ---------------------------------------------------------------------------

/// Records every event it is asked to send.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<(ChannelId, EventName, serde_json::Value)>>,
}

impl RecordingNotifier {
    pub(crate) fn sent(&self) -> Vec<(ChannelId, EventName, serde_json::Value)> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn payloads(&self) -> Vec<serde_json::Value> {
        self.sent().into_iter().map(|(_, _, p)| p).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn send(
        &self,
        channel: &ChannelId,
        event: EventName,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel.clone(), event, payload));
        Ok(())
    }
}

/// Fails every send, counting attempts.
#[derive(Default)]
pub(crate) struct FailingNotifier {
    pub(crate) attempts: AtomicUsize,
}

impl Notifier for FailingNotifier {
    fn send(
        &self,
        channel: &ChannelId,
        _event: EventName,
        _payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::ChannelClosed(channel.clone()))
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Shared record of what happened to in-memory sinks.
#[derive(Default)]
pub(crate) struct SinkRecord {
    pub(crate) opened: Mutex<Vec<PathBuf>>,
    pub(crate) writes: Mutex<Vec<Vec<u8>>>,
    /// Value of `pulled` observed at each write.
    pub(crate) pulled_at_write: Mutex<Vec<usize>>,
    pub(crate) pulled: Arc<AtomicUsize>,
    pub(crate) shut_down: AtomicBool,
    pub(crate) dropped: AtomicBool,
}

impl SinkRecord {
    pub(crate) fn bytes(&self) -> Vec<u8> {
        self.writes.lock().unwrap().concat()
    }
}

/// Opens [`MemorySink`]s that share one [`SinkRecord`].
#[derive(Default)]
pub(crate) struct MemoryOpener {
    pub(crate) record: Arc<SinkRecord>,
    /// Zero-based index of the write that fails, if any.
    pub(crate) fail_on_write: Option<usize>,
    pub(crate) fail_open: bool,
}

impl SinkOpener for MemoryOpener {
    type Sink = MemorySink;

    fn open<'a>(&'a self, path: &'a Path) -> TransferFuture<'a, io::Result<MemorySink>> {
        Box::pin(async move {
            if self.fail_open {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "read-only destination",
                ));
            }
            self.record.opened.lock().unwrap().push(path.to_path_buf());
            Ok(MemorySink {
                record: Arc::clone(&self.record),
                fail_on_write: self.fail_on_write,
            })
        })
    }
}

pub(crate) struct MemorySink {
    record: Arc<SinkRecord>,
    fail_on_write: Option<usize>,
}

impl AsyncWrite for MemorySink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut writes = self.record.writes.lock().unwrap();
        if self.fail_on_write == Some(writes.len()) {
            return Poll::Ready(Err(io::Error::other("no space left on device")));
        }
        writes.push(buf.to_vec());
        self.record
            .pulled_at_write
            .lock()
            .unwrap()
            .push(self.record.pulled.load(Ordering::SeqCst));
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.record.shut_down.store(true, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

impl Drop for MemorySink {
    fn drop(&mut self) {
        self.record.dropped.store(true, Ordering::SeqCst);
    }
}
