use std::io;
use std::path::Path;

use tokio::io::AsyncWrite;

use crate::TransferFuture;

/// Opens the destination a transfer writes into.
pub trait SinkOpener: Send + Sync {
    type Sink: AsyncWrite + Unpin + Send;

    fn open<'a>(&'a self, path: &'a Path) -> TransferFuture<'a, io::Result<Self::Sink>>;
}

/// Creates (or truncates) a regular file at the destination path.
///
/// Parent directories are not created.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSinkOpener;

impl SinkOpener for FsSinkOpener {
    type Sink = tokio::fs::File;

    fn open<'a>(&'a self, path: &'a Path) -> TransferFuture<'a, io::Result<Self::Sink>> {
        Box::pin(tokio::fs::File::create(path))
    }
}
