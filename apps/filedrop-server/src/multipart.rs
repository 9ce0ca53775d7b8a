//! Adapts `multer` to the transfer crate's pull-driven [`FileSource`].

use std::io;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};

use filedrop_transfer::{ByteStream, FileSource, IncomingFile, TransferFuture};

/// Yields the file parts of a `multipart/form-data` body in order.
///
/// Parts without a file name (plain form fields) are skipped.
pub struct MultipartSource {
    inner: multer::Multipart<'static>,
}

impl MultipartSource {
    pub fn new<S, O, E>(stream: S, boundary: impl Into<String>) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        Self {
            inner: multer::Multipart::new(stream, boundary),
        }
    }

    /// Wraps an HTTP request body.
    pub fn from_body(body: axum::body::Body, boundary: impl Into<String>) -> Self {
        Self::new(body.into_data_stream(), boundary)
    }
}

impl FileSource for MultipartSource {
    fn next_file(&mut self) -> TransferFuture<'_, io::Result<Option<IncomingFile>>> {
        Box::pin(async move {
            while let Some(field) = self.inner.next_field().await.map_err(io::Error::other)? {
                let Some(file_name) = field.file_name().map(str::to_owned) else {
                    tracing::debug!(field = ?field.name(), "skipping non-file field");
                    continue;
                };
                let field_name = field.name().unwrap_or_default().to_owned();
                let body: ByteStream = Box::pin(field.map_err(io::Error::other));

                return Ok(Some(IncomingFile {
                    field_name,
                    file_name,
                    body,
                }));
            }
            Ok(None)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{StreamExt, stream};

    const BOUNDARY: &str = "X-FILEDROP-BOUNDARY";

    fn source_from(body: &str) -> MultipartSource {
        // Split into small pieces so fields straddle chunk boundaries.
        let pieces: Vec<Result<Bytes, io::Error>> = body
            .as_bytes()
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        MultipartSource::new(stream::iter(pieces), BOUNDARY)
    }

    fn form(parts: &[(&str, Option<&str>, &str)]) -> String {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    async fn read_all(mut body: ByteStream) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn yields_files_in_order() {
        let mut source = source_from(&form(&[
            ("photo", Some("testing.txt"), "hey dude"),
            ("doc", Some("notes.md"), "# notes"),
        ]));

        let first = source.next_file().await.unwrap().unwrap();
        assert_eq!(first.field_name, "photo");
        assert_eq!(first.file_name, "testing.txt");
        assert_eq!(read_all(first.body).await.unwrap(), b"hey dude");

        let second = source.next_file().await.unwrap().unwrap();
        assert_eq!(second.file_name, "notes.md");
        assert_eq!(read_all(second.body).await.unwrap(), b"# notes");

        assert!(source.next_file().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn skips_plain_fields() {
        let mut source = source_from(&form(&[
            ("title", None, "holiday"),
            ("photo", Some("beach.jpg"), "jpegbytes"),
            ("comment", None, "nice"),
        ]));

        let file = source.next_file().await.unwrap().unwrap();
        assert_eq!(file.file_name, "beach.jpg");
        assert_eq!(read_all(file.body).await.unwrap(), b"jpegbytes");

        assert!(source.next_file().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn truncated_body_is_an_error() {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"photo\"; filename=\"cut.bin\"\r\n\r\n\
             partial"
        );
        let mut source = source_from(&body);

        let file = source.next_file().await.unwrap().unwrap();
        assert!(read_all(file.body).await.is_err());
    }
}
