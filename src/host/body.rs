//! Deferred response bodies.

use futures_util::future::BoxFuture;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Size of the buffer used when streaming bodies.
pub const COPY_BUFFER_SIZE: usize = 16 * 1024;

/// Destination stream handed to a body writer by the host.
pub type BodySink<'a> = &'a mut (dyn AsyncWrite + Send + Unpin);

/// A response body produced on demand.
///
/// The writer is consumed when invoked, so the host can run it at most once.
pub trait WriteBody: Send {
    /// Write the body to `dest`, aborting promptly once `cancel` fires.
    fn write_to<'a>(
        self: Box<Self>,
        dest: BodySink<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, io::Result<()>>;
}

/// An in-memory body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BytesBody(Vec<u8>);

impl BytesBody {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl WriteBody for BytesBody {
    fn write_to<'a>(
        self: Box<Self>,
        dest: BodySink<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            let mut reader: &[u8] = &self.0;
            copy_cancellable(&mut reader, dest, &cancel).await?;
            Ok(())
        })
    }
}

fn cancelled() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "response write cancelled")
}

/// Copy `reader` into `writer` until EOF, checking `cancel` between chunks.
///
/// Returns the number of bytes copied. A fired token yields
/// `ErrorKind::Interrupted`.
pub async fn copy_cancellable<R, W>(
    reader: &mut R,
    writer: &mut W,
    cancel: &CancellationToken,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            read = reader.read(&mut buf) => read?,
        };
        if n == 0 {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            written = writer.write_all(&buf[..n]) => written?,
        }
        total += n as u64;
    }

    writer.flush().await?;
    Ok(total)
}
