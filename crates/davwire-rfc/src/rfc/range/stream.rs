//! Copies a resolved byte interval from a content source to a sink.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use davwire_core::config::{DEFAULT_TRANSFER_BUFFER_SIZE, TransferConfig};

use super::core::ResolvedInterval;
use super::error::{TransferError, TransferResult};

/// Streams resource content through a bounded copy buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentStreamer {
    buffer_size: usize,
}

impl Default for ContentStreamer {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSFER_BUFFER_SIZE)
    }
}

impl ContentStreamer {
    /// Creates a streamer copying through a buffer of `buffer_size` bytes
    /// (at least one).
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    #[must_use]
    pub fn from_settings(config: &TransferConfig) -> Self {
        Self::new(config.buffer_size)
    }

    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Copies `interval` from `source` (positioned at byte 0) to `sink`.
    ///
    /// ## Summary
    /// Skips `interval.start` bytes, then copies chunk by chunk, writing at
    /// most `interval.end - position` bytes of each chunk and stopping as
    /// soon as that reaches zero. A source that ends early simply yields a
    /// shorter body.
    ///
    /// Returns the number of bytes written to the sink.
    ///
    /// ## Errors
    /// `TransferError::ShortSkip` if the source ends before the interval
    /// start, `TransferError::Io` on any read, write or flush failure. A
    /// failing write aborts the copy immediately.
    #[tracing::instrument(skip(self, source, sink), fields(buffer_size = self.buffer_size))]
    pub async fn stream<R, W>(
        &self,
        source: &mut R,
        sink: &mut W,
        interval: &ResolvedInterval,
    ) -> TransferResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        skip_exact(source, interval.start).await?;

        let mut buf = vec![0_u8; self.buffer_size];
        let mut position = interval.start;
        let mut written = 0_u64;

        loop {
            let remaining = interval.end.saturating_sub(position);
            if remaining == 0 {
                break;
            }

            let read = source.read(&mut buf).await?;
            if read == 0 {
                tracing::debug!(position, end = interval.end, "Source exhausted before range end");
                break;
            }

            let to_write = usize::try_from(remaining).map_or(read, |remaining| remaining.min(read));
            sink.write_all(&buf[..to_write]).await?;

            position += to_write as u64;
            written += to_write as u64;
        }

        sink.flush().await?;
        tracing::debug!(written, "Content transfer complete");
        Ok(written)
    }
}

/// Reads and discards exactly `count` bytes.
async fn skip_exact<R>(source: &mut R, count: u64) -> TransferResult<()>
where
    R: AsyncRead + Unpin + ?Sized,
{
    if count == 0 {
        return Ok(());
    }

    let skipped = tokio::io::copy(&mut (&mut *source).take(count), &mut tokio::io::sink()).await?;
    if skipped < count {
        return Err(TransferError::ShortSkip {
            requested: count,
            skipped,
        });
    }
    Ok(())
}
