//! Sequential chunk reads over a single open stream.
//!
//! The server dictates chunk sizes; [`ChunkReader`] hands back exactly that
//! many bytes per call, in file order, so chunk `i` always covers the bytes
//! immediately after chunk `i - 1`.

use crate::error::UploadError;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound on the buffer pre-allocated for one chunk (16MB)
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

pub struct ChunkReader<R> {
    reader: R,
    position: u64,
}

impl<R> ChunkReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
        }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read exactly `size` bytes. Hitting end-of-file first means the file
    /// is shorter than the chunk plan and is reported as a size mismatch.
    pub async fn read_chunk(&mut self, size: u64) -> Result<Vec<u8>, UploadError> {
        let mut buffer = Vec::with_capacity(size.min(MAX_PREALLOC) as usize);
        let n = (&mut self.reader)
            .take(size)
            .read_to_end(&mut buffer)
            .await? as u64;

        if n != size {
            return Err(UploadError::size_mismatch(format!(
                "expected {} bytes at offset {} but only {} remained",
                size, self.position, n
            )));
        }

        self.position += n;
        Ok(buffer)
    }

    /// Fail if any bytes remain past the last chunk
    pub async fn ensure_exhausted(&mut self) -> Result<(), UploadError> {
        let mut probe = [0u8; 1];
        let n = self.reader.read(&mut probe).await?;
        if n != 0 {
            return Err(UploadError::size_mismatch(format!(
                "file has data beyond the {} bytes covered by the chunk plan",
                self.position
            )));
        }
        Ok(())
    }
}
