//! Streaming content checksum.
//!
//! Produces `"sha1:<lowercase hex>"` digests used as the content-addressing
//! key when creating a remote file.

use crate::error::UploadError;
use sha1::{Digest, Sha1};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read block size for hashing (8KB)
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;

pub const ALGORITHM: &str = "sha1";

/// Digest of a byte stream plus the number of bytes that went into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub digest: String,
    pub len: u64,
}

/// Hash everything `reader` yields, `block_size` bytes at a time.
/// A `block_size` of zero falls back to [`DEFAULT_BLOCK_SIZE`].
pub async fn compute_checksum<R>(
    reader: &mut R,
    block_size: usize,
) -> Result<Checksum, UploadError>
where
    R: AsyncRead + Unpin,
{
    let block_size = if block_size == 0 {
        DEFAULT_BLOCK_SIZE
    } else {
        block_size
    };

    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; block_size];
    let mut len = 0u64;

    loop {
        let n = reader
            .read(&mut buffer)
            .await
            .map_err(|e| UploadError::checksum_io(e.to_string()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        len += n as u64;
    }

    Ok(Checksum {
        digest: format!("{}:{}", ALGORITHM, hex::encode(hasher.finalize())),
        len,
    })
}

pub async fn file_checksum(path: impl AsRef<Path>) -> Result<Checksum, UploadError> {
    let path = path.as_ref();
    let mut file = fs::File::open(path)
        .await
        .map_err(|e| UploadError::checksum_io(format!("opening {}: {}", path.display(), e)))?;
    compute_checksum(&mut file, DEFAULT_BLOCK_SIZE).await
}
