use thiserror::Error;

/// Error kinds surfaced by an upload. None of them are retried internally.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Local file could not be fully read while hashing
    #[error("Checksum I/O error: {0}")]
    ChecksumIo(String),

    /// Request signature could not be computed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Create-file call failed or returned an error status
    #[error("Create request failed: {0}")]
    CreateRequest(String),

    /// Get-file call failed or returned an error status
    #[error("Get request failed: {0}")]
    GetRequest(String),

    /// Finalize-file call failed or returned an error status
    #[error("Finalize request failed: {0}")]
    FinalizeRequest(String),

    /// A chunk PUT did not report success
    #[error("Chunk {index} upload failed: {reason}")]
    ChunkUpload { index: usize, reason: String },

    /// File size disagrees with the digest-time size or the chunk plan
    #[error("Size mismatch: {0}")]
    SizeMismatch(String),

    /// Credential or configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Local file errors outside of hashing (open, stat)
    #[error("I/O error: {0}")]
    Io(String),
}

impl UploadError {
    pub fn checksum_io(msg: impl Into<String>) -> Self {
        Self::ChecksumIo(msg.into())
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    pub fn create_request(msg: impl Into<String>) -> Self {
        Self::CreateRequest(msg.into())
    }

    pub fn get_request(msg: impl Into<String>) -> Self {
        Self::GetRequest(msg.into())
    }

    pub fn finalize_request(msg: impl Into<String>) -> Self {
        Self::FinalizeRequest(msg.into())
    }

    pub fn chunk_upload(index: usize, reason: impl Into<String>) -> Self {
        Self::ChunkUpload {
            index,
            reason: reason.into(),
        }
    }

    pub fn size_mismatch(msg: impl Into<String>) -> Self {
        Self::SizeMismatch(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Whether re-running the whole upload may succeed.
    ///
    /// Network-facing failures are retryable at the caller's discretion;
    /// local precondition failures will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CreateRequest(_)
                | Self::GetRequest(_)
                | Self::FinalizeRequest(_)
                | Self::ChunkUpload { .. }
        )
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
