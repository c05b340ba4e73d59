use crate::checksum;
use crate::content_type::content_type_for;
use crate::error::UploadError;
use std::path::{Path, PathBuf};

/// Everything the create call needs to know about the local file.
/// Computed once when an upload starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub checksum: String,
    pub content_type: String,
    pub size: u64,
}

impl FileDescriptor {
    pub async fn describe(
        local_path: impl AsRef<Path>,
        remote_dir: &str,
    ) -> Result<Self, UploadError> {
        let local_path = local_path.as_ref();
        let filename = local_path
            .file_name()
            .ok_or_else(|| {
                UploadError::io(format!("path has no filename: {}", local_path.display()))
            })?
            .to_string_lossy()
            .into_owned();

        // Size comes from the same pass as the digest so both describe one
        // snapshot of the contents.
        let sum = checksum::file_checksum(local_path).await?;

        Ok(Self {
            local_path: local_path.to_path_buf(),
            remote_path: remote_file_path(remote_dir, &filename),
            checksum: sum.digest,
            content_type: content_type_for(local_path).to_string(),
            size: sum.len,
        })
    }
}

/// Join a remote directory and a file name with a single `/`
pub fn remote_file_path(remote_dir: &str, filename: &str) -> String {
    let dir = remote_dir.trim_end_matches('/');
    if dir.is_empty() {
        format!("/{}", filename)
    } else {
        format!("{}/{}", dir, filename)
    }
}
