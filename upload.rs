//! Single-file upload orchestration.
//!
//! This module provides [`FileUploader`], which drives one local file through
//! the storage service's create → get → upload chunks → finalize flow:
//!
//! 1. Describe the local file (checksum, content type, size, remote path)
//! 2. Create the remote file record and receive the chunk plan
//! 3. Fetch the record; if it is already finalized, return it untouched
//! 4. Stream the file sequentially, PUTting each planned chunk in order
//! 5. Finalize the record
//!
//! The first failure aborts the whole upload. A failed chunk is never
//! followed by later chunks or by finalize; the remote record simply stays
//! unfinalized.

use crate::error::UploadError;
use crate::metadata::FileDescriptor;
use crate::models::{CreateFileRequest, CreateFileResponse, CreateMode, StorageFile};
use crate::streaming::ChunkReader;
use crate::transport::StorageApi;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Reported after each chunk the server acknowledges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    pub index: usize,
    pub total: usize,
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

type ProgressFn = Box<dyn Fn(&ChunkProgress) + Send + Sync>;

pub struct FileUploader<'a, A: StorageApi + ?Sized> {
    api: &'a A,
    mode: CreateMode,
    progress: Option<ProgressFn>,
}

impl<'a, A: StorageApi + ?Sized> FileUploader<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            mode: CreateMode::default(),
            progress: None,
        }
    }

    pub fn with_mode(mut self, mode: CreateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_progress(
        mut self,
        callback: impl Fn(&ChunkProgress) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Upload `local_path` into `remote_dir`, returning the finalized record
    pub async fn upload(
        &self,
        local_path: impl AsRef<Path>,
        remote_dir: &str,
    ) -> Result<StorageFile, UploadError> {
        let desc = FileDescriptor::describe(local_path, remote_dir).await?;
        info!(
            local = %desc.local_path.display(),
            remote = %desc.remote_path,
            checksum = %desc.checksum,
            content_type = %desc.content_type,
            size = desc.size,
            "starting upload"
        );

        let created = self
            .api
            .create_file(&CreateFileRequest {
                checksum: desc.checksum.clone(),
                content_type: desc.content_type.clone(),
                mode: self.mode,
                path: desc.remote_path.clone(),
                size: desc.size,
            })
            .await?;
        info!(id = %created.id, chunks = created.chunks.len(), "file record created");

        let file = self.api.get_file(&created.id).await?;
        if file.is_finalized() {
            info!(
                id = %file.id,
                finalized_at = file.finalized_at,
                "file already finalized, skipping upload"
            );
            return Ok(file);
        }

        if let Err(e) = self.upload_chunks(&desc, &created).await {
            error!(id = %created.id, error = %e, "upload aborted");
            return Err(e);
        }

        let file = self.api.finalize_file(&created.id).await?;
        if !file.is_finalized() {
            warn!(id = %file.id, "finalize returned an unfinalized record");
            return Err(UploadError::finalize_request(format!(
                "file {} was not marked finalized",
                file.id
            )));
        }

        info!(id = %file.id, finalized_at = file.finalized_at, "upload complete");
        Ok(file)
    }

    async fn upload_chunks(
        &self,
        desc: &FileDescriptor,
        plan: &CreateFileResponse,
    ) -> Result<(), UploadError> {
        let planned = plan.planned_size().ok_or_else(|| {
            UploadError::size_mismatch(format!(
                "chunk sizes overflow u64 for a {} byte file",
                desc.size
            ))
        })?;
        if planned != desc.size {
            return Err(UploadError::size_mismatch(format!(
                "chunk plan covers {} bytes but file is {} bytes",
                planned, desc.size
            )));
        }

        let file = fs::File::open(&desc.local_path).await.map_err(|e| {
            UploadError::io(format!("opening {}: {}", desc.local_path.display(), e))
        })?;
        let current_size = file.metadata().await?.len();
        if current_size != desc.size {
            return Err(UploadError::size_mismatch(format!(
                "file changed from {} to {} bytes since checksum was computed",
                desc.size, current_size
            )));
        }

        let total = plan.chunks.len();
        let mut reader = ChunkReader::new(file);

        for (index, chunk) in plan.chunks.iter().enumerate() {
            let data = reader.read_chunk(chunk.size).await?;
            debug!(index, total, size = chunk.size, "uploading chunk");

            self.api.upload_chunk(index, &chunk.url, data).await?;

            if let Some(progress) = &self.progress {
                progress(&ChunkProgress {
                    index,
                    total,
                    bytes_sent: reader.position(),
                    total_bytes: desc.size,
                });
            }
        }

        reader.ensure_exhausted().await
    }
}
