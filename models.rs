//! Wire types for the storage control-plane API.

use serde::{Deserialize, Serialize};

/// How the server treats an existing file at the same path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateMode {
    /// Deduplicate on checksum
    #[default]
    Unique,
    Strict,
}

impl CreateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unique => "unique",
            Self::Strict => "strict",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    pub checksum: String,
    pub content_type: String,
    pub mode: CreateMode,
    pub path: String,
    pub size: u64,
}

/// One server-assigned byte range and its pre-authorized upload URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChunk {
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFileResponse {
    pub id: String,
    #[serde(default)]
    pub chunks: Vec<StorageChunk>,
}

impl CreateFileResponse {
    /// Total bytes covered by the plan, `None` if the sizes overflow `u64`
    pub fn planned_size(&self) -> Option<u64> {
        self.chunks
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(c.size))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIdRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageFile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Unix seconds; 0 until the file's data is complete
    #[serde(default)]
    pub finalized_at: i64,
}

impl StorageFile {
    pub fn is_finalized(&self) -> bool {
        self.finalized_at != 0
    }
}
