//! HTTP transport for the storage service.
//!
//! [`StorageApi`] is the seam the upload orchestrator drives. [`HttpTransport`]
//! implements it with `reqwest`: control-plane calls are signed with
//! [`RequestSigner`], chunk PUTs go to their capability URLs unsigned.

use crate::config::Config;
use crate::content_type::CONTENT_TYPE_BINARY;
use crate::error::UploadError;
use crate::key_manager::Credentials;
use crate::models::{CreateFileRequest, CreateFileResponse, FileIdRequest, StorageFile};
use crate::signer::RequestSigner;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, DATE, HOST};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const USER_AGENT: &str = concat!("werender-upload/", env!("CARGO_PKG_VERSION"));

pub const CREATE_FILE_PATH: &str = "/storage/file/create";
pub const GET_FILE_PATH: &str = "/storage/file/get";
pub const FINALIZE_FILE_PATH: &str = "/storage/file/finalize";

/// Longest response body excerpt carried in an error
const ERROR_BODY_LIMIT: usize = 512;

#[async_trait]
pub trait StorageApi: Send + Sync {
    async fn create_file(
        &self,
        request: &CreateFileRequest,
    ) -> Result<CreateFileResponse, UploadError>;

    async fn get_file(&self, id: &str) -> Result<StorageFile, UploadError>;

    async fn finalize_file(&self, id: &str) -> Result<StorageFile, UploadError>;

    /// PUT one chunk to its pre-authorized URL
    async fn upload_chunk(&self, index: usize, url: &str, data: Vec<u8>)
        -> Result<(), UploadError>;
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
    host: String,
    signer: RequestSigner,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self, UploadError> {
        let base_url = config.server_address.trim_end_matches('/').to_string();
        let url = Url::parse(&base_url).map_err(|e| {
            UploadError::config(format!("invalid server address {}: {}", base_url, e))
        })?;
        let host = url
            .host_str()
            .ok_or_else(|| {
                UploadError::config(format!("server address {} has no host", base_url))
            })?
            .to_string();

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::config(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            host,
            signer: RequestSigner::new(credentials),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn describe_send_error(&self, err: reqwest::Error) -> String {
        if err.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs())
        } else {
            err.to_string()
        }
    }

    /// POST a JSON body with signature headers and decode the JSON reply
    async fn post_signed<B, R>(
        &self,
        path: &str,
        body: &B,
        kind: fn(String) -> UploadError,
    ) -> Result<R, UploadError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let url = self.endpoint(path);
        let headers = self.signer.sign("POST", &self.host)?;
        debug!(url = %url, date = %headers.date, "sending signed request");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, &headers.authorization)
            .header(DATE, &headers.date)
            .header(HOST, &headers.host)
            .json(body)
            .send()
            .await
            .map_err(|e| kind(self.describe_send_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            warn!(url = %url, status = %status, "control-plane call rejected");
            return Err(kind(format!("{} returned {}: {}", path, status, excerpt)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| kind(format!("decoding {} response: {}", path, e)))
    }
}

#[async_trait]
impl StorageApi for HttpTransport {
    async fn create_file(
        &self,
        request: &CreateFileRequest,
    ) -> Result<CreateFileResponse, UploadError> {
        self.post_signed(CREATE_FILE_PATH, request, UploadError::CreateRequest)
            .await
    }

    async fn get_file(&self, id: &str) -> Result<StorageFile, UploadError> {
        let request = FileIdRequest { id: id.to_string() };
        self.post_signed(GET_FILE_PATH, &request, UploadError::GetRequest)
            .await
    }

    async fn finalize_file(&self, id: &str) -> Result<StorageFile, UploadError> {
        let request = FileIdRequest { id: id.to_string() };
        self.post_signed(FINALIZE_FILE_PATH, &request, UploadError::FinalizeRequest)
            .await
    }

    async fn upload_chunk(
        &self,
        index: usize,
        url: &str,
        data: Vec<u8>,
    ) -> Result<(), UploadError> {
        let size = data.len();
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, CONTENT_TYPE_BINARY)
            .body(data)
            .send()
            .await
            .map_err(|e| UploadError::chunk_upload(index, self.describe_send_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::chunk_upload(index, format!("HTTP {}", status)));
        }

        debug!(index, size, status = %status, "chunk accepted");
        Ok(())
    }
}
