//! # werender-upload - Chunked File Upload Client
//!
//! Uploads a single local file to the WeRender storage service over HTTPS.
//!
//! ## Features
//!
//! - **Content addressing**: SHA-1 checksum sent with the create request so
//!   the server can deduplicate
//! - **Signed control plane**: HMAC-SHA1 `Authorization: WR` headers on
//!   create/get/finalize calls
//! - **Server-planned chunks**: the file is streamed once, in the byte ranges
//!   the server assigns, to pre-authorized chunk URLs
//! - **Idempotent**: files the server already holds are not re-uploaded
//!
//! ## Quick Start
//!
//! ```no_run
//! use werender_upload::{config::Config, key_manager::Credentials};
//! use werender_upload::{transport::HttpTransport, upload::FileUploader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cfg = Config::load_with_env(None)?;
//!     let credentials = Credentials::load(&cfg.key_path).await?;
//!     let transport = HttpTransport::new(&cfg, credentials)?;
//!
//!     let file = FileUploader::new(&transport)
//!         .upload("./model.fbx", "/scenes")
//!         .await?;
//!     println!("uploaded {}", file.id);
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod config;
pub mod content_type;
pub mod error;
pub mod key_manager;
pub mod metadata;
pub mod models;
pub mod signer;
pub mod streaming;
pub mod transport;
pub mod upload;

// Re-export common types for convenience
pub use error::UploadError;
