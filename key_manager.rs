//! API credential loading.
//!
//! This module provides [`Credentials`], the public/private key pair used to
//! sign control-plane requests, loaded from the `werender.key` file.
//!
//! ## Key File Format
//!
//! ```text
//! <public key>,<private key>
//! ```
//!
//! Surrounding whitespace (including a trailing newline) is ignored.
//! The private key is zeroized when the credentials are dropped.

use crate::error::UploadError;
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};
use zeroize::Zeroizing;

pub struct Credentials {
    public_key: String,
    private_key: Zeroizing<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: Zeroizing::new(private_key.into()),
        }
    }

    /// Parse `"<public>,<private>"`
    pub fn parse(content: &str) -> Result<Self, UploadError> {
        let (public_key, private_key) = content
            .split_once(',')
            .ok_or_else(|| UploadError::config("key file must contain '<public>,<private>'"))?;

        let public_key = public_key.trim();
        let private_key = private_key.trim();
        if public_key.is_empty() || private_key.is_empty() {
            return Err(UploadError::config(
                "key file has an empty public or private key",
            ));
        }

        Ok(Self::new(public_key, private_key))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading API credentials");

        let content = Zeroizing::new(fs::read_to_string(path).await.map_err(|e| {
            UploadError::config(format!("reading key from {}: {}", path.display(), e))
        })?);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            if let Ok(meta) = fs::metadata(path).await {
                let mode = meta.permissions().mode();
                if mode & 0o077 != 0 {
                    let octal = format!("{:o}", mode & 0o777);
                    warn!(
                        path = %path.display(),
                        mode = %octal,
                        "key file is accessible by other users - consider chmod 600"
                    );
                }
            }
        }

        Self::parse(&content)
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }
}
