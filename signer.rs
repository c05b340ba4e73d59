//! HMAC request signing for control-plane calls.
//!
//! Each request is signed over `"<method>\n<host>\n<date>"` with HMAC-SHA1
//! keyed by the private key. The resulting headers are:
//!
//! ```text
//! Authorization: WR <public key>:<base64 signature>
//! Date: <date>
//! Host: <host>
//! ```
//!
//! The date is captured once per request and used for both the signature and
//! the `Date` header, so the two can never straddle a second boundary.

use crate::error::UploadError;
use crate::key_manager::Credentials;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

pub const AUTH_SCHEME: &str = "WR";

/// RFC 1123 date as sent in the `Date` header
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Headers to attach to one outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub date: String,
    pub host: String,
}

pub struct RequestSigner {
    credentials: Credentials,
}

impl RequestSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn public_key(&self) -> &str {
        self.credentials.public_key()
    }

    /// Sign using the current time
    pub fn sign(&self, method: &str, host: &str) -> Result<SignedHeaders, UploadError> {
        self.sign_at(method, host, Utc::now())
    }

    pub fn sign_at(
        &self,
        method: &str,
        host: &str,
        at: DateTime<Utc>,
    ) -> Result<SignedHeaders, UploadError> {
        let date = format_date(at);
        let signature = signature(method, host, &date, self.credentials.private_key())?;

        Ok(SignedHeaders {
            authorization: format!(
                "{} {}:{}",
                AUTH_SCHEME,
                self.credentials.public_key(),
                signature
            ),
            date,
            host: host.to_string(),
        })
    }
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Base64 HMAC-SHA1 over `"<method>\n<host>\n<date>"`
pub fn signature(
    method: &str,
    host: &str,
    date: &str,
    private_key: &str,
) -> Result<String, UploadError> {
    if private_key.is_empty() {
        return Err(UploadError::signing("private key is empty"));
    }

    let mut mac = HmacSha1::new_from_slice(private_key.as_bytes())
        .map_err(|e| UploadError::signing(e.to_string()))?;
    mac.update(format!("{}\n{}\n{}", method, host, date).as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
