//! Google Workspace clients: Sheets, Gmail and Docs
//!
//! Each API is a trait with a blocking HTTP implementation and an in-memory
//! mock. Callers get a failure surfaced as [`GoogleError`]; nothing retries.

pub mod auth;
pub mod backup;
pub mod docs;
pub mod gmail;
pub mod mock;
pub mod sheets;

use thiserror::Error;

use crate::core::local_storage::LocalStorageError;
use crate::core::store::StoreError;

pub use auth::GoogleAuth;
pub use docs::{CreatedDoc, DocsApi, HttpDocs};
pub use gmail::{Attachment, EmailMessage, GmailApi, HttpGmail, SentMessage};
pub use sheets::{CreatedSpreadsheet, HttpSheets, MergeStrategy, SheetsApi};

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Google is not configured: {0}")]
    NotConfigured(String),

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("inventory left unchanged: {0}")]
    ReplaceRefused(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    LocalStorage(#[from] LocalStorageError),
}

/// Map a non-success response to [`GoogleError::Api`], keeping the body text
pub(crate) fn check_response(
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, GoogleError> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GoogleError::Auth(
            "access token rejected; refresh it or set MURP_GOOGLE_TOKEN".to_string(),
        ));
    }
    if !status.is_success() {
        return Err(GoogleError::Api {
            status: status.as_u16(),
            message: resp.text().unwrap_or_default(),
        });
    }
    Ok(resp)
}

pub(crate) fn http_client() -> Result<reqwest::blocking::Client, GoogleError> {
    Ok(reqwest::blocking::Client::builder()
        .user_agent(concat!("murp/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}
