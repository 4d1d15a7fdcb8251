//! Per-item failures reported back to callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable failure category carried in error records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Fetch,
    Decode,
    Inference,
}

/// Failure while processing one text or image of a request.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("request to {url} failed: {cause}")]
    Fetch { url: String, cause: String },

    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("embedding failed: {0}")]
    Inference(String),
}

impl ItemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ItemError::Fetch { .. } => ErrorKind::Fetch,
            ItemError::Decode(_) => ErrorKind::Decode,
            ItemError::Inference(_) => ErrorKind::Inference,
        }
    }

    /// Message placed in the `error` field of a classification record.
    pub fn describe(&self, subject: &str) -> String {
        format!("Failed to process {}: {}", subject, self)
    }
}

impl From<anyhow::Error> for ItemError {
    fn from(err: anyhow::Error) -> Self {
        ItemError::Inference(format!("{:#}", err))
    }
}
