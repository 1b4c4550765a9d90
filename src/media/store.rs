use async_trait::async_trait;
use thiserror::Error;

use super::image::{ImageRef, UploadFile};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media store is not configured")]
    NotConfigured,

    #[error("media store transport error: {0}")]
    Transport(String),

    #[error("media store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected media store response: {0}")]
    InvalidResponse(String),

    #[error("invalid file: {0}")]
    InvalidFile(String),
}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        MediaError::Transport(err.to_string())
    }
}

/// Remote object store holding uploaded images.
///
/// `delete` is idempotent: removing an id the store no longer knows is `Ok`.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, folder: &str, file: &UploadFile) -> Result<ImageRef, MediaError>;

    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}
