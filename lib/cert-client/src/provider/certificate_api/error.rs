use thiserror::Error;

use crate::provider::http_client;

#[derive(Debug, Error)]
pub enum CertificateApiError {
    #[error("Invalid certificate endpoint URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error(transparent)]
    Transport(#[from] http_client::Error),
}

impl CertificateApiError {
    /// HTTP status of a rejected request, if the failure came from the service
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport(http_client::Error::StatusCodeIsError(status)) => Some(status.0),
            _ => None,
        }
    }
}
