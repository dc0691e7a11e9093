use thiserror::Error;

use crate::types::CertificateRef;

/// certmgr client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to resolve {host}: {reason}")]
    Resolution { host: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("certmgr API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("curl failed: {0}")]
    Subprocess(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No certificates found for {0}")]
    NotFound(CertificateRef),

    /// A hostname drain stopped at `id`; entries deleted before it stay deleted.
    #[error("Delete failed for certificate {id}: {source}")]
    DeleteFailed {
        id: u64,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Network, HTTP status or subprocess failure.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(_) | Self::Api { .. } | Self::Subprocess(_) => true,
            Self::DeleteFailed { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}
