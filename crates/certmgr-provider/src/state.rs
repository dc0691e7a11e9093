//! Resource state and plan records.

use certmgr_client::{Certificate, CertificateRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// RFC 850 layout used for `last_updated`.
pub const LAST_UPDATED_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S UTC";

/// Tracked state of one `certmgr_certificate` resource.
///
/// `id` is absent until create; `hostname` is absent right after an import
/// until the first read fills it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateState {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub requestor: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    /// When this provider last wrote the record. Informational only.
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl CertificateState {
    /// Mirror a server record, stamped with the current time.
    pub fn observed(cert: &Certificate) -> Self {
        Self::observed_at(cert, Utc::now())
    }

    pub fn observed_at(cert: &Certificate, now: DateTime<Utc>) -> Self {
        Self {
            id: Some(cert.id),
            hostname: Some(cert.hostname.clone()),
            requestor: cert.requestor.clone(),
            start: cert.start.clone(),
            end: cert.end.clone(),
            last_updated: Some(now.format(LAST_UPDATED_FORMAT).to_string()),
        }
    }

    /// Key for reading the certificate back: hostname while known, else id.
    pub fn lookup_key(&self) -> Option<CertificateRef> {
        self.hostname
            .clone()
            .map(CertificateRef::Hostname)
            .or_else(|| self.id.map(CertificateRef::Id))
    }
}

/// Desired configuration of a certificate resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePlan {
    pub hostname: String,
    #[serde(default)]
    pub requestor: Option<String>,
}
