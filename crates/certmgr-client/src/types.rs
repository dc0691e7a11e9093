//! certmgr wire types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A certificate record as returned by the staged and certificate endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: u64,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requestor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Body of `GET /krb/certmgr/staged/?hostname=...`. The `meta` block is ignored.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StagedList {
    #[serde(default)]
    pub objects: Vec<Certificate>,
}

/// The two keys a certificate can be looked up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateRef {
    Id(u64),
    Hostname(String),
}

impl fmt::Display for CertificateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Hostname(hostname) => write!(f, "hostname {hostname}"),
        }
    }
}

impl From<u64> for CertificateRef {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for CertificateRef {
    fn from(hostname: &str) -> Self {
        Self::Hostname(hostname.to_string())
    }
}
