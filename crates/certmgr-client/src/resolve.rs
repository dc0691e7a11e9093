//! Canonical service name resolution.
//!
//! The API is served under a canonical host name that differs from the
//! load-balanced alias operators configure, and Kerberos service tickets are
//! issued for the canonical name. Resolution takes the first IPv4 address of
//! the alias and uses its PTR record.

use std::fmt;
use std::net::IpAddr;

use hickory_resolver::TokioAsyncResolver;
use tracing::debug;

use crate::error::ClientError;

/// Maps the configured host to the name requests are sent to.
pub enum HostResolver {
    /// Forward lookup, then reverse lookup of the first IPv4 address.
    Dns {
        resolver: TokioAsyncResolver,
        ptr_prefix: Option<String>,
    },
    /// Use the configured host as given.
    Verbatim,
}

impl fmt::Debug for HostResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns { ptr_prefix, .. } => f
                .debug_struct("Dns")
                .field("ptr_prefix", ptr_prefix)
                .finish_non_exhaustive(),
            Self::Verbatim => f.write_str("Verbatim"),
        }
    }
}

impl HostResolver {
    /// DNS resolution using the system resolver configuration.
    pub fn system(ptr_prefix: Option<String>) -> Result<Self, ClientError> {
        let resolver =
            TokioAsyncResolver::tokio_from_system_conf().map_err(|e| ClientError::Resolution {
                host: "system resolver".into(),
                reason: e.to_string(),
            })?;
        Ok(Self::Dns {
            resolver,
            ptr_prefix,
        })
    }

    pub async fn resolve(&self, host: &str) -> Result<String, ClientError> {
        let (resolver, ptr_prefix) = match self {
            Self::Verbatim => return Ok(host.to_string()),
            Self::Dns {
                resolver,
                ptr_prefix,
            } => (resolver, ptr_prefix.as_deref()),
        };

        let failed = |reason: String| ClientError::Resolution {
            host: host.to_string(),
            reason,
        };

        let ips = resolver
            .lookup_ip(host)
            .await
            .map_err(|e| failed(format!("address lookup failed: {e}")))?;
        let ip = first_ipv4(ips.iter()).ok_or_else(|| failed("no IPv4 address found".into()))?;

        let ptrs = resolver
            .reverse_lookup(ip)
            .await
            .map_err(|e| failed(format!("reverse lookup failed for {ip}: {e}")))?;
        let names: Vec<String> = ptrs.iter().map(ToString::to_string).collect();

        let fqdn = canonical_name(&names, ptr_prefix).map_err(failed)?;
        debug!(host, %ip, %fqdn, "Resolved canonical service name");
        Ok(fqdn)
    }
}

pub(crate) fn first_ipv4(ips: impl IntoIterator<Item = IpAddr>) -> Option<IpAddr> {
    ips.into_iter().find(IpAddr::is_ipv4)
}

/// Pick the first PTR name, without its trailing dot, checking the prefix.
pub(crate) fn canonical_name(names: &[String], prefix: Option<&str>) -> Result<String, String> {
    let first = names.first().ok_or_else(|| "no PTR record found".to_string())?;
    let name = first.trim_end_matches('.');
    match prefix {
        Some(prefix) if !name.starts_with(prefix) => Err(format!(
            "PTR record {name:?} does not start with {prefix:?}"
        )),
        _ => Ok(name.to_string()),
    }
}
