//! certmgr REST client.
//!
//! Covers the staged-certificate endpoints (create, list, get, delete) and the
//! certificate update endpoint.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use certmgr_core::config::{ApiConfig, DEFAULT_TIMEOUT_SECS};
use certmgr_core::{Scheme, TransportKind};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::resolve::HostResolver;
use crate::transport::{Method, RawResponse, Transport};
use crate::types::{Certificate, CertificateRef, StagedList};

/// Configuration for connecting to a certmgr instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host alias of the API; resolved to its canonical name per call.
    pub host: String,
    /// API port; must lie in 1..=65535.
    pub port: i64,
    pub scheme: Scheme,
    pub transport: TransportKind,
    pub ptr_prefix: Option<String>,
    pub verbatim_host: bool,
    /// Timeout for the `Http` transport. `Curl` runs without one.
    pub timeout: Duration,
    pub curl_bin: PathBuf,
}

impl ClientConfig {
    /// Defaults: HTTPS through `curl --negotiate` with DNS resolution.
    pub fn new(host: impl Into<String>, port: i64) -> Self {
        Self::from_api(&ApiConfig::default(), host, port)
    }

    /// Take everything but host and port from loaded settings.
    pub fn from_api(api: &ApiConfig, host: impl Into<String>, port: i64) -> Self {
        Self {
            host: host.into(),
            port,
            scheme: api.scheme,
            transport: api.transport,
            ptr_prefix: api.ptr_prefix.clone(),
            verbatim_host: api.verbatim_host,
            timeout: Duration::from_secs(if api.timeout_secs == 0 {
                DEFAULT_TIMEOUT_SECS
            } else {
                api.timeout_secs
            }),
            curl_bin: api.curl_bin.clone(),
        }
    }
}

/// The operations the certificate resource needs from the API.
pub trait CertificateApi: Send + Sync {
    fn create_certificate(
        &self,
        hostname: &str,
    ) -> impl Future<Output = Result<Certificate, ClientError>> + Send;

    fn get_certificate(
        &self,
        key: &CertificateRef,
    ) -> impl Future<Output = Result<Certificate, ClientError>> + Send;

    fn update_certificate(
        &self,
        cert: &Certificate,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn delete_certificate(
        &self,
        key: &CertificateRef,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// certmgr API client.
#[derive(Debug)]
pub struct CertMgrClient {
    host: String,
    port: u16,
    scheme: Scheme,
    resolver: HostResolver,
    transport: Transport,
}

impl CertMgrClient {
    /// Create a new certmgr API client.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let host = config.host.trim();
        if host.is_empty() {
            return Err(ClientError::Configuration("host is empty".into()));
        }
        let port = validate_port(config.port)?;

        let resolver = if config.verbatim_host {
            HostResolver::Verbatim
        } else {
            HostResolver::system(config.ptr_prefix.clone())?
        };
        let transport = match config.transport {
            TransportKind::Http => Transport::http(config.timeout)?,
            TransportKind::Curl => Transport::curl(config.curl_bin.clone()),
        };

        Ok(Self::with_parts(host, port, config.scheme, resolver, transport))
    }

    /// Assemble a client from already-built parts.
    pub fn with_parts(
        host: impl Into<String>,
        port: u16,
        scheme: Scheme,
        resolver: HostResolver,
        transport: Transport,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            scheme,
            resolver,
            transport,
        }
    }

    /// Build the API URL for a given path on the resolved host.
    pub(crate) fn api_url(&self, fqdn: &str, path: &str) -> String {
        format!(
            "{}://{}:{}/krb/certmgr{}",
            self.scheme.as_str(),
            fqdn,
            self.port,
            path
        )
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, ClientError> {
        let fqdn = self.resolver.resolve(&self.host).await?;
        let raw = self.api_url(&fqdn, path);
        let url = if query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, query)
        }
        .map_err(|e| ClientError::Configuration(format!("invalid API URL {raw}: {e}")))?;

        let resp = self.transport.send(method, &url, body).await?;
        debug!(
            method = method.as_str(),
            status = resp.status,
            "certmgr responded"
        );
        Ok(resp)
    }

    /// Check response status, returning error for non-success codes.
    fn check_status(resp: &RawResponse) -> Result<(), ClientError> {
        if resp.is_success() {
            return Ok(());
        }
        let message = match resp.body.trim() {
            "" => reqwest::StatusCode::from_u16(resp.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown")
                .to_string(),
            body => body.to_string(),
        };
        Err(ClientError::Api {
            status: resp.status,
            message,
        })
    }

    fn decode<T: DeserializeOwned>(resp: &RawResponse) -> Result<T, ClientError> {
        Ok(serde_json::from_str(&resp.body)?)
    }

    // =========================================================================
    // Staged certificates
    // =========================================================================

    /// Stage a new certificate request for `hostname`.
    pub async fn create_certificate(&self, hostname: &str) -> Result<Certificate, ClientError> {
        let body = serde_json::json!({ "hostname": hostname });
        let resp = self.call(Method::Post, "/staged/", &[], Some(&body)).await?;
        Self::check_status(&resp)?;
        let cert: Certificate = Self::decode(&resp)?;
        info!(id = cert.id, hostname, "Staged certificate");
        Ok(cert)
    }

    /// List staged entries for `hostname`, oldest first.
    pub async fn list_staged(&self, hostname: &str) -> Result<Vec<Certificate>, ClientError> {
        let resp = self
            .call(Method::Get, "/staged/", &[("hostname", hostname)], None)
            .await?;
        Self::check_status(&resp)?;
        let list: StagedList = Self::decode(&resp)?;
        Ok(list.objects)
    }

    /// Look up a certificate by id or by hostname.
    ///
    /// By hostname, the most recently staged entry wins.
    pub async fn get_certificate(&self, key: &CertificateRef) -> Result<Certificate, ClientError> {
        match key {
            // Entries come back oldest first; the last one is the live request.
            CertificateRef::Hostname(hostname) => self
                .list_staged(hostname)
                .await?
                .pop()
                .ok_or_else(|| ClientError::NotFound(key.clone())),
            CertificateRef::Id(id) => {
                let resp = self
                    .call(Method::Get, &format!("/staged/{id}/"), &[], None)
                    .await?;
                if resp.status == 404 {
                    return Err(ClientError::NotFound(key.clone()));
                }
                Self::check_status(&resp)?;
                Self::decode(&resp)
            }
        }
    }

    /// Delete by id, or drain every staged entry for a hostname.
    ///
    /// A drain stops at the first failed delete; earlier deletes are not undone.
    pub async fn delete_certificate(&self, key: &CertificateRef) -> Result<(), ClientError> {
        match key {
            CertificateRef::Id(id) => self.delete_staged(*id).await,
            CertificateRef::Hostname(hostname) => {
                let staged = self.list_staged(hostname).await?;
                debug!(hostname, count = staged.len(), "Draining staged certificates");
                for cert in staged {
                    self.delete_staged(cert.id)
                        .await
                        .map_err(|e| ClientError::DeleteFailed {
                            id: cert.id,
                            source: Box::new(e),
                        })?;
                }
                Ok(())
            }
        }
    }

    async fn delete_staged(&self, id: u64) -> Result<(), ClientError> {
        let resp = self
            .call(Method::Delete, &format!("/staged/{id}/"), &[], None)
            .await?;
        if resp.status == 404 {
            warn!(id, "Staged certificate already deleted");
            return Ok(());
        }
        Self::check_status(&resp)?;
        info!(id, "Deleted staged certificate");
        Ok(())
    }

    // =========================================================================
    // Certificates
    // =========================================================================

    /// Replace the certificate record. Success is judged by status code only.
    pub async fn update_certificate(&self, cert: &Certificate) -> Result<(), ClientError> {
        let body = serde_json::to_value(cert)?;
        let resp = self
            .call(Method::Post, "/certificate/", &[], Some(&body))
            .await?;
        Self::check_status(&resp)?;
        info!(id = cert.id, hostname = %cert.hostname, "Updated certificate");
        Ok(())
    }
}

impl CertificateApi for CertMgrClient {
    fn create_certificate(
        &self,
        hostname: &str,
    ) -> impl Future<Output = Result<Certificate, ClientError>> + Send {
        Self::create_certificate(self, hostname)
    }

    fn get_certificate(
        &self,
        key: &CertificateRef,
    ) -> impl Future<Output = Result<Certificate, ClientError>> + Send {
        Self::get_certificate(self, key)
    }

    fn update_certificate(
        &self,
        cert: &Certificate,
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        Self::update_certificate(self, cert)
    }

    fn delete_certificate(
        &self,
        key: &CertificateRef,
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        Self::delete_certificate(self, key)
    }
}

pub(crate) fn validate_port(port: i64) -> Result<u16, ClientError> {
    u16::try_from(port)
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| ClientError::Configuration(format!("invalid port: {port}")))
}
