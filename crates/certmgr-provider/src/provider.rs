//! Provider configuration.
//!
//! Turns the provider config block into a ready client. Host and port are
//! taken from the block first, then `CERTMGR_HOST` / `CERTMGR_PORT`, then the
//! settings file. Every problem found is reported before giving up, so an
//! operator sees a missing host and a missing port in one run.

use std::sync::Arc;

use certmgr_client::{CertMgrClient, ClientConfig};
use certmgr_core::ApiConfig;
use tracing::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::resource::CertificateResource;

pub const HOST_ENV: &str = "CERTMGR_HOST";
pub const PORT_ENV: &str = "CERTMGR_PORT";

/// A config attribute as the host framework hands it over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Value<T> {
    /// Depends on something not applied yet.
    Unknown,
    /// Not set.
    #[default]
    Null,
    Known(T),
}

impl<T> Value<T> {
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Known)
    }
}

/// The `provider "certmgr"` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderBlock {
    pub host: Value<String>,
    pub port: Value<i64>,
}

/// Builds clients and resources for one provider configuration.
#[derive(Debug, Clone)]
pub struct CertMgrProvider {
    version: String,
    settings: ApiConfig,
}

impl CertMgrProvider {
    pub const TYPE_NAME: &'static str = "certmgr";

    pub fn new(version: impl Into<String>, settings: ApiConfig) -> Self {
        Self {
            version: version.into(),
            settings,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Configure against the process environment.
    pub fn configure(&self, block: &ProviderBlock) -> Result<CertMgrClient, Diagnostics> {
        self.configure_with_env(block, |key| std::env::var(key).ok())
    }

    pub fn configure_with_env<F>(
        &self,
        block: &ProviderBlock,
        env: F,
    ) -> Result<CertMgrClient, Diagnostics>
    where
        F: Fn(&str) -> Option<String>,
    {
        info!(provider = Self::TYPE_NAME, version = %self.version, "Configuring certmgr client");

        let (host, port) = self.resolve_endpoint(block, env)?;
        debug!(certmgr_host = %host, certmgr_port = port, "Creating certmgr client");

        let config = ClientConfig::from_api(&self.settings, host, port);
        let client = CertMgrClient::new(&config).map_err(|e| {
            let mut diags = Diagnostics::new();
            diags.add_error(
                "Unable to create certmgr API client",
                format!(
                    "An unexpected error occurred when creating the certmgr API client.\n\n\
                     certmgr client error: {e}"
                ),
            );
            diags
        })?;

        info!(success = true, "Configured certmgr client");
        Ok(client)
    }

    /// Work out host and port, collecting every problem found.
    pub fn resolve_endpoint<F>(
        &self,
        block: &ProviderBlock,
        env: F,
    ) -> Result<(String, i64), Diagnostics>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut diags = Diagnostics::new();

        if block.host.is_unknown() {
            diags.add_attribute_error(
                "host",
                "Unknown certmgr API host",
                format!(
                    "The provider cannot create the certmgr API client as there is an unknown \
                     configuration value for the certmgr host. Either apply the source of the \
                     value first, set the value statically in the configuration, or use the \
                     {HOST_ENV} environment variable."
                ),
            );
        }
        if block.port.is_unknown() {
            diags.add_attribute_error(
                "port",
                "Unknown certmgr API port",
                format!(
                    "The provider cannot create the certmgr API client as there is an unknown \
                     configuration value for the certmgr port. Either apply the source of the \
                     value first, set the value statically in the configuration, or use the \
                     {PORT_ENV} environment variable."
                ),
            );
        }
        if diags.has_error() {
            return Err(diags);
        }

        let host = match &block.host {
            Value::Known(host) => Some(host.clone()),
            _ => env(HOST_ENV)
                .filter(|h| !h.is_empty())
                .or_else(|| self.settings.host.clone()),
        };

        let port = match block.port {
            Value::Known(port) => Some(port),
            _ => match env(PORT_ENV).filter(|p| !p.is_empty()) {
                Some(raw) => match raw.trim().parse::<i64>() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        diags.add_attribute_error(
                            "port",
                            "Invalid CERTMGR_PORT environment variable",
                            format!("{PORT_ENV} must be an integer, but got: {raw:?}"),
                        );
                        return Err(diags);
                    }
                },
                None => self.settings.port,
            },
        };

        let host = host.filter(|h| !h.trim().is_empty());
        // Port 0 means unset.
        let port = port.filter(|p| *p != 0);
        if host.is_none() {
            diags.add_attribute_error(
                "host",
                "Missing certmgr host",
                format!(
                    "Set the host value in the configuration or via the {HOST_ENV} environment \
                     variable."
                ),
            );
        }
        if port.is_none() {
            diags.add_attribute_error(
                "port",
                "Missing certmgr port",
                format!(
                    "Set the port value in the configuration or via the {PORT_ENV} environment \
                     variable."
                ),
            );
        }

        match (host, port) {
            (Some(host), Some(port)) => Ok((host, port)),
            _ => Err(diags),
        }
    }

    /// A certificate resource sharing `client`.
    pub fn certificate_resource(
        &self,
        client: Arc<CertMgrClient>,
    ) -> CertificateResource<CertMgrClient> {
        CertificateResource::new(client, self.settings.delete_by)
    }
}
