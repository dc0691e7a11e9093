//! The `certmgr_certificate` resource.
//!
//! Translates between tracked resource state and certmgr client calls. Each
//! operation is one straight pass: no intermediate states are recorded and a
//! failed call leaves the caller's state untouched.

use std::sync::Arc;

use certmgr_client::{CertificateApi, CertificateRef};
use certmgr_core::DeleteBy;
use tracing::{info, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::state::{CertificatePlan, CertificateState};

/// Resource type name as seen by the host framework.
pub const TYPE_NAME: &str = "certmgr_certificate";

/// Result of refreshing a tracked certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Present(CertificateState),
    /// The certificate no longer exists upstream; drop it from state.
    Gone,
}

/// Lifecycle controller for certificates, bound to one client.
#[derive(Debug)]
pub struct CertificateResource<C> {
    client: Arc<C>,
    delete_by: DeleteBy,
}

impl<C: CertificateApi> CertificateResource<C> {
    pub const fn new(client: Arc<C>, delete_by: DeleteBy) -> Self {
        Self { client, delete_by }
    }

    pub async fn create(&self, hostname: &str) -> Result<CertificateState, Diagnostics> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(Diagnostic::attribute_error(
                "hostname",
                "Missing hostname",
                "A certificate needs the hostname it is issued for.",
            )
            .into());
        }

        let cert = self
            .client
            .create_certificate(hostname)
            .await
            .map_err(|e| {
                Diagnostic::error(
                    "Error creating certificate",
                    format!("Could not create certificate: {e}"),
                )
            })?;

        info!(resource = TYPE_NAME, id = cert.id, hostname, "Created certificate");
        Ok(CertificateState::observed(&cert))
    }

    pub async fn read(&self, state: &CertificateState) -> Result<ReadOutcome, Diagnostics> {
        let key = state.lookup_key().ok_or_else(|| {
            Diagnostic::error(
                "Error reading certificate",
                "Tracked state carries neither a hostname nor an id.",
            )
        })?;

        match self.client.get_certificate(&key).await {
            Ok(cert) => Ok(ReadOutcome::Present(CertificateState::observed(&cert))),
            Err(e) if e.is_not_found() => {
                warn!(resource = TYPE_NAME, %key, "Certificate no longer exists, removing from state");
                Ok(ReadOutcome::Gone)
            }
            Err(e) => Err(Diagnostic::error(
                "Error reading certificate",
                format!("Could not read certificate for {key}: {e}"),
            )
            .into()),
        }
    }

    /// Apply `plan` on top of the current server record.
    ///
    /// The hostname is the certificate's identity and cannot change in place.
    pub async fn update(
        &self,
        prior: &CertificateState,
        plan: &CertificatePlan,
    ) -> Result<CertificateState, Diagnostics> {
        if let Some(current) = prior.hostname.as_deref() {
            if current != plan.hostname {
                return Err(Diagnostic::attribute_error(
                    "hostname",
                    "Hostname cannot change",
                    format!(
                        "Certificate is issued for {current}; replace the resource to move it to {}.",
                        plan.hostname
                    ),
                )
                .into());
            }
        }

        let key = CertificateRef::Hostname(plan.hostname.clone());
        let mut cert = self.client.get_certificate(&key).await.map_err(|e| {
            Diagnostic::error(
                "Error fetching certificate",
                format!("Could not fetch certificate for update: {e}"),
            )
        })?;

        if let Some(requestor) = &plan.requestor {
            cert.requestor = Some(requestor.clone());
        }

        self.client.update_certificate(&cert).await.map_err(|e| {
            Diagnostic::error(
                "Error updating certificate",
                format!("Could not update certificate: {e}"),
            )
        })?;

        info!(resource = TYPE_NAME, id = cert.id, hostname = %cert.hostname, "Updated certificate");
        Ok(CertificateState::observed(&cert))
    }

    pub async fn delete(&self, state: &CertificateState) -> Result<(), Diagnostics> {
        let by_id = state.id.map(CertificateRef::Id);
        let by_hostname = state.hostname.clone().map(CertificateRef::Hostname);
        let key = match self.delete_by {
            DeleteBy::Id => by_id.or(by_hostname),
            DeleteBy::Hostname => by_hostname.or(by_id),
        }
        .ok_or_else(|| {
            Diagnostic::error(
                "Error deleting certificate",
                "Tracked state carries neither a hostname nor an id.",
            )
        })?;

        match self.client.delete_certificate(&key).await {
            Ok(()) => {
                info!(resource = TYPE_NAME, %key, "Deleted certificate");
                Ok(())
            }
            Err(e) => Err(Diagnostic::error(
                "Error deleting certificate",
                format!("Could not delete certificate for {key}: {e}"),
            )
            .into()),
        }
    }

    /// Start tracking an existing certificate by id. A read fills in the rest.
    pub fn import(id: &str) -> Result<CertificateState, Diagnostics> {
        let id = id.trim().parse::<u64>().map_err(|_| {
            Diagnostic::attribute_error(
                "id",
                "Invalid import identifier",
                format!("Expected a numeric certificate id, got {id:?}."),
            )
        })?;
        Ok(CertificateState {
            id: Some(id),
            ..CertificateState::default()
        })
    }
}
