//! certmgr provider
//!
//! Exposes certmgr certificates as declarative resources:
//! - Provider configuration (config block, environment fallback, client construction)
//! - The `certmgr_certificate` resource with create/read/update/delete/import
//! - Diagnostics returned to the host framework
//! - A JSON state file for the operator CLI

pub mod diagnostics;
pub mod provider;
pub mod resource;
pub mod state;
pub mod store;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use provider::{CertMgrProvider, ProviderBlock, Value};
pub use resource::{CertificateResource, ReadOutcome};
pub use state::{CertificatePlan, CertificateState};
pub use store::StateFile;
