//! certmgr API client.
//!
//! Wraps the staged-certificate endpoints under `/krb/certmgr/` behind a
//! typed client. Every call first resolves the configured host to the
//! canonical service name (forward lookup, then PTR), then goes out either
//! through an in-process reqwest client or through `curl --negotiate`, which
//! takes care of the Kerberos handshake.

mod client;
mod error;
pub mod resolve;
pub mod transport;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::{CertMgrClient, CertificateApi, ClientConfig};
pub use error::ClientError;
pub use resolve::HostResolver;
pub use transport::{Method, Transport};
pub use types::{Certificate, CertificateRef};
