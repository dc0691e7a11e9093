//! `certmgr` Core Library
//!
//! Shared functionality for the certmgr client and provider:
//! - Settings file resolution with environment overrides
//! - Tracing initialisation
//! - Common error types

pub mod config;
pub mod error;
pub mod tracing_init;

pub use config::{ApiConfig, Config, DeleteBy, Scheme, TransportKind};
pub use error::{Error, Result};
