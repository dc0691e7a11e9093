//! Logging setup for the certmgr binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events the default filter enables.
const LOG_TARGETS: [&str; 3] = ["certmgr", "certmgr_client", "certmgr_provider"];

/// Filter enabling every certmgr crate at `level`, e.g.
/// `certmgr=debug,certmgr_client=debug,certmgr_provider=debug`.
pub fn default_filter(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `default_filter` when set. Events are written to
/// stderr, as JSON lines when `log_json` is set, so stdout carries only
/// command output.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let json_layer = log_json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!log_json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
