//! `certmgr` CLI
//!
//! Drives one `certmgr_certificate` resource tracked in a JSON state file.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use certmgr_client::CertMgrClient;
use certmgr_core::TransportKind;
use certmgr_core::config::load_config;
use certmgr_core::tracing_init::{default_filter, init_tracing};
use certmgr_provider::resource::TYPE_NAME;
use certmgr_provider::{
    CertMgrProvider, CertificatePlan, CertificateResource, CertificateState, ProviderBlock,
    ReadOutcome, StateFile,
};

#[derive(Parser, Debug)]
#[command(name = "certmgr")]
#[command(version, about = "Manage certmgr certificates")]
struct Args {
    /// certmgr API host
    #[arg(long)]
    host: Option<String>,

    /// certmgr API port
    #[arg(long, allow_negative_numbers = true)]
    port: Option<i64>,

    /// State file tracking the certificate
    #[arg(long, default_value = "certificate.json")]
    state: PathBuf,

    /// Settings file (defaults to the per-user settings file)
    #[arg(long, env = "CERTMGR_CONFIG")]
    config: Option<PathBuf>,

    /// Request transport: http or curl
    #[arg(long)]
    transport: Option<String>,

    /// Log level filter (e.g. "info", "debug", "warn").
    #[arg(long, env = "CERTMGR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output logs as JSON.
    #[arg(long, env = "CERTMGR_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request a new certificate for a host.
    Create {
        /// Host the certificate is issued for.
        hostname: String,
    },
    /// Refresh the tracked certificate.
    Read,
    /// Change the tracked certificate's requestor.
    Update {
        #[arg(long)]
        requestor: Option<String>,
    },
    /// Delete the tracked certificate.
    Delete,
    /// Start tracking an existing certificate by id.
    Import {
        /// Numeric certificate id.
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(transport) = &args.transport {
        config.api.transport = transport.parse::<TransportKind>()?;
    }

    let level = args.log_level.as_deref().unwrap_or(&config.log_level);
    init_tracing(&default_filter(level), args.log_json);

    let store = StateFile::new(&args.state);
    let provider = CertMgrProvider::new(env!("CARGO_PKG_VERSION"), config.api);
    let block = ProviderBlock {
        host: args.host.into(),
        port: args.port.into(),
    };
    let connect = || -> anyhow::Result<CertificateResource<CertMgrClient>> {
        let client = provider.configure(&block)?;
        Ok(provider.certificate_resource(Arc::new(client)))
    };

    match args.command {
        Command::Create { hostname } => {
            untracked(&store)?;
            let state = connect()?.create(&hostname).await?;
            store.save(&state)?;
            print_state(&state)
        }
        Command::Read => {
            let state = tracked(&store)?;
            match connect()?.read(&state).await? {
                ReadOutcome::Present(state) => {
                    store.save(&state)?;
                    print_state(&state)
                }
                ReadOutcome::Gone => {
                    store.remove()?;
                    writeln!(
                        io::stdout(),
                        "Certificate no longer exists; stopped tracking it."
                    )?;
                    Ok(())
                }
            }
        }
        Command::Update { requestor } => {
            let prior = tracked(&store)?;
            let hostname = prior
                .hostname
                .clone()
                .context("Tracked state has no hostname yet; run `certmgr read` first")?;
            let plan = CertificatePlan {
                hostname,
                requestor,
            };
            let state = connect()?.update(&prior, &plan).await?;
            store.save(&state)?;
            print_state(&state)
        }
        Command::Delete => {
            let state = tracked(&store)?;
            connect()?.delete(&state).await?;
            store.remove()?;
            writeln!(io::stdout(), "Certificate deleted.")?;
            Ok(())
        }
        Command::Import { id } => {
            untracked(&store)?;
            let state = CertificateResource::<CertMgrClient>::import(&id)?;
            store.save(&state)?;
            info!(resource = TYPE_NAME, path = %store.path().display(), "Imported certificate");
            print_state(&state)
        }
    }
}

fn untracked(store: &StateFile) -> anyhow::Result<()> {
    if store.load()?.is_some() {
        bail!(
            "{} already tracks a certificate; delete it first",
            store.path().display()
        );
    }
    Ok(())
}

fn tracked(store: &StateFile) -> anyhow::Result<CertificateState> {
    store
        .load()?
        .with_context(|| format!("No certificate tracked in {}", store.path().display()))
}

fn print_state(state: &CertificateState) -> anyhow::Result<()> {
    let mut out = io::stdout();
    writeln!(out, "{}", serde_json::to_string_pretty(state)?)?;
    Ok(())
}
