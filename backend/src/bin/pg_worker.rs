//! Privilege-dropping helper for the embedded PostgreSQL test clusters.
//!
//! `pg-embed-setup-unpriv` re-executes this binary as an unprivileged user
//! when the integration suites run as root:
//!
//! ```text
//! pg-worker <setup|start|stop> <payload.json>
//! ```
//!
//! The payload is a serialised `WorkerPayload`: the PostgreSQL settings plus
//! environment overrides to apply before the operation runs.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Report, Result};
use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
use postgresql_embedded::PostgreSQL;
use tokio::runtime::Builder;

/// Command line accepted from the cluster bootstrapper.
#[derive(Debug, Parser)]
#[command(name = "pg-worker", about = "Run one embedded PostgreSQL lifecycle step")]
struct WorkerArgs {
    /// Lifecycle step to run.
    #[arg(value_enum)]
    operation: Operation,
    /// JSON payload written by the bootstrapper.
    payload: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Operation {
    Setup,
    Start,
    Stop,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = WorkerArgs::parse();
    let payload = load_payload(&args.payload)?;
    run(args.operation, payload)
}

fn load_payload(path: &Path) -> Result<WorkerPayload> {
    let raw = fs::read(path)
        .with_context(|| format!("failed to read worker payload at {}", path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse worker payload at {}", path.display()))
}

fn run(operation: Operation, payload: WorkerPayload) -> Result<()> {
    let settings = payload
        .settings
        .into_settings()
        .map_err(|err| Report::new(err).wrap_err("failed to rebuild postgres settings"))?;
    apply_environment(payload.environment);

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build worker runtime")?;
    let mut postgres = PostgreSQL::new(settings);
    runtime
        .block_on(async {
            match operation {
                Operation::Setup => postgres.setup().await,
                Operation::Start => postgres.start().await,
                Operation::Stop => postgres.stop().await,
            }
        })
        .with_context(|| format!("postgres {} failed", operation.as_str()))
}

fn apply_environment(overrides: Vec<(String, Option<PlainSecret>)>) {
    for (key, value) in overrides {
        // SAFETY: the worker is single-threaded until the runtime is built.
        match value {
            Some(value) => unsafe { env::set_var(&key, value.expose()) },
            None => unsafe { env::remove_var(&key) },
        }
    }
}
