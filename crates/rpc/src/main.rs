#![forbid(unsafe_code)]

mod entry;
mod handlers;
mod server;
mod support;

pub(crate) use support::*;

use sb_core::pipeline::PendingStageChange;
use sb_storage::{ProspectRow, Scope, SqliteStore};
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

const SERVER_NAME: &str = "salesboard-rpc";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Open demo confirmations kept at once; the oldest is dropped beyond this.
const MAX_PENDING_DEMOS: usize = 32;

/// A gated stage change waiting for `prospects.confirm_demo` or `prospects.cancel_demo`.
/// Only its own organization can resolve it.
pub(crate) struct PendingDemo {
    scope: Scope,
    change: PendingStageChange<ProspectRow>,
}

pub(crate) struct RpcServer {
    store: SqliteStore,
    default_scope: Scope,
    window_days: usize,
    /// Keyed by the sequence number inside the `demo-N` token.
    pending: BTreeMap<u64, PendingDemo>,
    pending_seq: u64,
}

pub(crate) struct RpcServerConfig {
    default_scope: Scope,
    window_days: usize,
}

fn usage() -> &'static str {
    "sb_rpc - salesboard JSON-RPC server (newline-delimited JSON over stdio)\n\n\
USAGE:\n\
  sb_rpc [--storage-dir DIR] [--org SLUG] [--user NAME] [--window-days N]\n\
\n\
FLAGS:\n\
  -h, --help       Print this help and exit\n\
  -V, --version    Print version and exit\n\
\n\
ENVIRONMENT:\n\
  SALESBOARD_STORAGE_DIR, SALESBOARD_ORG, SALESBOARD_USER, SALESBOARD_WINDOW_DAYS\n\
  RUST_LOG (logs go to stderr; default sb_rpc=info)\n"
}

fn version_line() -> String {
    format!("sb_rpc {SERVER_VERSION} schema={}", sb_storage::SCHEMA_VERSION)
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sb_rpc=info".parse()?))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print!("{}", usage());
        return Ok(());
    }
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        println!("{}", version_line());
        return Ok(());
    }

    init_tracing()?;
    let config = RuntimeConfig::from_args(&args, |key| std::env::var(key).ok())?;
    let store = SqliteStore::open(&config.storage_dir)?;
    tracing::info!(
        storage_dir = %config.storage_dir.display(),
        organization = config.organization.as_str(),
        user = config.user.as_str(),
        "{SERVER_NAME} ready"
    );

    let mut server = RpcServer::new(
        store,
        RpcServerConfig {
            default_scope: Scope::new(config.organization, config.user),
            window_days: config.window_days,
        },
    );
    let result = entry::run_stdio(&mut server);
    if let Err(err) = &result {
        tracing::error!(error = %err, "server loop stopped");
    }
    result
}
