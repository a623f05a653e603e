use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use uno_rooms::config::{
    ChainSettings, ServiceConfig, DEFAULT_BIND, DEFAULT_BROADCAST_CAPACITY,
    DEFAULT_SEED_TIMEOUT_SECS,
};
use uno_rooms::server::run_server;

#[derive(Debug, Parser)]
#[command(name = "uno_rooms_server")]
#[command(about = "Launch the UNO room orchestrator API server", long_about = None)]
struct Args {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// JSON-RPC endpoint of the chain node providing verifiable randomness
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// Address of the randomness contract (0x-prefixed, 20 bytes)
    #[arg(long, env = "CONTRACT_ADDRESS")]
    contract_address: Option<String>,

    /// Bound in seconds on an on-chain seed request before falling back
    #[arg(long, env = "SEED_TIMEOUT_SECS", default_value_t = DEFAULT_SEED_TIMEOUT_SECS)]
    seed_timeout_secs: u64,

    /// Per-room event channel capacity
    #[arg(long, env = "BROADCAST_CAPACITY", default_value_t = DEFAULT_BROADCAST_CAPACITY)]
    broadcast_capacity: usize,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(args.json);
    run_server(build_config(args)).await
}

fn load_dotenv() {
    let manifest_env_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }
}

fn build_config(args: Args) -> ServiceConfig {
    ServiceConfig {
        bind: args.bind,
        chain: ChainSettings {
            rpc_url: args.rpc_url,
            contract_address: args.contract_address,
            request_timeout: Duration::from_secs(args.seed_timeout_secs),
        },
        broadcast_capacity: args.broadcast_capacity,
    }
}
