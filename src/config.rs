//! Service configuration, sourced from the environment.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

const LOG_TARGET: &str = "config";

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_SEED_TIMEOUT_SECS: u64 = 4;
pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Settings for the on-chain randomness source.
///
/// Absence (or malformedness) of either field is a normal condition: the
/// provider probes these at call time and falls back to the local generator.
#[derive(Debug, Clone, Default)]
pub struct ChainSettings {
    /// JSON-RPC endpoint of the chain node.
    pub rpc_url: Option<String>,
    /// Address of the verifiable-randomness contract.
    pub contract_address: Option<String>,
    /// Bound on the whole on-chain attempt before falling back.
    pub request_timeout: Duration,
}

impl ChainSettings {
    /// Reads `RPC_URL`, `CONTRACT_ADDRESS` and `SEED_TIMEOUT_SECS`. Missing
    /// variables leave the chain path unconfigured rather than failing.
    pub fn from_env() -> Self {
        let request_timeout = match env::var("SEED_TIMEOUT_SECS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    warn!(
                        target = LOG_TARGET,
                        value = %raw,
                        "SEED_TIMEOUT_SECS is not a number, using default"
                    );
                    Duration::from_secs(DEFAULT_SEED_TIMEOUT_SECS)
                }
            },
            Err(_) => Duration::from_secs(DEFAULT_SEED_TIMEOUT_SECS),
        };

        Self {
            rpc_url: env::var("RPC_URL").ok(),
            contract_address: env::var("CONTRACT_ADDRESS").ok(),
            request_timeout,
        }
    }

    /// Settings with the chain path disabled; every seed comes from the
    /// local generator.
    pub fn local_only() -> Self {
        Self {
            rpc_url: None,
            contract_address: None,
            request_timeout: Duration::from_secs(DEFAULT_SEED_TIMEOUT_SECS),
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub chain: ChainSettings,
    pub broadcast_capacity: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let bind = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse()
            .context("BIND_ADDR is not a valid socket address")?;

        Ok(Self {
            bind,
            chain: ChainSettings::from_env(),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        })
    }
}
