//! Seed sourcing for shuffles.
//!
//! The provider prefers the on-chain verifiable source and degrades to a
//! local CSPRNG when the chain is unconfigured, slow, or broken. Fetching a
//! seed never fails: availability wins over attestation strength.

use std::fmt;

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ChainSettings;

pub mod chain;

pub use chain::ChainRandomness;

const LOG_TARGET: &str = "randomness";

/// Provenance of a shuffle seed, recorded per deal for auditability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    OnChain,
    Local,
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedSource::OnChain => f.write_str("on_chain"),
            SeedSource::Local => f.write_str("local"),
        }
    }
}

/// A seed plus the metadata needed to attest where it came from.
#[derive(Clone, Debug)]
pub struct SeedOutcome {
    pub seed: [u8; 32],
    pub source: SeedSource,
    /// Chain request id (hex) when the seed was fulfilled on-chain.
    pub request_id: Option<String>,
}

/// Seam between the orchestrator and seed acquisition; tests inject
/// deterministic implementations.
#[async_trait]
pub trait SeedFetcher: Send + Sync {
    async fn get_random_seed(&self) -> SeedOutcome;
}

/// Production fetcher: probes chain configuration at call time, bounds the
/// on-chain attempt with a timeout, and falls back to [`OsRng`].
pub struct RandomnessProvider {
    chain: Option<ChainRandomness>,
    timeout: std::time::Duration,
}

impl RandomnessProvider {
    pub fn new(settings: &ChainSettings) -> Self {
        let chain = match ChainRandomness::from_settings(settings) {
            Ok(Some(client)) => {
                info!(target = LOG_TARGET, "on-chain randomness source configured");
                Some(client)
            }
            Ok(None) => {
                info!(
                    target = LOG_TARGET,
                    "no chain settings, shuffle seeds will be local"
                );
                None
            }
            Err(err) => {
                warn!(
                    target = LOG_TARGET,
                    error = %err,
                    "chain settings malformed, shuffle seeds will be local"
                );
                None
            }
        };

        Self {
            chain,
            timeout: settings.request_timeout,
        }
    }

    pub fn local_only() -> Self {
        Self::new(&ChainSettings::local_only())
    }

    fn local_seed() -> SeedOutcome {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        SeedOutcome {
            seed,
            source: SeedSource::Local,
            request_id: None,
        }
    }
}

#[async_trait]
impl SeedFetcher for RandomnessProvider {
    async fn get_random_seed(&self) -> SeedOutcome {
        if let Some(chain) = &self.chain {
            match tokio::time::timeout(self.timeout, chain.request_seed()).await {
                Ok(Ok((request_id, seed))) => {
                    info!(
                        target = LOG_TARGET,
                        request_id = %request_id,
                        "seed fulfilled on-chain"
                    );
                    return SeedOutcome {
                        seed,
                        source: SeedSource::OnChain,
                        request_id: Some(request_id),
                    };
                }
                Ok(Err(err)) => {
                    warn!(
                        target = LOG_TARGET,
                        error = %err,
                        "on-chain randomness failed, falling back to local seed"
                    );
                }
                Err(_) => {
                    warn!(
                        target = LOG_TARGET,
                        timeout_secs = self.timeout.as_secs_f32(),
                        "on-chain randomness timed out, falling back to local seed"
                    );
                }
            }
        }

        Self::local_seed()
    }
}
