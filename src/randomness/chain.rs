//! JSON-RPC client for the on-chain verifiable-randomness contract.
//!
//! Speaks the contract's two-function ABI: `requestRandomWords()` yields a
//! request id, `getRandomWords(uint256)` yields the fulfilled 256-bit word
//! (zero while unfulfilled). Both are issued as `eth_call`s so the gameplay
//! path never waits on transaction inclusion.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};
use url::Url;

use crate::config::ChainSettings;

const LOG_TARGET: &str = "randomness::chain";

const REQUEST_SIGNATURE: &str = "requestRandomWords()";
const FETCH_SIGNATURE: &str = "getRandomWords(uint256)";

pub struct ChainRandomness {
    client: reqwest::Client,
    endpoint: Url,
    contract: String,
}

impl ChainRandomness {
    /// Builds a client when both settings are present and well-formed.
    /// Returns `Ok(None)` when the chain path is simply unconfigured, and an
    /// error describing the malformed field otherwise; the provider treats
    /// both as reasons to stay on the local path.
    pub fn from_settings(settings: &ChainSettings) -> Result<Option<Self>> {
        let (Some(rpc_url), Some(address)) =
            (settings.rpc_url.as_deref(), settings.contract_address.as_deref())
        else {
            return Ok(None);
        };

        let endpoint = Url::parse(rpc_url).context("RPC_URL is not a valid URL")?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            bail!("RPC_URL must be http(s), got {}", endpoint.scheme());
        }
        let contract = normalize_address(address)?;

        Ok(Some(Self {
            client: reqwest::Client::new(),
            endpoint,
            contract,
        }))
    }

    /// One full randomness round trip: obtain a request id, then the word it
    /// resolves to. The returned id is kept for the audit trail.
    pub async fn request_seed(&self) -> Result<(String, [u8; 32])> {
        let request_id = self
            .eth_call(&calldata(REQUEST_SIGNATURE, None))
            .await
            .context("requestRandomWords call failed")?;

        let request_hex = format!("0x{}", hex::encode(request_id));
        tracing::debug!(
            target = LOG_TARGET,
            request_id = %request_hex,
            "randomness request acknowledged"
        );

        let word = self
            .eth_call(&calldata(FETCH_SIGNATURE, Some(request_id)))
            .await
            .context("getRandomWords call failed")?;
        if word == [0u8; 32] {
            bail!("randomness request not yet fulfilled");
        }

        Ok((request_hex, word))
    }

    async fn eth_call(&self, data: &str) -> Result<[u8; 32]> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{ "to": self.contract, "data": data }, "latest"],
        });

        let response: Value = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .context("eth_call request failed")?
            .error_for_status()
            .context("eth_call returned an error status")?
            .json()
            .await
            .context("eth_call response was not JSON")?;

        if let Some(err) = response.get("error") {
            bail!("eth_call rejected: {err}");
        }
        let result = response
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("eth_call response missing result"))?;
        decode_word(result)
    }
}

fn normalize_address(address: &str) -> Result<String> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    let bytes = hex::decode(stripped).context("contract address is not hex")?;
    if bytes.len() != 20 {
        bail!(
            "contract address must be 20 bytes, got {}",
            bytes.len()
        );
    }
    Ok(format!("0x{}", hex::encode(bytes)))
}

fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

fn calldata(signature: &str, arg: Option<[u8; 32]>) -> String {
    let mut data = selector(signature).to_vec();
    if let Some(word) = arg {
        data.extend_from_slice(&word);
    }
    format!("0x{}", hex::encode(data))
}

fn decode_word(result: &str) -> Result<[u8; 32]> {
    let stripped = result.strip_prefix("0x").unwrap_or(result);
    let bytes = hex::decode(stripped).context("eth_call result is not hex")?;
    if bytes.len() < 32 {
        bail!("eth_call result too short: {} bytes", bytes.len());
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes[..32]);
    Ok(word)
}
