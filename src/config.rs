// src/config.rs
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::utils::MAX_DECIMALS;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Chain and token constants the dashboard is built against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub chain_id: u64,
    pub chain_name: String,
    pub coin_symbol: String,
    pub token_symbol: String,
    #[serde(default = "default_decimals")]
    pub coin_decimals: u8,
    #[serde(default = "default_decimals")]
    pub price_decimals: u8,
    #[serde(default = "default_coingecko_id")]
    pub coingecko_id: String,
}

fn default_decimals() -> u8 {
    18
}

fn default_coingecko_id() -> String {
    "tezos".to_string()
}

pub fn read_deployment() -> Result<Deployment, ConfigError> {
    parse_deployment(include_str!("../config/deployment.json"))
}

pub fn parse_deployment(content: &str) -> Result<Deployment, ConfigError> {
    let deployment: Deployment =
        serde_json::from_str(content).map_err(|err| ConfigError::Deployment(err.to_string()))?;
    if deployment.chain_id == 0 {
        return Err(ConfigError::Deployment("chain_id must be non-zero".to_string()));
    }
    for decimals in [deployment.coin_decimals, deployment.price_decimals] {
        if decimals > MAX_DECIMALS {
            return Err(ConfigError::Deployment(format!("{} decimals exceed {}", decimals, MAX_DECIMALS)));
        }
    }
    Ok(deployment)
}

#[derive(Clone)]
pub struct Settings {
    pub rpc_url: String,
    pub private_key: Option<String>,
    pub token_address: Address,
    pub bank_address: Address,
    pub bind_addr: SocketAddr,
    pub poll_interval: Duration,
    pub price_feed_url: Option<String>,
    pub deployment: Deployment,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("token_address", &self.token_address)
            .field("bank_address", &self.bank_address)
            .field("bind_addr", &self.bind_addr)
            .field("poll_interval", &self.poll_interval)
            .field("price_feed_url", &self.price_feed_url)
            .field("deployment", &self.deployment)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(read_deployment()?, |key| env::var(key).ok())
    }

    /// Builds settings from any key/value source; blank values count as unset.
    pub fn from_lookup<F>(deployment: Deployment, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let rpc_url = get("RPC_URL").ok_or(ConfigError::Missing("RPC_URL"))?;
        let token_address = parse_address("TOKEN_ADDRESS", get("TOKEN_ADDRESS"))?;
        let bank_address = parse_address("BANK_ADDRESS", get("BANK_ADDRESS"))?;

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::Invalid { key: "BIND_ADDR", reason: err.to_string() })?;

        let poll_secs = match get("POLL_INTERVAL_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|err| ConfigError::Invalid {
                key: "POLL_INTERVAL_SECS",
                reason: err.to_string(),
            })?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };
        if poll_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "POLL_INTERVAL_SECS",
                reason: "must be at least 1".to_string(),
            });
        }

        let settings = Settings {
            rpc_url,
            private_key: get("PRIVATE_KEY"),
            token_address,
            bank_address,
            bind_addr,
            poll_interval: Duration::from_secs(poll_secs),
            price_feed_url: get("PRICE_FEED_URL"),
            deployment,
        };
        validate_addresses(&settings)?;
        Ok(settings)
    }
}

fn parse_address(key: &'static str, raw: Option<String>) -> Result<Address, ConfigError> {
    raw.ok_or(ConfigError::Missing(key))?
        .parse::<Address>()
        .map_err(|err| ConfigError::Invalid { key, reason: err.to_string() })
}

pub fn validate_addresses(settings: &Settings) -> Result<(), ConfigError> {
    if settings.token_address.is_zero() {
        return Err(ConfigError::Invalid { key: "TOKEN_ADDRESS", reason: "zero address".to_string() });
    }
    if settings.bank_address.is_zero() {
        return Err(ConfigError::Invalid { key: "BANK_ADDRESS", reason: "zero address".to_string() });
    }
    if settings.token_address == settings.bank_address {
        return Err(ConfigError::Invalid {
            key: "BANK_ADDRESS",
            reason: format!("same as token address 0x{:x}", settings.token_address),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const TOKEN: &str = "0x1111111111111111111111111111111111111111";
    const BANK: &str = "0x2222222222222222222222222222222222222222";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn embedded_deployment_parses() {
        let deployment = read_deployment().unwrap();
        assert_eq!(deployment.chain_name, "ETHERLINK TESTNET");
        assert_eq!(deployment.coin_symbol, "$XTZ");
        assert_eq!(deployment.token_symbol, "$EM");
    }

    #[test]
    fn defaults_apply() {
        let settings = Settings::from_lookup(
            read_deployment().unwrap(),
            lookup(&[("RPC_URL", "http://localhost:8545"), ("TOKEN_ADDRESS", TOKEN), ("BANK_ADDRESS", BANK), ("PRIVATE_KEY", "  ")]),
        )
        .unwrap();
        assert_eq!(settings.poll_interval, Duration::from_secs(60));
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(settings.private_key, None);
    }

    #[test]
    fn debug_output_hides_private_key() {
        let settings = Settings::from_lookup(
            read_deployment().unwrap(),
            lookup(&[("RPC_URL", "http://x"), ("TOKEN_ADDRESS", TOKEN), ("BANK_ADDRESS", BANK), ("PRIVATE_KEY", "0xfeedface")]),
        )
        .unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("feedface"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn rejects_missing_and_invalid_values() {
        let deployment = read_deployment().unwrap();
        let err = Settings::from_lookup(deployment.clone(), lookup(&[("TOKEN_ADDRESS", TOKEN)])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("RPC_URL")));

        let err = Settings::from_lookup(
            deployment.clone(),
            lookup(&[("RPC_URL", "http://x"), ("TOKEN_ADDRESS", TOKEN), ("BANK_ADDRESS", TOKEN)]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BANK_ADDRESS", .. }));

        let err = Settings::from_lookup(
            deployment,
            lookup(&[("RPC_URL", "http://x"), ("TOKEN_ADDRESS", TOKEN), ("BANK_ADDRESS", BANK), ("POLL_INTERVAL_SECS", "0")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "POLL_INTERVAL_SECS", .. }));
    }

    #[test]
    fn deployment_requires_chain_id() {
        let err = parse_deployment(r#"{"chain_id":0,"chain_name":"x","coin_symbol":"a","token_symbol":"b"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Deployment(_)));
    }

    #[test]
    fn deployment_rejects_oversized_decimals() {
        let err = parse_deployment(
            r#"{"chain_id":1,"chain_name":"x","coin_symbol":"a","token_symbol":"b","price_decimals":78}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Deployment(_)));
    }
}
