//! Configuration management module.
//!
//! Handles loading configuration from environment variables.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use alloy::primitives::utils::parse_units;

use crate::{
    error::{AppError, Result},
    ethereum::constants::{
        DEFAULT_CALL_GAS_LIMIT, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_DEPLOY_GAS_LIMIT,
        DEFAULT_POLL_INTERVAL, DEFAULT_RPC_TIMEOUT,
    },
    services::PriorityFee,
    types::NoncePolicy,
};

/// Default Esplora endpoint (Bitcoin testnet).
pub const DEFAULT_ESPLORA_URL: &str = "https://blockstream.info/testnet/api";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ethereum JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Private key for the sending account (hex, `0x` optional).
    pub private_key: String,
    /// Logging level (default: info).
    pub log_level: String,
    /// Directory holding ABI, bytecode and deployment records.
    pub artifact_dir: PathBuf,
    /// Esplora REST base URL for BTC balances.
    pub esplora_url: String,
    pub nonce_policy: NoncePolicy,
    pub priority_fee: PriorityFee,
    pub deploy_gas_limit: u64,
    pub call_gas_limit: u64,
    /// Per-call RPC timeout.
    pub rpc_timeout: Duration,
    /// How long to wait for a receipt.
    pub confirmation_timeout: Duration,
    /// Receipt polling interval.
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ETHEREUM_RPC_URL`: Ethereum JSON-RPC endpoint
    /// - `ETHEREUM_PRIVATE_KEY`: Private key of the sending account (hex)
    ///
    /// Optional environment variables:
    /// - `LOG_LEVEL`: Logging level (default: info)
    /// - `ARTIFACT_DIR`: Artifact directory (default: artifacts)
    /// - `ESPLORA_URL`: Esplora base URL (default: Blockstream testnet)
    /// - `NONCE_POLICY`: `pending` or `latest` (default: pending)
    /// - `PRIORITY_FEE_GWEI`: Priority fee in gwei, or `suggested` (default: 1)
    /// - `DEPLOY_GAS_LIMIT` / `CALL_GAS_LIMIT`: Gas limits (default: 2000000 / 200000)
    /// - `RPC_TIMEOUT_SECS`: Per-call RPC timeout (default: 10)
    /// - `CONFIRMATION_TIMEOUT_SECS`: Receipt wait (default: 120)
    /// - `POLL_INTERVAL_MS`: Receipt polling interval (default: 100)
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let rpc_url = env::var("ETHEREUM_RPC_URL").map_err(|_| {
            AppError::Config("ETHEREUM_RPC_URL environment variable not set".into())
        })?;

        let private_key = env::var("ETHEREUM_PRIVATE_KEY").map_err(|_| {
            AppError::Config("ETHEREUM_PRIVATE_KEY environment variable not set".into())
        })?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let artifact_dir =
            PathBuf::from(env::var("ARTIFACT_DIR").unwrap_or_else(|_| "artifacts".to_string()));
        let esplora_url =
            env::var("ESPLORA_URL").unwrap_or_else(|_| DEFAULT_ESPLORA_URL.to_string());

        let nonce_policy = match env::var("NONCE_POLICY").ok() {
            Some(raw) => raw.parse().map_err(AppError::Config)?,
            None => NoncePolicy::default(),
        };
        let priority_fee = parse_priority_fee(env::var("PRIORITY_FEE_GWEI").ok().as_deref())?;

        let deploy_gas_limit = parse_var("DEPLOY_GAS_LIMIT", DEFAULT_DEPLOY_GAS_LIMIT)?;
        let call_gas_limit = parse_var("CALL_GAS_LIMIT", DEFAULT_CALL_GAS_LIMIT)?;
        let rpc_timeout =
            Duration::from_secs(parse_var("RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT.as_secs())?);
        let confirmation_timeout = Duration::from_secs(parse_var(
            "CONFIRMATION_TIMEOUT_SECS",
            DEFAULT_CONFIRMATION_TIMEOUT.as_secs(),
        )?);
        let poll_interval = Duration::from_millis(parse_var(
            "POLL_INTERVAL_MS",
            DEFAULT_POLL_INTERVAL.as_millis() as u64,
        )?);

        if poll_interval.is_zero() {
            return Err(AppError::Config("POLL_INTERVAL_MS must be greater than zero".into()));
        }

        Ok(Self {
            rpc_url,
            private_key,
            log_level,
            artifact_dir,
            esplora_url,
            nonce_policy,
            priority_fee,
            deploy_gas_limit,
            call_gas_limit,
            rpc_timeout,
            confirmation_timeout,
            poll_interval,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(name, env::var(name).ok().as_deref(), default)
}

fn parse_value<T>(name: &str, raw: Option<&str>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|e| AppError::Config(format!("{} has invalid value {:?}: {}", name, value, e))),
    }
}

/// `suggested`, or a gwei amount such as `1` or `1.5`.
fn parse_priority_fee(raw: Option<&str>) -> Result<PriorityFee> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(PriorityFee::default()),
        Some(value) => value,
    };

    if value.eq_ignore_ascii_case("suggested") {
        return Ok(PriorityFee::suggested());
    }

    let wei = parse_units(value, "gwei")
        .map_err(|e| AppError::Config(format!("PRIORITY_FEE_GWEI {:?}: {}", value, e)))?
        .get_absolute();
    let wei = u128::try_from(wei)
        .map_err(|_| AppError::Config(format!("PRIORITY_FEE_GWEI {:?} is too large", value)))?;

    Ok(PriorityFee::Fixed(wei))
}
