//! Bitcoin address balances from an Esplora block explorer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::{
    error::{AppError, Result},
    types::{AddressBalance, EsploraAddress},
};

/// Explorer request timeout.
pub const EXPLORER_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("ethereum-tx-mcp/", env!("CARGO_PKG_VERSION"));

/// Balance of a Bitcoin address.
#[async_trait]
pub trait BalanceLookup: Send + Sync {
    async fn balance(&self, address: &str) -> Result<AddressBalance>;
}

/// Esplora REST client (`GET {base}/address/{address}`).
#[derive(Clone)]
pub struct EsploraClient {
    client: reqwest::Client,
    base_url: Url,
}

impl EsploraClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid ESPLORA_URL {}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(EXPLORER_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Explorer(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn address_url(&self, address: &str) -> Result<Url> {
        if address.is_empty() || !address.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::InvalidAddress(address.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push("address")
            .push(address);
        Ok(url)
    }
}

#[async_trait]
impl BalanceLookup for EsploraClient {
    async fn balance(&self, address: &str) -> Result<AddressBalance> {
        let url = self.address_url(address)?;
        tracing::debug!(url = %url, "Querying explorer");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Explorer(format!(
                "explorer returned status {} for {}",
                response.status(),
                address
            )));
        }

        let record: EsploraAddress = response.json().await?;
        let balance = AddressBalance::try_from(record)?;

        tracing::info!(
            address = %balance.address,
            total_sats = balance.total_sats,
            "BTC balance fetched"
        );

        Ok(balance)
    }
}
