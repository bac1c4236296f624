//! Fee estimation.

use std::sync::Arc;

use crate::{
    error::Result,
    ethereum::{
        constants::{DEFAULT_PRIORITY_FEE, FALLBACK_PRIORITY_FEE},
        ChainRpc,
    },
    types::FeeQuote,
};

/// Where the priority fee comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityFee {
    /// A fixed tip in wei.
    Fixed(u128),
    /// The node's `eth_maxPriorityFeePerGas`, or `fallback` if the node cannot answer.
    Suggested { fallback: u128 },
}

impl Default for PriorityFee {
    fn default() -> Self {
        PriorityFee::Fixed(DEFAULT_PRIORITY_FEE)
    }
}

impl PriorityFee {
    /// Suggested by the node, falling back to 2 gwei.
    pub fn suggested() -> Self {
        PriorityFee::Suggested { fallback: FALLBACK_PRIORITY_FEE }
    }
}

/// Derives a fee quote from the latest block header.
#[derive(Clone)]
pub struct FeeEstimator {
    rpc: Arc<dyn ChainRpc>,
    priority: PriorityFee,
}

impl FeeEstimator {
    /// Create a new fee estimator.
    pub fn new(rpc: Arc<dyn ChainRpc>, priority: PriorityFee) -> Self {
        Self { rpc, priority }
    }

    /// Quote fees for a transaction going into the next block.
    ///
    /// A header carrying a base fee (zero included) yields a fee-market quote,
    /// otherwise the node's legacy gas price is used as-is.
    pub async fn estimate(&self) -> Result<FeeQuote> {
        let header = self.rpc.latest_header().await?;

        let quote = match header.base_fee_per_gas {
            Some(base_fee) => {
                let priority = self.priority_fee().await?;
                FeeQuote::from_base_fee(u128::from(base_fee), priority)?
            }
            None => FeeQuote::Legacy { gas_price: self.rpc.gas_price().await? },
        };

        tracing::debug!(
            block = header.number,
            base_fee = ?header.base_fee_per_gas,
            quote = ?quote,
            "Fee quote derived"
        );

        Ok(quote)
    }

    async fn priority_fee(&self) -> Result<u128> {
        match self.priority {
            PriorityFee::Fixed(fee) => Ok(fee),
            PriorityFee::Suggested { fallback } => match self.rpc.max_priority_fee().await {
                Ok(fee) => Ok(fee),
                Err(e) => {
                    tracing::warn!(error = %e, fallback = fallback, "Node gave no priority fee, using fallback");
                    Ok(fallback)
                }
            },
        }
    }
}
