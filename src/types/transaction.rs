//! Transaction-related types.

use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    primitives::{Address, Bytes, B256, U256},
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Fee fields for a single transaction.
///
/// Legacy and fee-market fields never coexist: the variant decides which
/// envelope the signer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeeQuote {
    /// Single gas price (pre-London networks).
    Legacy {
        /// Price per unit of gas in wei.
        gas_price: u128,
    },
    /// Fee-market (EIP-1559) fields.
    Dynamic {
        /// Cap on the total price per unit of gas in wei.
        max_fee_per_gas: u128,
        /// Tip paid to the block producer per unit of gas in wei.
        max_priority_fee_per_gas: u128,
    },
}

impl FeeQuote {
    /// Fee-market quote with `2 * base_fee + priority` as the cap.
    ///
    /// Doubling the base fee keeps the transaction valid through several
    /// consecutive full blocks.
    pub fn from_base_fee(base_fee: u128, priority: u128) -> Result<Self> {
        let max_fee_per_gas = base_fee
            .checked_mul(2)
            .and_then(|doubled| doubled.checked_add(priority))
            .ok_or_else(|| {
                AppError::NumericOverflow(format!(
                    "max fee for base fee {} and priority fee {}",
                    base_fee, priority
                ))
            })?;

        Ok(FeeQuote::Dynamic { max_fee_per_gas, max_priority_fee_per_gas: priority })
    }

    /// Highest price per gas the transaction may pay.
    pub fn max_fee_per_gas(&self) -> u128 {
        match self {
            FeeQuote::Legacy { gas_price } => *gas_price,
            FeeQuote::Dynamic { max_fee_per_gas, .. } => *max_fee_per_gas,
        }
    }

    /// Whether this is a fee-market quote.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, FeeQuote::Dynamic { .. })
    }
}

/// Which transaction count the nonce is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoncePolicy {
    /// Count including transactions still in the mempool.
    #[default]
    Pending,
    /// Count of transactions included in the latest block.
    Latest,
}

impl NoncePolicy {
    /// Block tag passed to `eth_getTransactionCount`.
    pub fn block_id(&self) -> BlockId {
        match self {
            NoncePolicy::Pending => BlockId::Number(BlockNumberOrTag::Pending),
            NoncePolicy::Latest => BlockId::Number(BlockNumberOrTag::Latest),
        }
    }
}

impl std::str::FromStr for NoncePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(NoncePolicy::Pending),
            "latest" | "confirmed" => Ok(NoncePolicy::Latest),
            _ => Err(format!("Invalid nonce policy: {}", s)),
        }
    }
}

/// An unsigned, fully populated transaction.
///
/// Only [`crate::services::TransactionBuilder`] creates these, after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    chain_id: u64,
    nonce: u64,
    to: Option<Address>,
    value: U256,
    data: Bytes,
    gas_limit: u64,
    fee: FeeQuote,
}

impl TransactionRequest {
    pub(crate) fn new(
        chain_id: u64,
        nonce: u64,
        to: Option<Address>,
        value: U256,
        data: Bytes,
        gas_limit: u64,
        fee: FeeQuote,
    ) -> Self {
        Self { chain_id, nonce, to, value, data, gas_limit, fee }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Recipient; `None` for contract deployment.
    pub fn to(&self) -> Option<Address> {
        self.to
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn fee(&self) -> FeeQuote {
        self.fee
    }

    /// Whether this request creates a contract.
    pub fn is_deployment(&self) -> bool {
        self.to.is_none()
    }
}

/// A signed, EIP-2718 encoded transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    raw: Bytes,
    hash: B256,
}

impl SignedTransaction {
    pub(crate) fn new(raw: Bytes, hash: B256) -> Self {
        Self { raw, hash }
    }

    /// Encoded bytes as sent to `eth_sendRawTransaction`.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Keccak-256 of [`Self::raw`].
    pub fn hash(&self) -> B256 {
        self.hash
    }
}
