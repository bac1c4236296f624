//! Receipt, block and inspection types.

use std::time::Duration;

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize, Serializer};

/// Execution outcome recorded in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Failed,
}

impl From<bool> for TxStatus {
    fn from(success: bool) -> Self {
        if success {
            TxStatus::Success
        } else {
            TxStatus::Failed
        }
    }
}

/// Outcome of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hash of the transaction this receipt belongs to.
    pub transaction_hash: B256,
    /// Success or revert.
    pub status: TxStatus,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Gas consumed by execution.
    pub gas_used: u64,
    /// Address of the created contract (deployments only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    /// Number of logs emitted.
    pub log_count: usize,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}

/// Terminal state of a confirmation wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Confirmation {
    /// A receipt was returned; check its status for success.
    Mined(Receipt),
    /// No receipt before the deadline. The transaction may still be mined later.
    TimedOut {
        hash: B256,
        #[serde(rename = "waited_ms", serialize_with = "serialize_millis")]
        waited: Duration,
    },
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(duration.as_millis())
}

impl Confirmation {
    /// Receipt, if the transaction was mined.
    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            Confirmation::Mined(receipt) => Some(receipt),
            Confirmation::TimedOut { .. } => None,
        }
    }

    /// Mined with a successful status.
    pub fn is_success(&self) -> bool {
        self.receipt().is_some_and(Receipt::is_success)
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Confirmation::TimedOut { .. })
    }
}

/// Fields of the latest block header the fee estimator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeaderInfo {
    pub number: u64,
    /// `None` on networks without a fee market.
    pub base_fee_per_gas: Option<u64>,
}

/// Transaction as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub hash: B256,
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub nonce: u64,
    /// Value in wei (decimal string).
    pub value_wei: String,
    pub gas: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<u128>,
    /// `None` while pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

/// Summary of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub number: u64,
    pub hash: B256,
    pub timestamp: u64,
    pub miner: Address,
    pub transaction_count: usize,
}

/// Transaction, receipt and block for a single hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReport {
    pub transaction: TransactionDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockSummary>,
}
