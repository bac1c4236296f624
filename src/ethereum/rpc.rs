//! Node operations the transaction lifecycle depends on.

use alloy::{
    primitives::{Address, Bytes, B256},
    rpc::types::TransactionRequest as RpcTransactionRequest,
};
use async_trait::async_trait;

use crate::{
    error::Result,
    types::{BlockHeaderInfo, BlockSummary, NoncePolicy, Receipt, TransactionDetails},
};

/// JSON-RPC surface consumed by the core.
///
/// [`crate::ethereum::EthereumClient`] implements this over HTTP. Tests swap in
/// in-memory implementations.
///
/// Implementations report unreachable endpoints and protocol failures as
/// [`crate::AppError::Transport`], and node-side rejections of a transaction
/// or call as [`crate::AppError::ChainRejection`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Header fields of the latest block.
    async fn latest_header(&self) -> Result<BlockHeaderInfo>;

    /// Chain id reported by the node.
    async fn chain_id(&self) -> Result<u64>;

    /// Number of transactions sent from `address` under `policy`.
    async fn transaction_count(&self, address: Address, policy: NoncePolicy) -> Result<u64>;

    /// Suggested legacy gas price in wei.
    async fn gas_price(&self) -> Result<u128>;

    /// Suggested priority fee in wei.
    async fn max_priority_fee(&self) -> Result<u128>;

    /// Gas the node expects the transaction to use.
    async fn estimate_gas(&self, tx: &RpcTransactionRequest) -> Result<u64>;

    /// Submit an encoded signed transaction; returns the hash the node acknowledged.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256>;

    /// Transaction by hash, `None` if unknown.
    async fn transaction(&self, hash: B256) -> Result<Option<TransactionDetails>>;

    /// Receipt by hash, `None` while pending.
    async fn receipt(&self, hash: B256) -> Result<Option<Receipt>>;

    /// Block by number, `None` if not produced yet.
    async fn block(&self, number: u64) -> Result<Option<BlockSummary>>;

    /// Execute a read-only call against the latest state.
    async fn call(&self, tx: &RpcTransactionRequest) -> Result<Bytes>;
}
