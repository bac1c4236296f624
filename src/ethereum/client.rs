//! Ethereum RPC client.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use alloy::{
    consensus::Transaction as ConsensusTransaction,
    eips::BlockNumberOrTag,
    network::{Ethereum, ReceiptResponse, TransactionResponse},
    primitives::{Address, Bytes, B256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{
        Block, Transaction, TransactionReceipt, TransactionRequest as RpcTransactionRequest,
    },
    transports::TransportError,
};
use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{constants::DEFAULT_RPC_TIMEOUT, rpc::ChainRpc};
use crate::{
    error::{AppError, Result},
    types::{BlockHeaderInfo, BlockSummary, NoncePolicy, Receipt, TransactionDetails},
};

/// Type alias for the HTTP provider.
pub type HttpProvider = RootProvider<Ethereum>;

/// Ethereum RPC client wrapper with lazy initialization.
#[derive(Clone)]
pub struct EthereumClient {
    /// The underlying provider.
    provider: Arc<HttpProvider>,
    /// RPC URL for logging.
    rpc_url: String,
    /// Upper bound for every individual RPC call.
    request_timeout: Duration,
    /// Lazily initialized chain ID.
    chain_id: Arc<OnceCell<u64>>,
}

impl EthereumClient {
    /// Create a new Ethereum client with the default per-call timeout.
    ///
    /// Note: This does NOT make any network calls. The connection is
    /// established lazily when the first operation is performed.
    pub fn new(rpc_url: &str) -> Result<Self> {
        Self::with_timeout(rpc_url, DEFAULT_RPC_TIMEOUT)
    }

    /// Create a new Ethereum client with an explicit per-call timeout.
    pub fn with_timeout(rpc_url: &str, request_timeout: Duration) -> Result<Self> {
        let url = rpc_url
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid RPC URL: {}", rpc_url)))?;

        #[allow(deprecated)]
        let provider = ProviderBuilder::new().connect_http(url).root().clone();

        tracing::info!(
            rpc_url = %rpc_url,
            timeout_ms = request_timeout.as_millis() as u64,
            "Ethereum client created (lazy initialization)"
        );

        Ok(Self {
            provider: Arc::new(provider),
            rpc_url: rpc_url.to_string(),
            request_timeout,
            chain_id: Arc::new(OnceCell::new()),
        })
    }

    /// Run one RPC call under the per-call timeout and map its failure.
    async fn timed<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: IntoFuture<Output = std::result::Result<T, TransportError>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(classify_error(operation, err)),
            Err(_) => Err(AppError::transport(
                operation,
                format!("no response from {} within {:?}", self.rpc_url, self.request_timeout),
            )),
        }
    }
}

/// Operations whose JSON-RPC error responses are verdicts about the
/// transaction rather than about the transport.
const REJECTABLE_OPERATIONS: [&str; 3] =
    ["eth_sendRawTransaction", "eth_call", "eth_estimateGas"];

/// Split node verdicts from transport failures.
fn classify_error(operation: &str, err: TransportError) -> AppError {
    if REJECTABLE_OPERATIONS.contains(&operation) {
        if let Some(payload) = err.as_error_resp() {
            return AppError::rejection(operation, payload.message.to_string());
        }
    }
    AppError::transport(operation, err.to_string())
}

fn receipt_from_rpc(receipt: &TransactionReceipt) -> Receipt {
    Receipt {
        transaction_hash: receipt.transaction_hash,
        status: receipt.status().into(),
        block_number: receipt.block_number.unwrap_or_default(),
        gas_used: receipt.gas_used,
        contract_address: receipt.contract_address,
        log_count: receipt.inner.logs().len(),
    }
}

fn details_from_rpc(tx: &Transaction) -> TransactionDetails {
    let max_fee_per_gas = ConsensusTransaction::is_dynamic_fee(tx)
        .then(|| ConsensusTransaction::max_fee_per_gas(tx));

    TransactionDetails {
        hash: TransactionResponse::tx_hash(tx),
        from: TransactionResponse::from(tx),
        to: ConsensusTransaction::to(tx),
        nonce: ConsensusTransaction::nonce(tx),
        value_wei: ConsensusTransaction::value(tx).to_string(),
        gas: ConsensusTransaction::gas_limit(tx),
        gas_price: ConsensusTransaction::gas_price(tx),
        max_fee_per_gas,
        max_priority_fee_per_gas: ConsensusTransaction::max_priority_fee_per_gas(tx),
        block_number: TransactionResponse::block_number(tx),
    }
}

fn summary_from_rpc(block: &Block) -> BlockSummary {
    BlockSummary {
        number: block.header.number,
        hash: block.header.hash,
        timestamp: block.header.timestamp,
        miner: block.header.beneficiary,
        transaction_count: block.transactions.len(),
    }
}

#[async_trait]
impl ChainRpc for EthereumClient {
    async fn latest_header(&self) -> Result<BlockHeaderInfo> {
        let block = self
            .timed("eth_getBlockByNumber", self.provider.get_block_by_number(BlockNumberOrTag::Latest))
            .await?
            .ok_or_else(|| AppError::transport("eth_getBlockByNumber", "latest block missing"))?;

        Ok(BlockHeaderInfo {
            number: block.header.number,
            base_fee_per_gas: block.header.base_fee_per_gas,
        })
    }

    /// Get the chain ID (fetches from network on first call).
    async fn chain_id(&self) -> Result<u64> {
        self.chain_id
            .get_or_try_init(|| async {
                let chain_id = self.timed("eth_chainId", self.provider.get_chain_id()).await?;
                tracing::info!(chain_id = chain_id, rpc_url = %self.rpc_url, "Connected to Ethereum node");
                Ok(chain_id)
            })
            .await
            .copied()
    }

    async fn transaction_count(&self, address: Address, policy: NoncePolicy) -> Result<u64> {
        self.timed(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address).block_id(policy.block_id()),
        )
        .await
    }

    async fn gas_price(&self) -> Result<u128> {
        self.timed("eth_gasPrice", self.provider.get_gas_price()).await
    }

    async fn max_priority_fee(&self) -> Result<u128> {
        self.timed("eth_maxPriorityFeePerGas", self.provider.get_max_priority_fee_per_gas()).await
    }

    async fn estimate_gas(&self, tx: &RpcTransactionRequest) -> Result<u64> {
        self.timed("eth_estimateGas", self.provider.estimate_gas(tx.clone())).await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        let pending =
            self.timed("eth_sendRawTransaction", self.provider.send_raw_transaction(raw)).await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction(&self, hash: B256) -> Result<Option<TransactionDetails>> {
        let tx = self
            .timed("eth_getTransactionByHash", self.provider.get_transaction_by_hash(hash))
            .await?;
        Ok(tx.as_ref().map(details_from_rpc))
    }

    async fn receipt(&self, hash: B256) -> Result<Option<Receipt>> {
        let receipt = self
            .timed("eth_getTransactionReceipt", self.provider.get_transaction_receipt(hash))
            .await?;
        Ok(receipt.as_ref().map(receipt_from_rpc))
    }

    async fn block(&self, number: u64) -> Result<Option<BlockSummary>> {
        let block = self
            .timed(
                "eth_getBlockByNumber",
                self.provider.get_block_by_number(BlockNumberOrTag::Number(number)),
            )
            .await?;
        Ok(block.as_ref().map(summary_from_rpc))
    }

    async fn call(&self, tx: &RpcTransactionRequest) -> Result<Bytes> {
        self.timed("eth_call", self.provider.call(tx.clone())).await
    }
}
