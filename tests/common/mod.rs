//! Common utilities for integration tests.
//!
//! [`MockChain`] is an in-memory node: it decodes signed envelopes, recovers
//! the sender, enforces nonces and runs a one-slot string store contract.
//! The pending nonce advances on submission, the latest nonce only once the
//! receipt has been seen.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy::{
    consensus::{Transaction as _, TxEnvelope},
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
    eips::eip2718::Decodable2718,
    json_abi::JsonAbi,
    primitives::{Address, Bytes, TxKind, B256},
    rpc::types::TransactionRequest as RpcTransactionRequest,
};
use async_trait::async_trait;

use ethereum_tx_mcp::{
    artifacts::ArtifactStore,
    ethereum::{Account, ChainRpc},
    explorer::BalanceLookup,
    services::TransactionSettings,
    types::{
        AddressBalance, BlockHeaderInfo, BlockSummary, NoncePolicy, Receipt, TransactionDetails,
        TxStatus,
    },
    AppError, Config, EthereumTxServer, Result, LOCAL_DEV_CHAIN_ID, TRANSFER_GAS,
};

/// Well-known Hardhat/Foundry development key (DO NOT use in production!)
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const CHAIN_ID: u64 = LOCAL_DEV_CHAIN_ID;

pub const CONTRACT_NAME: &str = "DoubleString";

/// ABI of the lab's string store contract.
pub const STORE_ABI: &str = r#"[
    {"type":"constructor","stateMutability":"nonpayable","inputs":[]},
    {"type":"function","name":"setValue","stateMutability":"nonpayable",
     "inputs":[{"name":"newValue","type":"string","internalType":"string"}],"outputs":[]},
    {"type":"function","name":"getValue","stateMutability":"view",
     "inputs":[],"outputs":[{"name":"","type":"string","internalType":"string"}]}
]"#;

/// Creation bytecode stand-in; the mock chain does not execute it.
pub const STORE_BYTECODE: [u8; 5] = [0x60, 0x80, 0x60, 0x40, 0x52];

pub fn store_abi() -> JsonAbi {
    serde_json::from_str(STORE_ABI).unwrap()
}

pub fn test_account() -> Account {
    Account::from_private_key(TEST_PRIVATE_KEY).unwrap()
}

/// Short waits so timeout tests stay fast.
pub fn fast_settings() -> TransactionSettings {
    TransactionSettings {
        poll_interval: Duration::from_millis(5),
        confirmation_timeout: Duration::from_millis(500),
        ..TransactionSettings::default()
    }
}

struct ChainState {
    base_fee: Option<u64>,
    gas_price: u128,
    block_number: u64,
    /// Next nonce counting submitted transactions.
    nonces: HashMap<Address, u64>,
    /// Next nonce counting transactions whose receipt is visible.
    confirmed: HashMap<Address, u64>,
    transactions: HashMap<B256, TransactionDetails>,
    receipts: HashMap<B256, Receipt>,
    /// Polls left before a receipt becomes visible.
    hidden_polls: HashMap<B256, u32>,
    contracts: HashMap<Address, String>,
    receipt_delay: u32,
    receipt_latency: Duration,
    never_mine: bool,
    lookups_fail: bool,
    submissions: Vec<Bytes>,
    receipt_polls: u32,
}

/// In-memory node.
pub struct MockChain {
    chain_id: u64,
    abi: JsonAbi,
    state: Mutex<ChainState>,
}

impl MockChain {
    /// Fee-market chain with a 1 gwei base fee.
    pub fn new() -> Self {
        Self {
            chain_id: CHAIN_ID,
            abi: store_abi(),
            state: Mutex::new(ChainState {
                base_fee: Some(1_000_000_000),
                gas_price: 20_000_000_000,
                block_number: 0,
                nonces: HashMap::new(),
                confirmed: HashMap::new(),
                transactions: HashMap::new(),
                receipts: HashMap::new(),
                hidden_polls: HashMap::new(),
                contracts: HashMap::new(),
                receipt_delay: 0,
                receipt_latency: Duration::ZERO,
                never_mine: false,
                lookups_fail: false,
                submissions: Vec::new(),
                receipt_polls: 0,
            }),
        }
    }

    /// Chain without a fee market (no base fee in headers).
    pub fn legacy() -> Self {
        let chain = Self::new();
        chain.state.lock().unwrap().base_fee = None;
        chain
    }

    pub fn with_base_fee(self, base_fee: u64) -> Self {
        self.state.lock().unwrap().base_fee = Some(base_fee);
        self
    }

    /// Receipts stay hidden for `polls` lookups.
    pub fn with_receipt_delay(self, polls: u32) -> Self {
        self.state.lock().unwrap().receipt_delay = polls;
        self
    }

    /// Every receipt lookup takes `latency` before answering.
    pub fn with_receipt_latency(self, latency: Duration) -> Self {
        self.state.lock().unwrap().receipt_latency = latency;
        self
    }

    /// `eth_getTransactionByHash` fails with a transport error.
    pub fn with_failing_lookups(self) -> Self {
        self.state.lock().unwrap().lookups_fail = true;
        self
    }

    /// Accept transactions but never produce receipts.
    pub fn never_mining(self) -> Self {
        self.state.lock().unwrap().never_mine = true;
        self
    }

    pub fn nonce_of(&self, address: Address) -> u64 {
        self.state.lock().unwrap().nonces.get(&address).copied().unwrap_or(0)
    }

    pub fn confirmed_nonce_of(&self, address: Address) -> u64 {
        self.state.lock().unwrap().confirmed.get(&address).copied().unwrap_or(0)
    }

    pub fn submissions(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn receipt_polls(&self) -> u32 {
        self.state.lock().unwrap().receipt_polls
    }

    pub fn stored_value(&self, contract: Address) -> Option<String> {
        self.state.lock().unwrap().contracts.get(&contract).cloned()
    }

    pub fn block_number(&self) -> u64 {
        self.state.lock().unwrap().block_number
    }

    /// Apply a call to the store contract; `false` means revert.
    fn execute_call(&self, state: &mut ChainState, to: Address, input: &[u8]) -> bool {
        let Some(slot) = state.contracts.get_mut(&to) else {
            // Plain account: value transfer.
            return true;
        };
        let Some(set_value) = self.abi.function("setValue").and_then(|f| f.first()) else {
            return false;
        };
        if input.len() < 4 || input[..4] != set_value.selector()[..] {
            return false;
        }
        match set_value.abi_decode_input(&input[4..]) {
            Ok(values) => match values.first() {
                Some(DynSolValue::String(value)) => {
                    *slot = value.clone();
                    true
                }
                _ => false,
            },
            Err(_) => false,
        }
    }
}

fn rejection(message: impl Into<String>) -> AppError {
    AppError::rejection("eth_sendRawTransaction", message)
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn latest_header(&self) -> Result<BlockHeaderInfo> {
        let state = self.state.lock().unwrap();
        Ok(BlockHeaderInfo { number: state.block_number, base_fee_per_gas: state.base_fee })
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn transaction_count(&self, address: Address, policy: NoncePolicy) -> Result<u64> {
        Ok(match policy {
            NoncePolicy::Pending => self.nonce_of(address),
            NoncePolicy::Latest => self.confirmed_nonce_of(address),
        })
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn max_priority_fee(&self) -> Result<u128> {
        Ok(1_000_000_000)
    }

    async fn estimate_gas(&self, tx: &RpcTransactionRequest) -> Result<u64> {
        let empty = tx.input.input().is_none_or(|data| data.is_empty());
        Ok(if empty { TRANSFER_GAS } else { 100_000 })
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| rejection(format!("invalid transaction: {}", e)))?;

        let (hash, sender, gas_price, max_fee, max_priority) = match &envelope {
            TxEnvelope::Legacy(tx) => (
                *tx.hash(),
                tx.recover_signer().map_err(|e| rejection(e.to_string()))?,
                Some(tx.tx().gas_price),
                None,
                None,
            ),
            TxEnvelope::Eip1559(tx) => (
                *tx.hash(),
                tx.recover_signer().map_err(|e| rejection(e.to_string()))?,
                None,
                Some(tx.tx().max_fee_per_gas),
                Some(tx.tx().max_priority_fee_per_gas),
            ),
            _ => return Err(rejection("transaction type not supported")),
        };

        if envelope.chain_id() != Some(self.chain_id) {
            return Err(rejection("invalid chain id"));
        }

        let mut state = self.state.lock().unwrap();

        if state.transactions.contains_key(&hash) {
            return Err(rejection("already known"));
        }

        let expected = state.nonces.get(&sender).copied().unwrap_or(0);
        let nonce = envelope.nonce();
        if nonce < expected {
            return Err(rejection(format!(
                "nonce too low: next nonce {}, tx nonce {}",
                expected, nonce
            )));
        }
        if nonce > expected {
            return Err(rejection(format!(
                "nonce too high: next nonce {}, tx nonce {}",
                expected, nonce
            )));
        }

        state.nonces.insert(sender, nonce + 1);
        state.block_number += 1;
        let block_number = state.block_number;

        let (to, success, contract_address) = match envelope.kind() {
            TxKind::Create => {
                let address = sender.create(nonce);
                state.contracts.insert(address, String::new());
                (None, true, Some(address))
            }
            TxKind::Call(to) => {
                let success = self.execute_call(&mut state, to, envelope.input());
                (Some(to), success, None)
            }
        };

        state.transactions.insert(
            hash,
            TransactionDetails {
                hash,
                from: sender,
                to,
                nonce,
                value_wei: envelope.value().to_string(),
                gas: envelope.gas_limit(),
                gas_price,
                max_fee_per_gas: max_fee,
                max_priority_fee_per_gas: max_priority,
                block_number: Some(block_number),
            },
        );

        let gas_used = if envelope.input().is_empty() { TRANSFER_GAS } else { 100_000 };
        state.receipts.insert(
            hash,
            Receipt {
                transaction_hash: hash,
                status: TxStatus::from(success),
                block_number,
                gas_used,
                contract_address,
                log_count: 0,
            },
        );
        let delay = state.receipt_delay;
        state.hidden_polls.insert(hash, delay);
        state.submissions.push(Bytes::copy_from_slice(raw));

        Ok(hash)
    }

    async fn transaction(&self, hash: B256) -> Result<Option<TransactionDetails>> {
        let state = self.state.lock().unwrap();
        if state.lookups_fail {
            return Err(AppError::transport("eth_getTransactionByHash", "connection reset"));
        }
        Ok(state.transactions.get(&hash).cloned())
    }

    async fn receipt(&self, hash: B256) -> Result<Option<Receipt>> {
        let latency = self.state.lock().unwrap().receipt_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().unwrap();
        state.receipt_polls += 1;

        if state.never_mine {
            return Ok(None);
        }
        if let Some(hidden) = state.hidden_polls.get_mut(&hash) {
            if *hidden > 0 {
                *hidden -= 1;
                return Ok(None);
            }
        }

        let receipt = state.receipts.get(&hash).cloned();
        let mined =
            receipt.as_ref().and(state.transactions.get(&hash)).map(|tx| (tx.from, tx.nonce));
        if let Some((from, nonce)) = mined {
            let confirmed = state.confirmed.entry(from).or_insert(0);
            *confirmed = (*confirmed).max(nonce + 1);
        }
        Ok(receipt)
    }

    async fn block(&self, number: u64) -> Result<Option<BlockSummary>> {
        let state = self.state.lock().unwrap();
        if number == 0 || number > state.block_number {
            return Ok(None);
        }
        Ok(Some(BlockSummary {
            number,
            hash: B256::left_padding_from(&number.to_be_bytes()),
            timestamp: 1_700_000_000 + number * 12,
            miner: Address::ZERO,
            transaction_count: 1,
        }))
    }

    async fn call(&self, tx: &RpcTransactionRequest) -> Result<Bytes> {
        let to = tx.to.and_then(|kind| kind.to().copied());
        let input = tx.input.input().cloned().unwrap_or_default();

        let state = self.state.lock().unwrap();
        let Some(value) = to.and_then(|address| state.contracts.get(&address)) else {
            return Ok(Bytes::new());
        };

        let get_value = self
            .abi
            .function("getValue")
            .and_then(|f| f.first())
            .ok_or_else(|| AppError::rejection("eth_call", "execution reverted"))?;
        if input.len() < 4 || input[..4] != get_value.selector()[..] {
            return Err(AppError::rejection("eth_call", "execution reverted"));
        }

        let output = get_value
            .abi_encode_output(&[DynSolValue::String(value.clone())])
            .map_err(|e| AppError::rejection("eth_call", e.to_string()))?;
        Ok(output.into())
    }
}

/// Artifact store kept in memory.
#[derive(Default)]
pub struct MemoryArtifactStore {
    abis: Mutex<HashMap<String, JsonAbi>>,
    bytecodes: Mutex<HashMap<String, Bytes>>,
    addresses: Mutex<HashMap<String, Address>>,
    hashes: Mutex<HashMap<String, B256>>,
    receipts: Mutex<HashMap<String, Receipt>>,
}

impl MemoryArtifactStore {
    /// Store preloaded with the lab contract's ABI and bytecode.
    pub fn with_store_contract() -> Self {
        let store = Self::default();
        store.abis.lock().unwrap().insert(CONTRACT_NAME.to_string(), store_abi());
        store
            .bytecodes
            .lock()
            .unwrap()
            .insert(CONTRACT_NAME.to_string(), Bytes::from(STORE_BYTECODE.to_vec()));
        store
    }

    pub fn receipt(&self, label: &str) -> Option<Receipt> {
        self.receipts.lock().unwrap().get(label).cloned()
    }

    pub fn hash(&self, label: &str) -> Option<B256> {
        self.hashes.lock().unwrap().get(label).copied()
    }
}

fn missing(kind: &str, key: &str) -> AppError {
    AppError::Artifact(format!("no {} stored for {}", kind, key))
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn load_abi(&self, name: &str) -> Result<JsonAbi> {
        self.abis.lock().unwrap().get(name).cloned().ok_or_else(|| missing("ABI", name))
    }

    async fn save_abi(&self, name: &str, abi: &JsonAbi) -> Result<()> {
        self.abis.lock().unwrap().insert(name.to_string(), abi.clone());
        Ok(())
    }

    async fn load_bytecode(&self, name: &str) -> Result<Bytes> {
        self.bytecodes.lock().unwrap().get(name).cloned().ok_or_else(|| missing("bytecode", name))
    }

    async fn save_bytecode(&self, name: &str, bytecode: &Bytes) -> Result<()> {
        self.bytecodes.lock().unwrap().insert(name.to_string(), bytecode.clone());
        Ok(())
    }

    async fn load_address(&self, name: &str) -> Result<Address> {
        self.addresses.lock().unwrap().get(name).copied().ok_or_else(|| missing("address", name))
    }

    async fn save_address(&self, name: &str, address: Address) -> Result<()> {
        self.addresses.lock().unwrap().insert(name.to_string(), address);
        Ok(())
    }

    async fn record_tx_hash(&self, label: &str, hash: B256) -> Result<()> {
        self.hashes.lock().unwrap().insert(label.to_string(), hash);
        Ok(())
    }

    async fn load_tx_hash(&self, label: &str) -> Result<B256> {
        self.hashes.lock().unwrap().get(label).copied().ok_or_else(|| missing("hash", label))
    }

    async fn save_receipt(&self, label: &str, receipt: &Receipt) -> Result<()> {
        self.receipts.lock().unwrap().insert(label.to_string(), receipt.clone());
        Ok(())
    }
}

/// Explorer answering with a fixed balance.
pub struct FixedBalance(pub AddressBalance);

#[async_trait]
impl BalanceLookup for FixedBalance {
    async fn balance(&self, address: &str) -> Result<AddressBalance> {
        Ok(AddressBalance { address: address.to_string(), ..self.0.clone() })
    }
}

/// Server wired to an in-memory chain and artifact store.
pub fn offline_server(
    chain: Arc<MockChain>,
    artifacts: Arc<MemoryArtifactStore>,
    explorer: AddressBalance,
) -> EthereumTxServer {
    EthereumTxServer::with_components(
        chain,
        test_account(),
        fast_settings(),
        artifacts,
        Arc::new(FixedBalance(explorer)),
    )
}

/// Helper to create a live server from environment variables.
pub fn create_test_server() -> Option<EthereumTxServer> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let rpc_url = std::env::var("ETHEREUM_RPC_URL").ok()?;
    let private_key = std::env::var("ETHEREUM_PRIVATE_KEY").ok()?;

    if rpc_url.is_empty() || private_key.is_empty() {
        return None;
    }

    let config = Config::from_env().ok()?;

    EthereumTxServer::new(config).ok()
}

/// Skip test if server cannot be created (missing env vars).
#[macro_export]
macro_rules! skip_if_no_server {
    () => {
        match common::create_test_server() {
            Some(server) => server,
            None => {
                eprintln!("Skipping test: ETHEREUM_RPC_URL or ETHEREUM_PRIVATE_KEY not set");
                return;
            }
        }
    };
}
