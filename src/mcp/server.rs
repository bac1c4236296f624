//! MCP server implementation.

use std::sync::Arc;

use alloy::{
    dyn_abi::DynSolValue,
    json_abi::Param,
    primitives::{utils::parse_ether, Address, B256, U256},
};
use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Serialize;

use crate::{
    artifacts::{load_artifact, load_binding, ArtifactStore, FsArtifactStore},
    config::Config,
    error::AppError,
    ethereum::{Account, ChainRpc, EthereumClient},
    explorer::{BalanceLookup, EsploraClient},
    services::{
        value_to_json, AbiResolver, GasLimit, TransactionService, TransactionSettings, TxInspector,
    },
    types::{Confirmation, FunctionSelector, TransactionReport},
};

/// Label under which `get_transaction_info` finds a hash when none is given.
const DEFAULT_TX_LABEL: &str = "last_setValue";

/// Ethereum transaction MCP server.
///
/// Sends transfers, deploys and calls contracts from one account, and looks
/// up transactions and Bitcoin balances.
#[derive(Clone)]
pub struct EthereumTxServer {
    transactions: Arc<TransactionService>,
    inspector: TxInspector,
    artifacts: Arc<dyn ArtifactStore>,
    explorer: Arc<dyn BalanceLookup>,
    tool_router: ToolRouter<Self>,
}

impl EthereumTxServer {
    /// Create a new server from configuration.
    ///
    /// Note: This uses lazy initialization - no network calls are made during
    /// server startup. The node is first contacted when a tool is invoked.
    pub fn new(config: Config) -> Result<Self, AppError> {
        tracing::info!("Initializing Ethereum transaction MCP server");

        // Lazy - no network call yet
        let client = EthereumClient::with_timeout(&config.rpc_url, config.rpc_timeout)?;
        let account = Account::from_private_key(&config.private_key)?;
        let artifacts = FsArtifactStore::new(config.artifact_dir.clone());
        let explorer = EsploraClient::new(&config.esplora_url)?;

        tracing::info!(
            artifact_dir = %config.artifact_dir.display(),
            nonce_policy = ?config.nonce_policy,
            "Ethereum transaction MCP server initialized"
        );

        Ok(Self::with_components(
            Arc::new(client),
            account,
            TransactionSettings::from(&config),
            Arc::new(artifacts),
            Arc::new(explorer),
        ))
    }

    /// Assemble a server from already-built parts.
    pub fn with_components(
        rpc: Arc<dyn ChainRpc>,
        account: Account,
        settings: TransactionSettings,
        artifacts: Arc<dyn ArtifactStore>,
        explorer: Arc<dyn BalanceLookup>,
    ) -> Self {
        Self {
            transactions: Arc::new(TransactionService::new(rpc.clone(), account, settings)),
            inspector: TxInspector::new(rpc),
            artifacts,
            explorer,
            tool_router: Self::tool_router(),
        }
    }
}

/// Input parameters for the get_btc_balance tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetBtcBalanceInput {
    /// Bitcoin address (e.g. "tb1q...").
    pub address: String,
}

/// Input parameters for the send_eth tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct SendEthInput {
    /// Recipient address (0x...).
    pub to: String,
    /// Amount in ether, human-readable (e.g. "0.01").
    pub amount_eth: String,
}

/// Input parameters for the deploy_contract tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct DeployContractInput {
    /// Contract name; its ABI and bytecode are read from the artifact directory.
    pub contract: String,
    /// Constructor arguments as strings, in declaration order.
    #[serde(default)]
    pub constructor_args: Option<Vec<String>>,
    /// Gas limit. Defaults to the configured deployment limit.
    #[serde(default)]
    pub gas_limit: Option<u64>,
}

/// Input parameters for the invoke_contract tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct InvokeContractInput {
    /// Name of a deployed contract.
    pub contract: String,
    /// Function to call (e.g. "setValue").
    pub function: String,
    /// Arguments as strings, in declaration order.
    #[serde(default)]
    pub args: Option<Vec<String>>,
    /// Gas limit. Defaults to the configured call limit.
    #[serde(default)]
    pub gas_limit: Option<u64>,
}

/// Input parameters for the read_contract tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct ReadContractInput {
    /// Name of a deployed contract.
    pub contract: String,
    /// Function to read. If omitted, the first of getValue, retrieve, get, value.
    #[serde(default)]
    pub function: Option<String>,
    /// Arguments as strings, in declaration order.
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

/// Input parameters for the get_transaction_info tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetTransactionInfoInput {
    /// Transaction hash (0x...). If omitted, the hash recorded under `label` is used.
    #[serde(default)]
    pub tx_hash: Option<String>,
    /// Recorded hash label, e.g. "last_setValue" (default).
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
struct TransferResult {
    from: Address,
    to: Address,
    value_wei: String,
    hash: B256,
    confirmation: Confirmation,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<TransactionReport>,
}

#[derive(Debug, Serialize)]
struct InvocationResult {
    contract: Address,
    function: String,
    hash: B256,
    confirmation: Confirmation,
}

#[derive(Debug, Serialize)]
struct ReadResult {
    contract: Address,
    function: String,
    values: Vec<serde_json::Value>,
}

/// Parse and validate an Ethereum address from a string.
///
/// Accepts `0x` + 40 hex characters.
fn parse_address(s: &str) -> Result<Address, McpError> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(McpError::invalid_params("Address cannot be empty", None));
    }

    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(McpError::invalid_params(format!("Address must start with '0x': {}", s), None));
    }

    if trimmed.len() != 42 {
        return Err(McpError::invalid_params(
            format!(
                "Address must be 42 characters (0x + 40 hex chars), got {}: {}",
                trimmed.len(),
                s
            ),
            None,
        ));
    }

    trimmed.parse::<Address>().map_err(|e| {
        McpError::invalid_params(format!("Invalid address format '{}': {}", s, e), None)
    })
}

fn parse_hash(s: &str) -> Result<B256, McpError> {
    s.trim().parse::<B256>().map_err(|e| {
        McpError::invalid_params(format!("Invalid transaction hash '{}': {}", s, e), None)
    })
}

fn parse_args(inputs: &[Param], raw: Option<Vec<String>>) -> Result<Vec<DynSolValue>, McpError> {
    Ok(AbiResolver::parse_args(inputs, &raw.unwrap_or_default())?)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

#[tool_router]
impl EthereumTxServer {
    /// Query the balance of a Bitcoin address through Esplora.
    #[tool(description = "Query the confirmed and unconfirmed balance of a Bitcoin address")]
    pub async fn get_btc_balance(
        &self,
        Parameters(input): Parameters<GetBtcBalanceInput>,
    ) -> Result<String, McpError> {
        tracing::info!(address = %input.address, "get_btc_balance called");

        let balance = self.explorer.balance(input.address.trim()).await?;
        to_json(&balance)
    }

    /// Send ETH and wait for the receipt.
    #[tool(description = "Send ETH from the configured account and wait for it to be mined")]
    pub async fn send_eth(
        &self,
        Parameters(input): Parameters<SendEthInput>,
    ) -> Result<String, McpError> {
        tracing::info!(to = %input.to, amount = %input.amount_eth, "send_eth called");

        let to = parse_address(&input.to)?;
        let value = parse_ether(input.amount_eth.trim()).map_err(|e| {
            McpError::invalid_params(format!("Invalid amount '{}': {}", input.amount_eth, e), None)
        })?;
        if value == U256::ZERO {
            return Err(McpError::invalid_params("Amount must be greater than zero", None));
        }

        let outcome = self.transactions.send_transfer(to, value).await?;

        let details = match outcome.confirmation {
            Confirmation::Mined(_) => match self.inspector.inspect(outcome.hash).await {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::warn!(
                        hash = %outcome.hash,
                        error = %e,
                        "Transfer mined but not inspected"
                    );
                    None
                }
            },
            Confirmation::TimedOut { .. } => None,
        };

        to_json(&TransferResult {
            from: self.transactions.account().address(),
            to,
            value_wei: value.to_string(),
            hash: outcome.hash,
            confirmation: outcome.confirmation,
            details,
        })
    }

    /// Deploy a contract from stored artifacts and record where it landed.
    #[tool(
        description = "Deploy a compiled contract from the artifact directory; saves its address, transaction hash and receipt"
    )]
    pub async fn deploy_contract(
        &self,
        Parameters(input): Parameters<DeployContractInput>,
    ) -> Result<String, McpError> {
        tracing::info!(contract = %input.contract, gas_limit = ?input.gas_limit, "deploy_contract called");

        let artifact = load_artifact(self.artifacts.as_ref(), &input.contract).await?;
        let inputs = artifact.abi.constructor.as_ref().map(|c| c.inputs.as_slice()).unwrap_or(&[]);
        let args = parse_args(inputs, input.constructor_args)?;
        let gas = input.gas_limit.unwrap_or(self.transactions.settings().deploy_gas_limit);

        let deployment = self.transactions.deploy(&artifact, args, GasLimit::Fixed(gas)).await?;

        let label = format!("{}_deploy", artifact.name);
        self.artifacts.save_address(&artifact.name, deployment.address).await?;
        self.artifacts.record_tx_hash(&label, deployment.transaction_hash).await?;
        self.artifacts.save_receipt(&label, &deployment.receipt).await?;

        to_json(&deployment)
    }

    /// Call a state-changing contract function.
    #[tool(
        description = "Call a state-changing function of a deployed contract and wait for the receipt"
    )]
    pub async fn invoke_contract(
        &self,
        Parameters(input): Parameters<InvokeContractInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            contract = %input.contract,
            function = %input.function,
            "invoke_contract called"
        );

        let binding = load_binding(self.artifacts.as_ref(), &input.contract).await?;
        let function = AbiResolver::resolve(&binding.abi, &input.function)?;
        let args = parse_args(&function.inputs, input.args)?;
        let gas = input.gas_limit.unwrap_or(self.transactions.settings().call_gas_limit);

        let outcome =
            self.transactions.invoke(&binding, &input.function, args, GasLimit::Fixed(gas)).await?;

        self.artifacts.record_tx_hash(&format!("last_{}", input.function), outcome.hash).await?;

        to_json(&InvocationResult {
            contract: binding.address,
            function: input.function,
            hash: outcome.hash,
            confirmation: outcome.confirmation,
        })
    }

    /// Read from a contract without sending a transaction.
    #[tool(
        description = "Read a view function of a deployed contract. Without a function name, tries getValue, retrieve, get and value in that order"
    )]
    pub async fn read_contract(
        &self,
        Parameters(input): Parameters<ReadContractInput>,
    ) -> Result<String, McpError> {
        tracing::info!(contract = %input.contract, function = ?input.function, "read_contract called");

        let binding = load_binding(self.artifacts.as_ref(), &input.contract).await?;
        let selector = match input.function.as_deref() {
            Some(name) => FunctionSelector::Exact(name),
            None => FunctionSelector::default(),
        };
        let function = AbiResolver::select(&binding.abi, selector)?;
        let args = parse_args(&function.inputs, input.args)?;

        let read = self
            .transactions
            .read(&binding, FunctionSelector::Exact(&function.name), args)
            .await?;

        to_json(&ReadResult {
            contract: read.contract,
            function: read.function,
            values: read.values.iter().map(value_to_json).collect(),
        })
    }

    /// Look up a transaction with its receipt and block.
    #[tool(
        description = "Get a transaction with its receipt and block. Without tx_hash, uses the hash recorded under label (default last_setValue)"
    )]
    pub async fn get_transaction_info(
        &self,
        Parameters(input): Parameters<GetTransactionInfoInput>,
    ) -> Result<String, McpError> {
        tracing::info!(tx_hash = ?input.tx_hash, label = ?input.label, "get_transaction_info called");

        let hash = match input.tx_hash.as_deref() {
            Some(raw) => parse_hash(raw)?,
            None => {
                let label = input.label.as_deref().unwrap_or(DEFAULT_TX_LABEL);
                self.artifacts.load_tx_hash(label).await?
            }
        };

        let report = self.inspector.inspect(hash).await?;
        to_json(&report)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for EthereumTxServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ethereum-tx-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Ethereum transaction MCP server. Sends ETH, deploys and calls contracts, \
                 inspects transactions and queries Bitcoin balances."
                    .to_string(),
            ),
        }
    }
}
