//! Transaction lifecycle: fees and nonce, build, sign, submit, confirm.

use std::{sync::Arc, time::Duration};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    primitives::{Address, B256, U256},
    rpc::types::TransactionRequest as RpcTransactionRequest,
};
use serde::Serialize;

use super::{
    abi::{check_arity, AbiResolver},
    builder::TransactionBuilder,
    confirmation::ConfirmationWaiter,
    fees::{FeeEstimator, PriorityFee},
    nonce::{NonceTracker, SenderLocks},
    signer::Signer,
    submitter::Submitter,
};
use crate::{
    config::Config,
    error::{AppError, Result},
    ethereum::{
        constants::{
            DEFAULT_CALL_GAS_LIMIT, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_DEPLOY_GAS_LIMIT,
            DEFAULT_POLL_INTERVAL,
        },
        Account, ChainRpc,
    },
    types::{
        Confirmation, ContractArtifact, ContractBinding, ContractRead, Deployment,
        FunctionSelector, NoncePolicy,
    },
};

/// Knobs for the transaction pipeline.
#[derive(Debug, Clone)]
pub struct TransactionSettings {
    pub nonce_policy: NoncePolicy,
    pub priority_fee: PriorityFee,
    pub deploy_gas_limit: u64,
    pub call_gas_limit: u64,
    pub poll_interval: Duration,
    pub confirmation_timeout: Duration,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            nonce_policy: NoncePolicy::default(),
            priority_fee: PriorityFee::default(),
            deploy_gas_limit: DEFAULT_DEPLOY_GAS_LIMIT,
            call_gas_limit: DEFAULT_CALL_GAS_LIMIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }
}

impl From<&Config> for TransactionSettings {
    fn from(config: &Config) -> Self {
        Self {
            nonce_policy: config.nonce_policy,
            priority_fee: config.priority_fee,
            deploy_gas_limit: config.deploy_gas_limit,
            call_gas_limit: config.call_gas_limit,
            poll_interval: config.poll_interval,
            confirmation_timeout: config.confirmation_timeout,
        }
    }
}

/// How the gas limit is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasLimit {
    Fixed(u64),
    /// Ask the node via `eth_estimateGas`.
    Estimate,
}

/// Submitted transaction and how its wait ended.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionOutcome {
    pub hash: B256,
    pub confirmation: Confirmation,
}

/// Runs transactions for one account against one node.
pub struct TransactionService {
    rpc: Arc<dyn ChainRpc>,
    account: Account,
    settings: TransactionSettings,
    fees: FeeEstimator,
    nonces: NonceTracker,
    submitter: Submitter,
    waiter: ConfirmationWaiter,
    locks: Arc<SenderLocks>,
}

impl TransactionService {
    /// Create a new transaction service.
    pub fn new(rpc: Arc<dyn ChainRpc>, account: Account, settings: TransactionSettings) -> Self {
        Self::with_locks(rpc, account, settings, Arc::new(SenderLocks::new()))
    }

    /// Share `locks` with other services sending from the same accounts.
    pub fn with_locks(
        rpc: Arc<dyn ChainRpc>,
        account: Account,
        settings: TransactionSettings,
        locks: Arc<SenderLocks>,
    ) -> Self {
        Self {
            fees: FeeEstimator::new(rpc.clone(), settings.priority_fee),
            nonces: NonceTracker::new(rpc.clone()),
            submitter: Submitter::new(rpc.clone()),
            waiter: ConfirmationWaiter::new(
                rpc.clone(),
                settings.poll_interval,
                settings.confirmation_timeout,
            ),
            rpc,
            account,
            settings,
            locks,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn settings(&self) -> &TransactionSettings {
        &self.settings
    }

    /// Fill in chain id, nonce, fees and gas, then sign, submit and wait.
    ///
    /// The sender lock is held through submission, or through confirmation
    /// when nonces come from the latest block.
    pub async fn execute(
        &self,
        builder: TransactionBuilder,
        gas: GasLimit,
    ) -> Result<TransactionOutcome> {
        let sender = self.account.address();
        let policy = self.settings.nonce_policy;
        let guard = self.locks.acquire(sender).await;

        let chain_id = self.rpc.chain_id().await?;
        let nonce = self.nonces.next_nonce(sender, policy).await?;
        let fee = self.fees.estimate().await?;
        let builder = builder.chain_id(chain_id).nonce(nonce).fee(fee);

        let gas_limit = match gas {
            GasLimit::Fixed(limit) => limit,
            GasLimit::Estimate => self.rpc.estimate_gas(&builder.estimate_request(sender)?).await?,
        };

        let request = builder.gas_limit(gas_limit).build()?;
        let signed = Signer::sign(&request, &self.account)?;

        tracing::info!(
            from = %sender,
            to = ?request.to(),
            nonce = nonce,
            gas_limit = gas_limit,
            fee = ?fee,
            "Submitting transaction"
        );

        let hash = self.submitter.submit(&signed).await?;

        if policy == NoncePolicy::Pending {
            drop(guard);
        }

        let confirmation = self
            .waiter
            .wait(hash)
            .await
            .map_err(|source| AppError::Unconfirmed { hash, source: Box::new(source) })?;

        Ok(TransactionOutcome { hash, confirmation })
    }

    /// Send `value` wei to `to`, with estimated gas.
    pub async fn send_transfer(&self, to: Address, value: U256) -> Result<TransactionOutcome> {
        self.execute(TransactionBuilder::transfer(to, value), GasLimit::Estimate).await
    }

    /// Deploy `artifact` and wait for a successful receipt.
    pub async fn deploy(
        &self,
        artifact: &ContractArtifact,
        args: Vec<DynSolValue>,
        gas: GasLimit,
    ) -> Result<Deployment> {
        let builder = TransactionBuilder::deploy(
            artifact.bytecode.clone(),
            artifact.abi.constructor.clone(),
            args,
        );
        let outcome = self.execute(builder, gas).await?;

        let receipt = match outcome.confirmation {
            Confirmation::Mined(receipt) => receipt,
            Confirmation::TimedOut { hash, waited } => {
                return Err(AppError::Timeout { hash, waited_ms: waited.as_millis() as u64 })
            }
        };
        if !receipt.is_success() {
            return Err(AppError::rejection("deploy", "deployment reverted"));
        }
        let address = receipt
            .contract_address
            .ok_or_else(|| AppError::rejection("deploy", "receipt carries no contract address"))?;

        tracing::info!(contract = %artifact.name, address = %address, "Contract deployed");

        Ok(Deployment { address, transaction_hash: outcome.hash, receipt })
    }

    /// Call a state-changing function.
    pub async fn invoke(
        &self,
        binding: &ContractBinding,
        function: &str,
        args: Vec<DynSolValue>,
        gas: GasLimit,
    ) -> Result<TransactionOutcome> {
        let function = AbiResolver::resolve(&binding.abi, function)?.clone();
        self.execute(TransactionBuilder::call(binding.address, function, args), gas).await
    }

    /// `eth_call` a function and decode what it returns.
    pub async fn read(
        &self,
        binding: &ContractBinding,
        selector: FunctionSelector<'_>,
        args: Vec<DynSolValue>,
    ) -> Result<ContractRead> {
        let function = AbiResolver::select(&binding.abi, selector)?;
        check_arity(&format!("{} argument", function.name), function.inputs.len(), args.len())?;

        let data = function.abi_encode_input(&args).map_err(|e| {
            AppError::Validation(format!("{} arguments: {}", function.name, e))
        })?;
        let request = RpcTransactionRequest::default()
            .from(self.account.address())
            .to(binding.address)
            .input(data.into());

        let output = self.rpc.call(&request).await?;
        let values = AbiResolver::decode_output(function, &output)?;

        tracing::debug!(contract = %binding.address, function = %function.name, "Contract read");

        Ok(ContractRead { contract: binding.address, function: function.name.clone(), values })
    }
}
