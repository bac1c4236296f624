//! Unsigned transaction assembly.

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::{Constructor, Function},
    primitives::{Address, Bytes, TxKind, U256},
    rpc::types::TransactionRequest as RpcTransactionRequest,
};

use super::abi::check_arity;
use crate::{
    error::{AppError, Result},
    types::{FeeQuote, TransactionRequest},
};

/// What the transaction does.
#[derive(Debug, Clone)]
pub enum TransactionKind {
    /// Plain value transfer.
    Transfer { to: Address, value: U256 },
    /// Contract creation: bytecode followed by encoded constructor arguments.
    Deploy {
        bytecode: Bytes,
        /// `None` when the contract declares no constructor.
        constructor: Option<Constructor>,
        args: Vec<DynSolValue>,
        value: U256,
    },
    /// Contract method call: selector followed by encoded arguments.
    Call { contract: Address, function: Function, args: Vec<DynSolValue>, value: U256 },
}

/// Collects transaction parameters and validates them into a [`TransactionRequest`].
///
/// Performs no network access.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    kind: TransactionKind,
    chain_id: Option<u64>,
    nonce: Option<u64>,
    gas_limit: Option<u64>,
    fee: Option<FeeQuote>,
}

impl TransactionBuilder {
    fn with_kind(kind: TransactionKind) -> Self {
        Self { kind, chain_id: None, nonce: None, gas_limit: None, fee: None }
    }

    /// Send `value` wei to `to`.
    pub fn transfer(to: Address, value: U256) -> Self {
        Self::with_kind(TransactionKind::Transfer { to, value })
    }

    /// Deploy `bytecode`, passing `args` to `constructor`.
    pub fn deploy(bytecode: Bytes, constructor: Option<Constructor>, args: Vec<DynSolValue>) -> Self {
        Self::with_kind(TransactionKind::Deploy { bytecode, constructor, args, value: U256::ZERO })
    }

    /// Invoke `function` on `contract` with `args`.
    pub fn call(contract: Address, function: Function, args: Vec<DynSolValue>) -> Self {
        Self::with_kind(TransactionKind::Call { contract, function, args, value: U256::ZERO })
    }

    /// Attach value to a deployment or call (payable targets).
    pub fn value(mut self, amount: U256) -> Self {
        match &mut self.kind {
            TransactionKind::Transfer { value, .. }
            | TransactionKind::Deploy { value, .. }
            | TransactionKind::Call { value, .. } => *value = amount,
        }
        self
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn fee(mut self, fee: FeeQuote) -> Self {
        self.fee = Some(fee);
        self
    }

    /// Recipient address; `None` for deployments.
    pub fn recipient(&self) -> Option<Address> {
        match &self.kind {
            TransactionKind::Transfer { to, .. } => Some(*to),
            TransactionKind::Deploy { .. } => None,
            TransactionKind::Call { contract, .. } => Some(*contract),
        }
    }

    fn amount(&self) -> U256 {
        match &self.kind {
            TransactionKind::Transfer { value, .. }
            | TransactionKind::Deploy { value, .. }
            | TransactionKind::Call { value, .. } => *value,
        }
    }

    /// Transaction input for this kind.
    pub fn encode_data(&self) -> Result<Bytes> {
        match &self.kind {
            TransactionKind::Transfer { .. } => Ok(Bytes::new()),
            TransactionKind::Deploy { bytecode, constructor, args, .. } => {
                if bytecode.is_empty() {
                    return Err(AppError::Validation("deployment bytecode is empty".into()));
                }
                let encoded_args = match constructor {
                    Some(constructor) => {
                        check_arity("constructor argument", constructor.inputs.len(), args.len())?;
                        constructor.abi_encode_input(args).map_err(|e| {
                            AppError::Validation(format!("constructor arguments: {}", e))
                        })?
                    }
                    None => {
                        check_arity("constructor argument", 0, args.len())?;
                        Vec::new()
                    }
                };
                let mut data = bytecode.to_vec();
                data.extend_from_slice(&encoded_args);
                Ok(data.into())
            }
            TransactionKind::Call { function, args, .. } => {
                check_arity(
                    &format!("{} argument", function.name),
                    function.inputs.len(),
                    args.len(),
                )?;
                let data = function.abi_encode_input(args).map_err(|e| {
                    AppError::Validation(format!("{} arguments: {}", function.name, e))
                })?;
                Ok(data.into())
            }
        }
    }

    /// Request for `eth_estimateGas` as sent from `from`.
    pub fn estimate_request(&self, from: Address) -> Result<RpcTransactionRequest> {
        let mut request = RpcTransactionRequest::default()
            .from(from)
            .value(self.amount())
            .input(self.encode_data()?.into());
        request.to = Some(match self.recipient() {
            Some(to) => TxKind::Call(to),
            None => TxKind::Create,
        });
        if let Some(nonce) = self.nonce {
            request = request.nonce(nonce);
        }
        Ok(request)
    }

    /// Validate and assemble the unsigned transaction.
    pub fn build(&self) -> Result<TransactionRequest> {
        let chain_id = match self.chain_id {
            Some(0) => return Err(AppError::Validation("chain id must be non-zero".into())),
            Some(id) => id,
            None => return Err(AppError::Validation("chain id missing".into())),
        };
        let nonce = self.nonce.ok_or_else(|| AppError::Validation("nonce missing".into()))?;
        let gas_limit = match self.gas_limit {
            Some(0) => {
                return Err(AppError::Validation("gas limit must be greater than zero".into()))
            }
            Some(limit) => limit,
            None => return Err(AppError::Validation("gas limit missing".into())),
        };
        let fee = self.fee.ok_or_else(|| AppError::Validation("fee quote missing".into()))?;
        if let FeeQuote::Dynamic { max_fee_per_gas, max_priority_fee_per_gas } = fee {
            if max_priority_fee_per_gas > max_fee_per_gas {
                return Err(AppError::Validation(format!(
                    "max priority fee {} exceeds max fee {}",
                    max_priority_fee_per_gas, max_fee_per_gas
                )));
            }
        }

        let data = self.encode_data()?;

        Ok(TransactionRequest::new(
            chain_id,
            nonce,
            self.recipient(),
            self.amount(),
            data,
            gas_limit,
            fee,
        ))
    }
}
