//! Contract-related types.

use alloy::{
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    primitives::{Address, Bytes, B256},
};
use serde::Serialize;

use super::receipt::Receipt;

/// Getter names tried, in order, when the caller does not name one.
pub const GETTER_CANDIDATES: [&str; 4] = ["getValue", "retrieve", "get", "value"];

/// A deployed contract and its interface description.
#[derive(Debug, Clone)]
pub struct ContractBinding {
    /// Deployed address.
    pub address: Address,
    /// Interface description.
    pub abi: JsonAbi,
}

impl ContractBinding {
    pub fn new(address: Address, abi: JsonAbi) -> Self {
        Self { address, abi }
    }
}

/// Compiled contract ready for deployment.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// Contract name, used as the artifact key.
    pub name: String,
    /// Interface description.
    pub abi: JsonAbi,
    /// Creation bytecode.
    pub bytecode: Bytes,
}

/// How to pick the function to read from.
#[derive(Debug, Clone, Copy)]
pub enum FunctionSelector<'a> {
    /// Exactly this name.
    Exact(&'a str),
    /// The first of these names the contract exposes.
    FirstOf(&'a [&'a str]),
}

impl Default for FunctionSelector<'static> {
    fn default() -> Self {
        FunctionSelector::FirstOf(&GETTER_CANDIDATES)
    }
}

/// Result of a successful deployment.
#[derive(Debug, Clone, Serialize)]
pub struct Deployment {
    /// Created contract address.
    pub address: Address,
    /// Deployment transaction hash.
    pub transaction_hash: B256,
    /// Receipt of the deployment transaction.
    pub receipt: Receipt,
}

/// Decoded return values of a read-only call.
#[derive(Debug, Clone)]
pub struct ContractRead {
    /// Contract that was called.
    pub contract: Address,
    /// Name of the function that was resolved and called.
    pub function: String,
    /// Decoded outputs, in declaration order.
    pub values: Vec<DynSolValue>,
}
