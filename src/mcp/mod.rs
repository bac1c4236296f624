//! MCP server module.
//!
//! Contains the MCP server implementation with tool handlers.

pub mod server;

pub use server::EthereumTxServer;
pub use server::{
    DeployContractInput, GetBtcBalanceInput, GetTransactionInfoInput, InvokeContractInput,
    ReadContractInput, SendEthInput,
};
