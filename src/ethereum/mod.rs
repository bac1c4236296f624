//! Ethereum interaction module.
//!
//! Contains the node interface, its HTTP client and the sender account.

pub mod client;
pub mod constants;
pub mod rpc;
pub mod wallet;

pub use client::{EthereumClient, HttpProvider};
pub use rpc::ChainRpc;
pub use wallet::Account;
