//! Ethereum Transaction MCP Server Library
//!
//! Builds, signs, submits and confirms Ethereum transactions from a single
//! account, with ABI-driven contract calls, and exposes the workflows as
//! Model Context Protocol tools.
//!
//! # Features
//!
//! - **Fee Estimation**: EIP-1559 quotes from the latest base fee, legacy gas price otherwise
//! - **Nonce Management**: Pending or latest transaction count, serialized per sender
//! - **Contract Dispatch**: Deploy, invoke and read contracts by function name
//! - **Confirmation**: Bounded receipt polling
//!
//! # Example
//!
//! ```rust,ignore
//! use ethereum_tx_mcp::{Config, EthereumTxServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let server = EthereumTxServer::new(config)?;
//!     // Run server...
//!     Ok(())
//! }
//! ```

pub mod artifacts;
pub mod config;
pub mod error;
pub mod ethereum;
pub mod explorer;
pub mod mcp;
pub mod services;
pub mod types;

pub use config::Config;
pub use error::{AppError, Result};
pub use ethereum::constants::*;
pub use mcp::EthereumTxServer;
