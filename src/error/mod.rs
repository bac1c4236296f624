//! Error types and handling module.
//!
//! Defines all application-specific error types and conversions.

use alloy::primitives::B256;
use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The node could not be reached, answered with a protocol-level error,
    /// or did not answer within the per-call timeout.
    #[error("Transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    /// Caller-supplied transaction parameters are incomplete or inconsistent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// ABI lookup failed.
    #[error("Function not found: requested {requested:?}, available {available:?}")]
    FunctionNotFound { requested: Vec<String>, available: Vec<String> },

    /// The node accepted the RPC call but rejected the transaction itself.
    /// `message` is the node's text, unmodified.
    #[error("Rejected by node during {operation}: {message}")]
    ChainRejection { operation: String, message: String },

    /// Confirmation polling exceeded its deadline. The transaction may still be mined.
    #[error("Timed out after {waited_ms}ms waiting for transaction {hash}")]
    Timeout { hash: B256, waited_ms: u64 },

    /// The node accepted the transaction but its receipt could not be fetched.
    /// Resending would use the next nonce; look up `hash` instead.
    #[error("Transaction {hash} was submitted but not confirmed: {source}")]
    Unconfirmed { hash: B256, source: Box<AppError> },

    /// Invalid Ethereum address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Transaction unknown to the node.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(B256),

    /// Wallet-related errors.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// ABI encoding or decoding failure.
    #[error("ABI error: {0}")]
    Abi(String),

    /// Artifact store failure.
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Block explorer failure.
    #[error("Explorer error: {0}")]
    Explorer(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Numeric overflow during conversion.
    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),
}

impl AppError {
    /// Build a transport error for the named RPC operation.
    pub fn transport(operation: &str, message: impl Into<String>) -> Self {
        AppError::Transport { operation: operation.to_string(), message: message.into() }
    }

    /// Build a node rejection for the named RPC operation.
    pub fn rejection(operation: &str, message: impl Into<String>) -> Self {
        AppError::ChainRejection { operation: operation.to_string(), message: message.into() }
    }
}

impl From<alloy::signers::local::LocalSignerError> for AppError {
    fn from(err: alloy::signers::local::LocalSignerError) -> Self {
        AppError::Wallet(err.to_string())
    }
}

impl From<alloy::signers::Error> for AppError {
    fn from(err: alloy::signers::Error) -> Self {
        AppError::Wallet(err.to_string())
    }
}

impl From<alloy::dyn_abi::Error> for AppError {
    fn from(err: alloy::dyn_abi::Error) -> Self {
        AppError::Abi(err.to_string())
    }
}

impl From<alloy::hex::FromHexError> for AppError {
    fn from(err: alloy::hex::FromHexError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Explorer(err.to_string())
    }
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidAddress(_)
            | AppError::Validation(_)
            | AppError::FunctionNotFound { .. }
            | AppError::TransactionNotFound(_)
            | AppError::Parse(_)
            | AppError::NumericOverflow(_) => McpError::invalid_params(err.to_string(), None),
            AppError::Config(_) => McpError::invalid_request(err.to_string(), None),
            _ => McpError::internal_error(err.to_string(), None),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
