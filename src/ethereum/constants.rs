//! Ethereum network constants.
//!
//! Chain IDs, unit sizes and the defaults used by the transaction pipeline.

use std::time::Duration;

// ============================================================================
// Chain IDs
// ============================================================================

/// Default chain ID of local development nodes (Anvil, Hardhat).
pub const LOCAL_DEV_CHAIN_ID: u64 = 31337;

// ============================================================================
// Units
// ============================================================================

/// Wei per gwei.
pub const GWEI: u128 = 1_000_000_000;

// ============================================================================
// Fees
// ============================================================================

/// Fixed priority fee used unless configured otherwise (1 gwei).
pub const DEFAULT_PRIORITY_FEE: u128 = GWEI;

/// Priority fee used when the node cannot suggest one (2 gwei).
pub const FALLBACK_PRIORITY_FEE: u128 = 2 * GWEI;

// ============================================================================
// Gas limits
// ============================================================================

/// Gas for a plain value transfer.
pub const TRANSFER_GAS: u64 = 21_000;

/// Gas limit for contract deployment.
pub const DEFAULT_DEPLOY_GAS_LIMIT: u64 = 2_000_000;

/// Gas limit for contract method calls.
pub const DEFAULT_CALL_GAS_LIMIT: u64 = 200_000;

// ============================================================================
// Timing
// ============================================================================

/// Upper bound for a single RPC call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for a receipt before giving up.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Delay between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
