//! Nonce lookup and per-sender serialization.
//!
//! The node is the only source of truth for nonces: nothing is cached here.
//! Two processes sending from the same account can still observe the same
//! nonce and race; one of them will then be rejected by the node. Within one
//! process, [`SenderLocks`] serializes the build-to-submit window per account.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{error::Result, ethereum::ChainRpc, types::NoncePolicy};

/// Obtains the next nonce for a sender.
#[derive(Clone)]
pub struct NonceTracker {
    rpc: Arc<dyn ChainRpc>,
}

impl NonceTracker {
    /// Create a new nonce tracker.
    pub fn new(rpc: Arc<dyn ChainRpc>) -> Self {
        Self { rpc }
    }

    /// Transaction count of `address` under `policy`, which is the nonce of its
    /// next transaction.
    pub async fn next_nonce(&self, address: Address, policy: NoncePolicy) -> Result<u64> {
        let nonce = self.rpc.transaction_count(address, policy).await?;
        tracing::debug!(address = %address, policy = ?policy, nonce = nonce, "Nonce fetched");
        Ok(nonce)
    }
}

/// One async mutex per sender address.
#[derive(Default)]
pub struct SenderLocks {
    locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `address`. Released when the guard drops.
    pub async fn acquire(&self, address: Address) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(address).or_default().clone()
        };
        lock.lock_owned().await
    }
}
