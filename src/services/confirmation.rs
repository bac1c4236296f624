//! Receipt polling.

use std::{sync::Arc, time::Duration};

use alloy::primitives::B256;
use tokio::time::{sleep_until, timeout_at, Instant};

use crate::{
    error::{AppError, Result},
    ethereum::{
        constants::{DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_POLL_INTERVAL},
        ChainRpc,
    },
    types::{Confirmation, Receipt},
};

/// Waits for a submitted transaction to be mined.
#[derive(Clone)]
pub struct ConfirmationWaiter {
    rpc: Arc<dyn ChainRpc>,
    poll_interval: Duration,
    timeout: Duration,
}

impl ConfirmationWaiter {
    pub fn new(rpc: Arc<dyn ChainRpc>, poll_interval: Duration, timeout: Duration) -> Self {
        Self { rpc, poll_interval, timeout }
    }

    /// Waiter with the default 100ms interval and 120s timeout.
    pub fn with_defaults(rpc: Arc<dyn ChainRpc>) -> Self {
        Self::new(rpc, DEFAULT_POLL_INTERVAL, DEFAULT_CONFIRMATION_TIMEOUT)
    }

    /// Poll until a receipt for `hash` appears or the timeout elapses.
    ///
    /// Returns within the timeout plus one poll interval. A receipt with a
    /// failed status is still `Mined`.
    pub async fn wait(&self, hash: B256) -> Result<Confirmation> {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let hard_stop = deadline + self.poll_interval;
        let mut polls = 0u32;

        loop {
            polls += 1;
            let receipt = match timeout_at(hard_stop, self.rpc.receipt(hash)).await {
                Ok(result) => result?,
                Err(_) => None,
            };

            if let Some(receipt) = receipt {
                tracing::info!(
                    hash = %hash,
                    block = receipt.block_number,
                    status = ?receipt.status,
                    gas_used = receipt.gas_used,
                    polls = polls,
                    "Transaction mined"
                );
                return Ok(Confirmation::Mined(receipt));
            }

            let now = Instant::now();
            if now >= deadline {
                let waited = now.duration_since(started);
                tracing::warn!(
                    hash = %hash,
                    waited_ms = waited.as_millis() as u64,
                    polls = polls,
                    "Gave up waiting for receipt"
                );
                return Ok(Confirmation::TimedOut { hash, waited });
            }

            sleep_until((now + self.poll_interval).min(deadline)).await;
        }
    }

    /// Like [`Self::wait`], but a timeout is an error.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<Receipt> {
        match self.wait(hash).await? {
            Confirmation::Mined(receipt) => Ok(receipt),
            Confirmation::TimedOut { hash, waited } => {
                Err(AppError::Timeout { hash, waited_ms: waited.as_millis() as u64 })
            }
        }
    }
}
