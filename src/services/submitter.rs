//! Raw transaction submission.

use std::sync::Arc;

use alloy::primitives::B256;

use crate::{error::Result, ethereum::ChainRpc, types::SignedTransaction};

/// Broadcasts signed transactions.
///
/// One attempt per call. Resubmitting the same bytes is left to the caller;
/// the node answers with a [`crate::AppError::ChainRejection`] such as
/// "already known" or "nonce too low".
#[derive(Clone)]
pub struct Submitter {
    rpc: Arc<dyn ChainRpc>,
}

impl Submitter {
    pub fn new(rpc: Arc<dyn ChainRpc>) -> Self {
        Self { rpc }
    }

    /// Submit and return the hash the node acknowledged.
    pub async fn submit(&self, tx: &SignedTransaction) -> Result<B256> {
        let acknowledged = self.rpc.send_raw_transaction(tx.raw()).await?;

        if acknowledged != tx.hash() {
            tracing::warn!(
                local = %tx.hash(),
                node = %acknowledged,
                "Node acknowledged a different transaction hash"
            );
        }

        tracing::info!(hash = %acknowledged, "Transaction submitted");

        Ok(acknowledged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, ethereum::rpc::MockChainRpc};
    use alloy::primitives::{keccak256, Bytes};

    fn signed() -> SignedTransaction {
        let raw = Bytes::from(vec![0x02, 0x01, 0x02]);
        let hash = keccak256(&raw);
        SignedTransaction::new(raw, hash)
    }

    #[tokio::test]
    async fn test_submit_returns_node_hash() {
        let tx = signed();
        let expected = tx.hash();

        let mut rpc = MockChainRpc::new();
        rpc.expect_send_raw_transaction()
            .withf(|raw: &[u8]| raw == [0x02, 0x01, 0x02])
            .times(1)
            .returning(move |_| Ok(expected));

        let submitter = Submitter::new(Arc::new(rpc));
        assert_eq!(submitter.submit(&tx).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_submit_rejection_propagates() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_send_raw_transaction()
            .returning(|_| Err(AppError::rejection("eth_sendRawTransaction", "nonce too low")));

        let submitter = Submitter::new(Arc::new(rpc));
        match submitter.submit(&signed()).await {
            Err(AppError::ChainRejection { message, .. }) => assert_eq!(message, "nonce too low"),
            other => panic!("Expected ChainRejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_transport_failure_propagates() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_send_raw_transaction()
            .returning(|_| Err(AppError::transport("eth_sendRawTransaction", "connection reset")));

        let submitter = Submitter::new(Arc::new(rpc));
        assert!(matches!(submitter.submit(&signed()).await, Err(AppError::Transport { .. })));
    }
}
