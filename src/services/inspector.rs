//! Transaction lookup by hash.

use std::sync::Arc;

use alloy::primitives::B256;

use crate::{
    error::{AppError, Result},
    ethereum::ChainRpc,
    types::TransactionReport,
};

/// Collects what the node knows about a transaction.
#[derive(Clone)]
pub struct TxInspector {
    rpc: Arc<dyn ChainRpc>,
}

impl TxInspector {
    pub fn new(rpc: Arc<dyn ChainRpc>) -> Self {
        Self { rpc }
    }

    /// Transaction, receipt and containing block for `hash`.
    ///
    /// Receipt and block are absent while the transaction is pending.
    pub async fn inspect(&self, hash: B256) -> Result<TransactionReport> {
        let transaction =
            self.rpc.transaction(hash).await?.ok_or(AppError::TransactionNotFound(hash))?;
        let receipt = self.rpc.receipt(hash).await?;

        let block_number =
            receipt.as_ref().map(|r| r.block_number).or(transaction.block_number);
        let block = match block_number {
            Some(number) => self.rpc.block(number).await?,
            None => None,
        };

        tracing::debug!(hash = %hash, mined = receipt.is_some(), "Transaction inspected");

        Ok(TransactionReport { transaction, receipt, block })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ethereum::rpc::MockChainRpc,
        types::{BlockSummary, Receipt, TransactionDetails, TxStatus},
    };
    use alloy::primitives::Address;
    use mockall::predicate::eq;

    const HASH: B256 = B256::repeat_byte(0x42);

    fn details(block_number: Option<u64>) -> TransactionDetails {
        TransactionDetails {
            hash: HASH,
            from: Address::repeat_byte(1),
            to: Some(Address::repeat_byte(2)),
            nonce: 3,
            value_wei: "1000".to_string(),
            gas: 21_000,
            gas_price: None,
            max_fee_per_gas: Some(202),
            max_priority_fee_per_gas: Some(2),
            block_number,
        }
    }

    #[tokio::test]
    async fn test_inspect_mined() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_transaction().returning(|_| Ok(Some(details(Some(9)))));
        rpc.expect_receipt().returning(|_| {
            Ok(Some(Receipt {
                transaction_hash: HASH,
                status: TxStatus::Success,
                block_number: 9,
                gas_used: 21_000,
                contract_address: None,
                log_count: 0,
            }))
        });
        rpc.expect_block().with(eq(9)).times(1).returning(|number| {
            Ok(Some(BlockSummary {
                number,
                hash: B256::repeat_byte(0x09),
                timestamp: 1_700_000_000,
                miner: Address::ZERO,
                transaction_count: 1,
            }))
        });

        let report = TxInspector::new(Arc::new(rpc)).inspect(HASH).await.unwrap();

        assert_eq!(report.transaction.nonce, 3);
        assert!(report.receipt.unwrap().is_success());
        assert_eq!(report.block.unwrap().number, 9);
    }

    #[tokio::test]
    async fn test_inspect_pending() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_transaction().returning(|_| Ok(Some(details(None))));
        rpc.expect_receipt().returning(|_| Ok(None));
        rpc.expect_block().never();

        let report = TxInspector::new(Arc::new(rpc)).inspect(HASH).await.unwrap();

        assert!(report.receipt.is_none());
        assert!(report.block.is_none());
    }

    #[tokio::test]
    async fn test_inspect_unknown() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_transaction().returning(|_| Ok(None));
        rpc.expect_receipt().never();

        match TxInspector::new(Arc::new(rpc)).inspect(HASH).await {
            Err(AppError::TransactionNotFound(hash)) => assert_eq!(hash, HASH),
            other => panic!("Expected TransactionNotFound, got {:?}", other),
        }
    }
}
