//! Block-explorer balance types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Satoshis per bitcoin.
pub const SAT_PER_BTC: i64 = 100_000_000;

/// Funding totals for one side (chain or mempool) of an Esplora address record.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TxoStats {
    pub funded_txo_sum: i64,
    pub spent_txo_sum: i64,
}

impl TxoStats {
    /// Funded minus spent, `None` on overflow.
    pub fn net(&self) -> Option<i64> {
        self.funded_txo_sum.checked_sub(self.spent_txo_sum)
    }
}

/// Esplora `GET /address/{address}` response (fields this crate reads).
#[derive(Debug, Clone, Deserialize)]
pub struct EsploraAddress {
    pub address: String,
    pub chain_stats: TxoStats,
    pub mempool_stats: TxoStats,
}

/// Address balance split into confirmed and unconfirmed parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBalance {
    pub address: String,
    pub confirmed_sats: i64,
    pub mempool_delta_sats: i64,
    pub total_sats: i64,
    /// Total in BTC with eight decimal places.
    pub total_btc: Decimal,
}

impl TryFrom<EsploraAddress> for AddressBalance {
    type Error = AppError;

    fn try_from(record: EsploraAddress) -> Result<Self, Self::Error> {
        let out_of_range =
            || AppError::Explorer(format!("balance of {} is out of range", record.address));

        let confirmed_sats = record.chain_stats.net().ok_or_else(out_of_range)?;
        let mempool_delta_sats = record.mempool_stats.net().ok_or_else(out_of_range)?;
        let total_sats = confirmed_sats.checked_add(mempool_delta_sats).ok_or_else(out_of_range)?;

        Ok(Self {
            address: record.address,
            confirmed_sats,
            mempool_delta_sats,
            total_sats,
            total_btc: Decimal::new(total_sats, 8),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "address": "tb1qexample",
        "chain_stats": {"funded_txo_count": 2, "funded_txo_sum": 150000, "spent_txo_count": 1, "spent_txo_sum": 50000, "tx_count": 3},
        "mempool_stats": {"funded_txo_count": 0, "funded_txo_sum": 0, "spent_txo_count": 1, "spent_txo_sum": 20000, "tx_count": 1}
    }"#;

    #[test]
    fn test_address_balance_from_esplora_record() {
        let record: EsploraAddress = serde_json::from_str(SAMPLE).unwrap();
        let balance = AddressBalance::try_from(record).unwrap();

        assert_eq!(balance.address, "tb1qexample");
        assert_eq!(balance.confirmed_sats, 100_000);
        assert_eq!(balance.mempool_delta_sats, -20_000);
        assert_eq!(balance.total_sats, 80_000);
        assert_eq!(balance.total_btc.to_string(), "0.00080000");
    }

    #[test]
    fn test_total_btc_whole_coin() {
        let record = EsploraAddress {
            address: "tb1q".to_string(),
            chain_stats: TxoStats { funded_txo_sum: SAT_PER_BTC, spent_txo_sum: 0 },
            mempool_stats: TxoStats::default(),
        };
        let balance = AddressBalance::try_from(record).unwrap();
        assert_eq!(balance.total_btc, Decimal::ONE);
    }

    #[test]
    fn test_overflowing_stats_are_rejected() {
        let spent_too_much = EsploraAddress {
            address: "tb1q".to_string(),
            chain_stats: TxoStats { funded_txo_sum: i64::MIN, spent_txo_sum: 1 },
            mempool_stats: TxoStats::default(),
        };
        assert!(matches!(
            AddressBalance::try_from(spent_too_much),
            Err(AppError::Explorer(_))
        ));

        let total_too_large = EsploraAddress {
            address: "tb1q".to_string(),
            chain_stats: TxoStats { funded_txo_sum: i64::MAX, spent_txo_sum: 0 },
            mempool_stats: TxoStats { funded_txo_sum: 1, spent_txo_sum: 0 },
        };
        assert!(matches!(
            AddressBalance::try_from(total_too_large),
            Err(AppError::Explorer(_))
        ));
    }
}
