//! Offline transaction signing.

use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718,
    network::TxSignerSync,
    primitives::{keccak256, Signature, TxKind},
    signers::local::PrivateKeySigner,
};

use crate::{
    error::Result,
    ethereum::Account,
    types::{FeeQuote, SignedTransaction, TransactionRequest},
};

/// Turns an unsigned request into raw bytes ready for `eth_sendRawTransaction`.
///
/// The fee variant picks the envelope: legacy quotes sign a chain-id protected
/// legacy transaction, fee-market quotes sign a type-2 transaction.
pub struct Signer;

impl Signer {
    pub fn sign(request: &TransactionRequest, account: &Account) -> Result<SignedTransaction> {
        let to = match request.to() {
            Some(address) => TxKind::Call(address),
            None => TxKind::Create,
        };

        let envelope = match request.fee() {
            FeeQuote::Legacy { gas_price } => {
                let tx = TxLegacy {
                    chain_id: Some(request.chain_id()),
                    nonce: request.nonce(),
                    gas_price,
                    gas_limit: request.gas_limit(),
                    to,
                    value: request.value(),
                    input: request.data().clone(),
                };
                TxEnvelope::from(sign_with(account.signer(), tx)?)
            }
            FeeQuote::Dynamic { max_fee_per_gas, max_priority_fee_per_gas } => {
                let tx = TxEip1559 {
                    chain_id: request.chain_id(),
                    nonce: request.nonce(),
                    gas_limit: request.gas_limit(),
                    max_fee_per_gas,
                    max_priority_fee_per_gas,
                    to,
                    value: request.value(),
                    access_list: Default::default(),
                    input: request.data().clone(),
                };
                TxEnvelope::from(sign_with(account.signer(), tx)?)
            }
        };

        let raw = envelope.encoded_2718();
        let hash = keccak256(&raw);

        tracing::debug!(
            hash = %hash,
            nonce = request.nonce(),
            dynamic = request.fee().is_dynamic(),
            "Transaction signed"
        );

        Ok(SignedTransaction::new(raw.into(), hash))
    }
}

fn sign_with<T>(signer: &PrivateKeySigner, mut tx: T) -> Result<alloy::consensus::Signed<T>>
where
    T: SignableTransaction<Signature> + 'static,
{
    let signature = signer.sign_transaction_sync(&mut tx)?;
    Ok(tx.into_signed(signature))
}
