//! Sender account.

use alloy::{primitives::Address, signers::local::PrivateKeySigner};

use crate::error::{AppError, Result};

/// The sending account: owns the private key and exposes its address.
///
/// The key never leaves this type except through [`Account::signer`], which
/// only the signing component uses. `Debug` prints the address alone.
#[derive(Clone)]
pub struct Account {
    /// The local signer.
    signer: PrivateKeySigner,
    /// Derived address.
    address: Address,
}

impl Account {
    /// Create an account from a hex private key (with or without `0x`).
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let signer: PrivateKeySigner =
            key.parse().map_err(|e: alloy::signers::local::LocalSignerError| {
                AppError::Wallet(e.to_string())
            })?;

        let address = signer.address();

        tracing::info!(address = %address, "Account loaded");

        Ok(Self { signer, address })
    }

    /// Get the account address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the signer for transaction signing.
    pub(crate) fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account").field("address", &self.address).finish()
    }
}
