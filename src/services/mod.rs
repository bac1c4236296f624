//! Transaction lifecycle services.

pub mod abi;
pub mod builder;
pub mod confirmation;
pub mod fees;
pub mod inspector;
pub mod nonce;
pub mod signer;
pub mod submitter;
pub mod transactions;

pub use abi::{value_to_json, AbiResolver};
pub use builder::{TransactionBuilder, TransactionKind};
pub use confirmation::ConfirmationWaiter;
pub use fees::{FeeEstimator, PriorityFee};
pub use inspector::TxInspector;
pub use nonce::{NonceTracker, SenderLocks};
pub use signer::Signer;
pub use submitter::Submitter;
pub use transactions::{GasLimit, TransactionOutcome, TransactionService, TransactionSettings};
