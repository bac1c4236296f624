//! Type definitions module.
//!
//! Contains shared types used across the application.

pub mod balance;
pub mod contract;
pub mod receipt;
pub mod transaction;

pub use balance::*;
pub use contract::*;
pub use receipt::*;
pub use transaction::*;
