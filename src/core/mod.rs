//! Core types shared by every platform: addresses, amounts, RPC constants

pub mod address;
pub mod amount;
pub mod rpc;

pub use address::{Address, ValidationError};
pub use amount::{Amount, AmountError};
