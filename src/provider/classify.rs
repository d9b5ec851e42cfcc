//! Map raw provider errors onto the closed connect/send error sets
//!
//! Codes decide first. Message substrings are a fallback for wallets that
//! report rejection or low balance with a generic code.

use super::ProviderError;
use crate::core::rpc::code;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("No wallet provider found. Please install a browser wallet extension and try again.")]
    NoProviderFound,
    #[error("Wallet connection request was rejected.")]
    UserRejected,
    #[error("Failed to connect to wallet: {0}")]
    ProviderMalfunction(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("No wallet provider found. Please install a browser wallet extension and try again.")]
    NoProviderFound,
    #[error("Transaction rejected. If this was a mistake, please try again.")]
    UserRejected,
    #[error("Insufficient funds to complete this transaction.")]
    InsufficientFunds,
    #[error("Transaction failed: {0}")]
    ProviderMalfunction(String),
}

const REJECTION_HINTS: &[&str] = &["user rejected", "user denied", "user cancelled", "user canceled"];
const INSUFFICIENT_HINTS: &[&str] = &["insufficient funds", "insufficient balance"];

fn mentions(err: &ProviderError, hints: &[&str]) -> bool {
    let message = err.message.to_ascii_lowercase();
    hints.iter().any(|hint| message.contains(hint))
}

fn is_rejection(err: &ProviderError) -> bool {
    err.code == Some(code::USER_REJECTED) || mentions(err, REJECTION_HINTS)
}

pub fn classify_connect(err: &ProviderError) -> ConnectError {
    if is_rejection(err) {
        return ConnectError::UserRejected;
    }
    ConnectError::ProviderMalfunction(err.message.clone())
}

pub fn classify_send(err: &ProviderError) -> SendError {
    if is_rejection(err) {
        return SendError::UserRejected;
    }
    let generic_code = matches!(
        err.code,
        None | Some(code::SERVER_ERROR) | Some(code::TRANSACTION_REJECTED) | Some(code::INTERNAL_ERROR)
    );
    if generic_code && mentions(err, INSUFFICIENT_HINTS) {
        return SendError::InsufficientFunds;
    }
    SendError::ProviderMalfunction(err.message.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_code_wins() {
        let err = ProviderError::new(code::USER_REJECTED, "MetaMask Tx Signature: whatever");
        assert_eq!(classify_connect(&err), ConnectError::UserRejected);
        assert_eq!(classify_send(&err), SendError::UserRejected);
    }

    #[test]
    fn rejection_by_message() {
        let err = ProviderError::message("User denied transaction signature.");
        assert_eq!(classify_send(&err), SendError::UserRejected);
    }

    #[test]
    fn insufficient_funds() {
        let err = ProviderError::new(code::SERVER_ERROR, "insufficient funds for gas * price + value");
        assert_eq!(classify_send(&err), SendError::InsufficientFunds);
        let err = ProviderError::new(code::INTERNAL_ERROR, "Internal JSON-RPC error: Insufficient Balance");
        assert_eq!(classify_send(&err), SendError::InsufficientFunds);
        let err = ProviderError::new(code::TRANSACTION_REJECTED, "insufficient funds");
        assert_eq!(classify_send(&err), SendError::InsufficientFunds);
    }

    #[test]
    fn specific_codes_are_not_reinterpreted() {
        for specific in [code::UNAUTHORIZED, code::UNSUPPORTED_METHOD, code::DISCONNECTED, code::CHAIN_DISCONNECTED] {
            let err = ProviderError::new(specific, "insufficient funds? unauthorized");
            assert_eq!(
                classify_send(&err),
                SendError::ProviderMalfunction("insufficient funds? unauthorized".into()),
                "code {specific}"
            );
        }
    }

    #[test]
    fn everything_else_is_malfunction() {
        let err = ProviderError::new(code::DISCONNECTED, "Disconnected");
        assert_eq!(classify_connect(&err), ConnectError::ProviderMalfunction("Disconnected".into()));
        assert_eq!(classify_send(&err), SendError::ProviderMalfunction("Disconnected".into()));
        let err = ProviderError::new(code::INTERNAL_ERROR, "nonce too low");
        assert_eq!(classify_send(&err), SendError::ProviderMalfunction("nonce too low".into()));
    }
}
