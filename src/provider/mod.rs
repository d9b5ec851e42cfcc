//! Provider - the wallet boundary
//!
//! Everything the payment flow needs from a wallet goes through
//! [`WalletProvider`]. The browser adapter (`wasm::InjectedProvider`) wraps
//! `window.ethereum`; [`MockProvider`] scripts responses for tests and the
//! CLI simulator.
//!
//! ```text
//! WalletSessionManager ──► dyn WalletProvider
//!                               │
//!                 ┌─────────────┴─────────────┐
//!                 ▼                           ▼
//!         InjectedProvider               MockProvider
//!         (EIP-1193, wasm)           (scripted, native/tests)
//! ```
//!
//! Provider calls are the only suspension points in the flow. Futures are
//! `?Send`: the browser is single-threaded and so is everything above this.

mod classify;
pub mod mock;

pub use classify::{classify_connect, classify_send, ConnectError, SendError};
pub use mock::{MockCall, MockProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Raw error as reported by the provider (`{ code, message }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code: Some(code), message: message.into() }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// `eth_sendTransaction` params. `value` is hex-encoded wei.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    pub value: String,
}

/// Handle returned by [`WalletProvider::subscribe_accounts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Called with the full (possibly empty) account list on every change.
pub type AccountsListener = Rc<dyn Fn(Vec<String>)>;

#[async_trait(?Send)]
pub trait WalletProvider {
    /// Whether an injected wallet is actually present.
    fn is_available(&self) -> bool;

    /// Prompt the user for account access (`eth_requestAccounts`).
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Already-authorized accounts, no prompt (`eth_accounts`).
    async fn get_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Ask the user to sign and submit. Resolves with the transaction hash
    /// as soon as the wallet hands it back.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, ProviderError>;

    fn subscribe_accounts(&self, listener: AccountsListener) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId);
}
