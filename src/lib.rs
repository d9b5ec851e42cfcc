//! Beepay: wallet connect-and-pay. Detect, connect, confirm, send, settle.
//!
//! # Architecture
//!
//! ```text
//! UI (browser via wasm, or the CLI simulator)
//!   │
//!   ├── PaymentFlow (flow)            validate → connect → confirm → send → settle
//!   │     │                           re-entrancy guard, status watchers, redirect
//!   │     ▼
//!   ├── WalletSessionManager (session) detect, restore, connect, accountsChanged, send
//!   │     │
//!   │     ▼
//!   ├── dyn WalletProvider (provider)  InjectedProvider (window.ethereum) | MockProvider
//!   │
//!   └── present()  (present)          TransactionStatus → icon / title / message / tone
//! ```
//!
//! # States
//!
//! | State | Meaning |
//! |-------|---------|
//! | `idle` | Nothing in flight |
//! | `connecting` | Waiting for the wallet to grant accounts |
//! | `awaiting_confirmation` | Waiting for the user to sign in the wallet |
//! | `sending` | Wallet returned a transaction hash |
//! | `success` | Payment submitted (not confirmed on-chain) |
//! | `error` | Failed; `submit` again to retry |
//!
//! # Features
//!
//! - `native` - CLI, simulator, tracing subscriber, tokio
//! - `wasm` - Browser bindings over the injected EIP-1193 provider
//!
//! # Usage
//!
//! ```ignore
//! use beepay::{Address, Amount, PaymentConfig, PaymentFlow, WalletSessionManager};
//! use std::rc::Rc;
//!
//! let session = Rc::new(WalletSessionManager::new(Some(provider)));
//! session.detect_provider();
//! let flow = PaymentFlow::new(
//!     session,
//!     PaymentConfig::new(Address::parse("0x…")?, Amount::parse_decimal("2.1")?),
//! );
//! let txid = flow.submit("0x…token…").await?;
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod config;
pub mod core;
pub mod flow;
pub mod present;
pub mod provider;
pub mod session;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use config::{ConfigError, PaymentConfig, Plan, RedirectConfig};
pub use crate::core::{Address, Amount, AmountError, ValidationError};
pub use flow::{FlowError, FlowState, Navigator, PaymentFlow, PaymentRequest, TransactionStatus};
pub use present::{present, Icon, StatusView, Tone};
pub use provider::{
    ConnectError, MockCall, MockProvider, ProviderError, SendError, TransactionRequest, WalletProvider,
};
pub use session::{AccountSubscription, TransactionId, WalletSession, WalletSessionManager};

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(feature = "wasm")]
pub use wasm::{InjectedProvider, WasmCheckout};
