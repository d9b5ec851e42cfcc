//! WASM module: the payment flow in the browser
//!
//! Provides the JS-facing checkout over the injected `window.ethereum`:
//! - InjectedProvider: EIP-1193 adapter implementing `WalletProvider`
//! - WasmCheckout: session + flow + status views via wasm-bindgen
//! - WindowNavigator: post-success redirect through `setTimeout`
//!
//! Architecture:
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          WasmCheckout (JS API)          │
//! │  restore, connect, pay, status, reset   │
//! │  onStatus, onAccountChange, quote       │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │        PaymentFlow (state machine)      │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │          WalletSessionManager           │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │   InjectedProvider (window.ethereum)    │
//! └─────────────────────────────────────────┘
//! ```

mod checkout;
mod provider;

pub use checkout::{AccountWatch, WasmCheckout, WindowNavigator};
pub use provider::InjectedProvider;

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;
