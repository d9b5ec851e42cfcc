//! WasmCheckout: the payment flow exposed to JavaScript
//!
//! # Usage from JavaScript
//!
//! ```javascript
//! import { WasmCheckout } from 'beepay';
//!
//! const checkout = new WasmCheckout({
//!     recipient: '0x…',
//!     amount: '2.1',
//!     plans: [{ name: 'standard', amount: '1.1' }],
//!     redirect: { url: 'https://shop.example/thanks', delay_ms: 3000 },
//! });
//!
//! await checkout.restore();                 // silent, no prompt
//! checkout.onStatus(s => render(s.view));  // every transition
//! const watch = checkout.onAccountChange(a => showAccount(a));
//!
//! payButton.onclick = () => checkout.pay(tokenInput.value, 'standard');
//!
//! // teardown
//! watch.free();
//! ```

use serde::Serialize;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::log;
use super::provider::InjectedProvider;
use crate::config::PaymentConfig;
use crate::core::{Address, Amount};
use crate::flow::{Navigator, PaymentFlow, TransactionStatus};
use crate::present::{present, StatusView};
use crate::provider::WalletProvider;
use crate::session::{AccountSubscription, WalletSessionManager};

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Redirects through `window.location` after `delay`.
pub struct WindowNavigator;

impl Navigator for WindowNavigator {
    fn schedule_redirect(&self, url: &str, delay: Duration) {
        let Some(window) = web_sys::window() else { return };
        let url = url.to_string();
        let callback = Closure::once_into_js(move || {
            if let Some(window) = web_sys::window() {
                if let Err(e) = window.location().set_href(&url) {
                    log!("[beepay] redirect failed: {:?}", e);
                }
            }
        });
        let delay_ms = delay.as_millis().min(i32::MAX as u128) as i32;
        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay_ms) {
            log!("[beepay] setTimeout failed: {:?}", e);
        }
    }
}

#[derive(Serialize)]
struct StatusPayload {
    #[serde(flatten)]
    status: TransactionStatus,
    view: StatusView,
}

fn status_payload(status: TransactionStatus) -> JsValue {
    let view = present(Some(&status));
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    StatusPayload { status, view }.serialize(&serializer).unwrap_or(JsValue::NULL)
}

#[derive(Serialize)]
struct QuotePayload {
    recipient: Address,
    asset: String,
    amount: Amount,
    wei: String,
    value: String,
}

/// Keeps an `accountsChanged` listener alive; `free()` it on teardown.
#[wasm_bindgen]
pub struct AccountWatch {
    _subscription: AccountSubscription,
}

#[wasm_bindgen]
pub struct WasmCheckout {
    flow: Rc<PaymentFlow>,
}

#[wasm_bindgen]
impl WasmCheckout {
    /// Create a checkout from a config object; detects `window.ethereum`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmCheckout, JsValue> {
        let json: serde_json::Value = serde_wasm_bindgen::from_value(config).map_err(to_js)?;
        let config = PaymentConfig::from_json(json).map_err(to_js)?;

        let provider = InjectedProvider::detect().map(|p| Rc::new(p) as Rc<dyn WalletProvider>);
        let session = Rc::new(WalletSessionManager::new(provider));
        let detected = session.detect_provider();
        log!("[beepay] wallet provider detected: {}", detected);

        let flow = PaymentFlow::new(session, config).with_navigator(Rc::new(WindowNavigator));
        Ok(Self { flow: Rc::new(flow) })
    }

    #[wasm_bindgen(js_name = "isValidAddress")]
    pub fn is_valid_address(input: &str) -> bool {
        Address::is_valid(input)
    }

    #[wasm_bindgen(js_name = "hasProvider")]
    pub fn has_provider(&self) -> bool {
        self.flow.session().is_detected()
    }

    #[wasm_bindgen(getter)]
    pub fn account(&self) -> Option<String> {
        self.flow.session().account().map(|a| a.to_string())
    }

    /// Pick up an already-authorized account without prompting.
    #[wasm_bindgen]
    pub async fn restore(&self) -> Option<String> {
        self.flow.session().restore().await.map(|a| a.to_string())
    }

    /// Connect without paying (the "Connect Wallet" button).
    #[wasm_bindgen]
    pub async fn connect(&self) -> Result<String, JsValue> {
        self.flow.session().connect().await.map(|a| a.to_string()).map_err(to_js)
    }

    /// Run the payment flow. Resolves with the transaction hash.
    #[wasm_bindgen]
    pub async fn pay(&self, token_address: String, plan: Option<String>) -> Result<String, JsValue> {
        let result = match plan {
            Some(plan) => self.flow.submit_plan(&token_address, &plan).await,
            None => self.flow.submit(&token_address).await,
        };
        result.map_err(to_js)
    }

    /// `{ state, message, view: { icon, title, message, tone } }`
    #[wasm_bindgen]
    pub fn status(&self) -> JsValue {
        status_payload(self.flow.status())
    }

    #[wasm_bindgen]
    pub fn reset(&self) -> Result<(), JsValue> {
        self.flow.reset().map_err(to_js)
    }

    /// Amount and recipient the user is about to approve.
    #[wasm_bindgen]
    pub fn quote(&self, plan: Option<String>) -> Result<JsValue, JsValue> {
        let config = self.flow.config();
        let amount = match plan {
            Some(name) => config.plan(&name).ok_or_else(|| to_js(format!("Unknown plan '{}'.", name)))?.amount,
            None => config.amount,
        };
        let payload = QuotePayload {
            recipient: config.recipient.clone(),
            asset: config.asset.clone(),
            amount,
            wei: amount.wei().to_string(),
            value: amount.to_hex(),
        };
        serde_wasm_bindgen::to_value(&payload).map_err(to_js)
    }

    /// Call `callback(status)` on every transition.
    #[wasm_bindgen(js_name = "onStatus")]
    pub fn on_status(&self, callback: js_sys::Function) {
        let rx = self.flow.watch();
        wasm_bindgen_futures::spawn_local(async move {
            use futures::StreamExt;
            let mut rx = rx;
            while let Some(status) = rx.next().await {
                let _ = callback.call1(&JsValue::NULL, &status_payload(status));
            }
        });
    }

    /// Call `callback(account | null)` when the wallet switches accounts.
    #[wasm_bindgen(js_name = "onAccountChange")]
    pub fn on_account_change(&self, callback: js_sys::Function) -> AccountWatch {
        let subscription = self.flow.session().on_accounts_changed(move |account| {
            let value = account.map(|a| JsValue::from_str(a.as_str())).unwrap_or(JsValue::NULL);
            let _ = callback.call1(&JsValue::NULL, &value);
        });
        AccountWatch { _subscription: subscription }
    }
}
