//! InjectedProvider - `window.ethereum` behind the `WalletProvider` trait

use async_trait::async_trait;
use js_sys::{Array, Function, Object, Promise, Reflect};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::log;
use crate::core::rpc::{event, method};
use crate::provider::{AccountsListener, ListenerId, ProviderError, TransactionRequest, WalletProvider};

pub struct InjectedProvider {
    ethereum: JsValue,
    listeners: RefCell<HashMap<ListenerId, Closure<dyn Fn(JsValue)>>>,
    next_id: Cell<u64>,
}

impl InjectedProvider {
    /// `None` when the page has no injected wallet.
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if ethereum.is_undefined() || ethereum.is_null() {
            return None;
        }
        Some(Self { ethereum, listeners: RefCell::new(HashMap::new()), next_id: Cell::new(0) })
    }

    fn function(&self, name: &str) -> Result<Function, ProviderError> {
        Reflect::get(&self.ethereum, &JsValue::from_str(name))
            .map_err(js_error)?
            .dyn_into::<Function>()
            .map_err(|_| ProviderError::message(format!("provider.{} is not a function", name)))
    }

    async fn request(&self, rpc_method: &str, params: Option<JsValue>) -> Result<JsValue, ProviderError> {
        let args = Object::new();
        Reflect::set(&args, &JsValue::from_str("method"), &JsValue::from_str(rpc_method)).map_err(js_error)?;
        if let Some(params) = params {
            Reflect::set(&args, &JsValue::from_str("params"), &params).map_err(js_error)?;
        }
        let promise = self
            .function("request")?
            .call1(&self.ethereum, &args)
            .map_err(js_error)?
            .dyn_into::<Promise>()
            .map_err(|_| ProviderError::message("provider.request did not return a promise"))?;
        JsFuture::from(promise).await.map_err(js_error)
    }
}

/// `{ code, message }` from a rejected provider promise.
fn js_error(value: JsValue) -> ProviderError {
    let field = |name: &str| {
        if value.is_object() { Reflect::get(&value, &JsValue::from_str(name)).ok() } else { None }
    };
    let code = field("code").and_then(|c| c.as_f64()).map(|c| c as i64);
    let message = field("message")
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value));
    ProviderError { code, message }
}

fn string_array(value: &JsValue) -> Vec<String> {
    if !Array::is_array(value) {
        return Vec::new();
    }
    Array::from(value).iter().filter_map(|v| v.as_string()).collect()
}

#[async_trait(?Send)]
impl WalletProvider for InjectedProvider {
    fn is_available(&self) -> bool {
        self.function("request").is_ok()
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        Ok(string_array(&self.request(method::REQUEST_ACCOUNTS, None).await?))
    }

    async fn get_accounts(&self) -> Result<Vec<String>, ProviderError> {
        Ok(string_array(&self.request(method::ACCOUNTS, None).await?))
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, ProviderError> {
        let params = Array::of1(
            &serde_wasm_bindgen::to_value(tx).map_err(|e| ProviderError::message(e.to_string()))?,
        );
        self.request(method::SEND_TRANSACTION, Some(params.into()))
            .await?
            .as_string()
            .ok_or_else(|| ProviderError::message("eth_sendTransaction returned no transaction hash"))
    }

    fn subscribe_accounts(&self, listener: AccountsListener) -> ListenerId {
        let id = ListenerId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        let closure = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| listener(string_array(&value)));
        let registered = self
            .function("on")
            .and_then(|on| {
                on.call2(&self.ethereum, &JsValue::from_str(event::ACCOUNTS_CHANGED), closure.as_ref())
                    .map_err(js_error)
            });
        if let Err(e) = registered {
            log!("[beepay] accountsChanged subscription failed: {}", e);
        }
        self.listeners.borrow_mut().insert(id, closure);
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        let Some(closure) = self.listeners.borrow_mut().remove(&id) else { return };
        let removed = self
            .function("removeListener")
            .and_then(|off| {
                off.call2(&self.ethereum, &JsValue::from_str(event::ACCOUNTS_CHANGED), closure.as_ref())
                    .map_err(js_error)
            });
        if let Err(e) = removed {
            log!("[beepay] accountsChanged removeListener failed: {}", e);
        }
    }
}
