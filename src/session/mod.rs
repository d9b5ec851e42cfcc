//! Wallet Session Manager - provider detection, account access, payments
//!
//! # Lifecycle
//!
//! ```text
//! page load ──► detect_provider() ──► restore()          (silent, eth_accounts)
//!                     │
//! user action ──► connect()                              (prompt, eth_requestAccounts)
//!                     │
//!                     ├── on_accounts_changed(cb) ──► session updated, cb(account)
//!                     │
//!                     └── send_payment(from, to, amount) (prompt, eth_sendTransaction)
//! ```
//!
//! The session is shared (`Rc<RefCell<_>>`) with the account-change listener.
//! Every account change bumps [`WalletSession::generation`] so a caller that
//! captured a generation before an await can tell whether it is stale.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{Address, Amount};
use crate::provider::{
    classify_connect, classify_send, ConnectError, ListenerId, SendError, TransactionRequest,
    WalletProvider,
};

/// Opaque handle returned on submission; not proof of inclusion.
pub type TransactionId = String;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletSession {
    pub account: Option<Address>,
    pub generation: u64,
}

impl WalletSession {
    fn set_account(&mut self, account: Option<Address>) {
        if self.account != account {
            self.account = account;
            self.generation += 1;
        }
    }
}

/// Unsubscribes from provider account notifications when dropped.
pub struct AccountSubscription {
    provider: Option<Rc<dyn WalletProvider>>,
    id: Option<ListenerId>,
}

impl AccountSubscription {
    fn inert() -> Self {
        Self { provider: None, id: None }
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    fn release(&mut self) {
        if let (Some(provider), Some(id)) = (&self.provider, self.id.take()) {
            provider.unsubscribe(id);
            debug!(listener = id.0, "accountsChanged listener removed");
        }
    }
}

impl Drop for AccountSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct WalletSessionManager {
    provider: Option<Rc<dyn WalletProvider>>,
    detected: Cell<bool>,
    session: Rc<RefCell<WalletSession>>,
}

impl WalletSessionManager {
    /// `None` models a page where nothing was injected.
    pub fn new(provider: Option<Rc<dyn WalletProvider>>) -> Self {
        Self { provider, detected: Cell::new(false), session: Rc::new(RefCell::new(WalletSession::default())) }
    }

    pub fn detect_provider(&self) -> bool {
        let found = self.provider.as_ref().map(|p| p.is_available()).unwrap_or(false);
        self.detected.set(found);
        debug!(found, "wallet provider detection");
        found
    }

    pub fn is_detected(&self) -> bool {
        self.detected.get()
    }

    fn provider(&self) -> Option<&Rc<dyn WalletProvider>> {
        if !self.detected.get() && !self.detect_provider() {
            return None;
        }
        self.provider.as_ref()
    }

    pub fn session(&self) -> WalletSession {
        self.session.borrow().clone()
    }

    pub fn account(&self) -> Option<Address> {
        self.session.borrow().account.clone()
    }

    /// Fill the session from already-authorized accounts without prompting.
    pub async fn restore(&self) -> Option<Address> {
        let provider = self.provider()?.clone();
        match provider.get_accounts().await {
            Ok(accounts) => {
                let account = first_account(&accounts).ok().flatten();
                self.session.borrow_mut().set_account(account.clone());
                if let Some(a) = &account {
                    info!(account = %a, "wallet session restored");
                }
                account
            }
            Err(e) => {
                warn!(error = %e, "eth_accounts failed during restore");
                None
            }
        }
    }

    pub async fn connect(&self) -> Result<Address, ConnectError> {
        let provider = self.provider().ok_or(ConnectError::NoProviderFound)?.clone();
        let accounts = provider.request_accounts().await.map_err(|e| {
            warn!(error = %e, "eth_requestAccounts failed");
            classify_connect(&e)
        })?;
        let account = first_account(&accounts)?
            .ok_or_else(|| ConnectError::ProviderMalfunction("wallet returned no accounts".into()))?;
        self.session.borrow_mut().set_account(Some(account.clone()));
        info!(account = %account, "wallet connected");
        Ok(account)
    }

    /// Re-read authorized accounts and sync the session.
    pub async fn current_account(&self) -> Result<Option<Address>, ConnectError> {
        let provider = self.provider().ok_or(ConnectError::NoProviderFound)?.clone();
        let accounts = provider.get_accounts().await.map_err(|e| {
            warn!(error = %e, "eth_accounts failed");
            classify_connect(&e)
        })?;
        let account = first_account(&accounts)?;
        self.session.borrow_mut().set_account(account.clone());
        Ok(account)
    }

    /// Track account changes. The session is updated before `callback` runs;
    /// an empty account list arrives as `None`.
    pub fn on_accounts_changed<F>(&self, callback: F) -> AccountSubscription
    where
        F: Fn(Option<Address>) + 'static,
    {
        let Some(provider) = self.provider().cloned() else {
            return AccountSubscription::inert();
        };
        let session = self.session.clone();
        let id = provider.subscribe_accounts(Rc::new(move |accounts: Vec<String>| {
            let account = match first_account(&accounts) {
                Ok(account) => account,
                Err(e) => {
                    warn!(error = %e, "ignoring malformed accountsChanged payload");
                    return;
                }
            };
            session.borrow_mut().set_account(account.clone());
            match &account {
                Some(a) => info!(account = %a, "wallet account changed"),
                None => info!("wallet disconnected"),
            }
            callback(account);
        }));
        debug!(listener = id.0, "accountsChanged listener added");
        AccountSubscription { provider: Some(provider), id: Some(id) }
    }

    pub async fn send_payment(
        &self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<TransactionId, SendError> {
        let provider = self.provider().ok_or(SendError::NoProviderFound)?.clone();
        let request = TransactionRequest {
            from: from.to_string(),
            to: to.to_string(),
            value: amount.to_hex(),
        };
        info!(from = %from, to = %to, value = %request.value, "eth_sendTransaction");
        provider.send_transaction(&request).await.map_err(|e| {
            warn!(error = %e, "eth_sendTransaction failed");
            classify_send(&e)
        })
    }
}

fn first_account(accounts: &[String]) -> Result<Option<Address>, ConnectError> {
    accounts
        .first()
        .map(|a| {
            Address::parse(a)
                .map_err(|_| ConnectError::ProviderMalfunction(format!("wallet returned invalid account '{}'", a)))
        })
        .transpose()
}
