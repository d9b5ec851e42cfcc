//! MockProvider - scripted wallet for tests and the CLI simulator
//!
//! Clones share state, so a test can keep one handle while the session
//! manager owns another. `hold` parks the next call of a kind until the
//! returned sender fires (or is dropped), which is how tests interleave
//! account changes and duplicate submissions with an in-flight request.

use async_trait::async_trait;
use futures::channel::oneshot;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{AccountsListener, ListenerId, ProviderError, TransactionRequest, WalletProvider};
use crate::core::rpc::code;

pub const MOCK_TX_HASH: &str = "0x5d1c2b0a3f4e6d7c8b9a0f1e2d3c4b5a69788796a5b4c3d2e1f0a9b8c7d6e5f4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    RequestAccounts,
    GetAccounts,
    SendTransaction,
}

struct MockState {
    available: bool,
    accounts: Vec<String>,
    authorized: bool,
    connect_error: Option<ProviderError>,
    accounts_error: Option<ProviderError>,
    send_result: Result<String, ProviderError>,
    listeners: Vec<(ListenerId, AccountsListener)>,
    next_listener: u64,
    calls: HashMap<MockCall, usize>,
    sent: Vec<TransactionRequest>,
    holds: HashMap<MockCall, oneshot::Receiver<()>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            available: true,
            accounts: Vec::new(),
            authorized: false,
            connect_error: None,
            accounts_error: None,
            send_result: Ok(MOCK_TX_HASH.into()),
            listeners: Vec::new(),
            next_listener: 0,
            calls: HashMap::new(),
            sent: Vec::new(),
            holds: HashMap::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockProvider {
    state: Rc<RefCell<MockState>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks like no wallet extension is installed.
    pub fn unavailable() -> Self {
        let mock = Self::new();
        mock.state.borrow_mut().available = false;
        mock
    }

    /// Accounts granted once the user approves `request_accounts`.
    pub fn with_accounts(self, accounts: &[&str]) -> Self {
        self.state.borrow_mut().accounts = accounts.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Accounts are already authorized, so `get_accounts` returns them.
    pub fn authorized(self) -> Self {
        self.state.borrow_mut().authorized = true;
        self
    }

    pub fn with_connect_error(self, err: ProviderError) -> Self {
        self.state.borrow_mut().connect_error = Some(err);
        self
    }

    pub fn with_accounts_error(self, err: ProviderError) -> Self {
        self.state.borrow_mut().accounts_error = Some(err);
        self
    }

    pub fn with_send_result(self, result: Result<String, ProviderError>) -> Self {
        self.state.borrow_mut().send_result = result;
        self
    }

    pub fn rejecting_connect(self) -> Self {
        self.with_connect_error(ProviderError::new(code::USER_REJECTED, "User rejected the request."))
    }

    pub fn rejecting_send(self) -> Self {
        self.with_send_result(Err(ProviderError::new(
            code::USER_REJECTED,
            "MetaMask Tx Signature: User denied transaction signature.",
        )))
    }

    pub fn insufficient_funds(self) -> Self {
        self.with_send_result(Err(ProviderError::new(
            code::SERVER_ERROR,
            "insufficient funds for gas * price + value",
        )))
    }

    /// Park the next call of `call` until the returned sender fires or drops.
    pub fn hold(&self, call: MockCall) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.borrow_mut().holds.insert(call, rx);
        tx
    }

    /// Simulate the wallet switching accounts (empty = disconnected).
    pub fn emit_accounts_changed(&self, accounts: &[&str]) {
        let accounts: Vec<String> = accounts.iter().map(|a| a.to_string()).collect();
        let listeners: Vec<AccountsListener> = {
            let mut state = self.state.borrow_mut();
            state.authorized = !accounts.is_empty();
            state.accounts = accounts.clone();
            state.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener(accounts.clone());
        }
    }

    pub fn calls(&self, call: MockCall) -> usize {
        self.state.borrow().calls.get(&call).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.borrow().calls.values().sum()
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state.borrow().sent.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    async fn enter(&self, call: MockCall) {
        let hold = {
            let mut state = self.state.borrow_mut();
            *state.calls.entry(call).or_insert(0) += 1;
            state.holds.remove(&call)
        };
        if let Some(rx) = hold {
            // Dropped sender releases too.
            let _ = rx.await;
        }
    }
}

#[async_trait(?Send)]
impl WalletProvider for MockProvider {
    fn is_available(&self) -> bool {
        self.state.borrow().available
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.enter(MockCall::RequestAccounts).await;
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.connect_error.clone() {
            return Err(err);
        }
        state.authorized = true;
        Ok(state.accounts.clone())
    }

    async fn get_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.enter(MockCall::GetAccounts).await;
        let state = self.state.borrow();
        if let Some(err) = state.accounts_error.clone() {
            return Err(err);
        }
        Ok(if state.authorized { state.accounts.clone() } else { Vec::new() })
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, ProviderError> {
        self.enter(MockCall::SendTransaction).await;
        let mut state = self.state.borrow_mut();
        state.sent.push(tx.clone());
        state.send_result.clone()
    }

    fn subscribe_accounts(&self, listener: AccountsListener) -> ListenerId {
        let mut state = self.state.borrow_mut();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.state.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";

    #[tokio::test]
    async fn get_accounts_requires_authorization() {
        let mock = MockProvider::new().with_accounts(&[ACCOUNT]);
        assert!(mock.get_accounts().await.unwrap().is_empty());
        assert_eq!(mock.request_accounts().await.unwrap(), vec![ACCOUNT.to_string()]);
        assert_eq!(mock.get_accounts().await.unwrap(), vec![ACCOUNT.to_string()]);
        assert_eq!(mock.calls(MockCall::GetAccounts), 2);
    }

    #[tokio::test]
    async fn hold_parks_until_released() {
        let mock = MockProvider::new().with_accounts(&[ACCOUNT]);
        let release = mock.hold(MockCall::RequestAccounts);
        let pending = mock.request_accounts();
        futures::pin_mut!(pending);
        assert!(futures::poll!(pending.as_mut()).is_pending());
        release.send(()).unwrap();
        assert!(pending.await.is_ok());
    }

    #[test]
    fn listeners_receive_changes_until_unsubscribed() {
        let mock = MockProvider::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = mock.subscribe_accounts(Rc::new(move |accounts| sink.borrow_mut().push(accounts)));
        mock.emit_accounts_changed(&[ACCOUNT]);
        mock.unsubscribe(id);
        mock.emit_accounts_changed(&[]);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(mock.listener_count(), 0);
    }
}
