//! Payment Flow Controller - the connect → confirm → send → settle machine
//!
//! ```text
//!            submit(input)
//!   Idle ───────────────────► Connecting ──connect ok──► AwaitingConfirmation
//!    ▲                            │                           │        │
//!    │ reset()                    │ connect err               │ tx id  │ rejected / funds /
//!    │                            ▼                           ▼        │ malfunction /
//!  Success ◄──────────────── Sending ◄─────────────────────────┘        │ account changed
//!                                                                       ▼
//!                               Error ──submit (session)──► AwaitingConfirmation
//!                                 └────submit (no session)─► Connecting
//! ```
//!
//! The machine is its own re-entrancy guard: `submit` while a provider call
//! is outstanding returns [`FlowError::Busy`] before touching anything.
//! Statuses are pushed to every [`PaymentFlow::watch`] receiver.

mod status;

pub use status::{FlowState, TransactionStatus};

use futures::channel::mpsc;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PaymentConfig;
use crate::core::{Address, Amount, ValidationError};
use crate::provider::{ConnectError, SendError};
use crate::session::{AccountSubscription, TransactionId, WalletSessionManager};

/// Errors surfaced by the flow. `Display` is the user-facing status message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error(transparent)]
    Send(#[from] SendError),
    #[error("Wallet account changed during payment. Please review and try again.")]
    AccountChanged,
    #[error("Wallet disconnected. Please reconnect and try again.")]
    Disconnected,
    #[error("Unknown plan '{0}'.")]
    UnknownPlan(String),
    #[error("A payment is already in progress.")]
    Busy,
    #[error("Payment already submitted.")]
    Completed,
}

/// Full-page navigation after a successful payment.
pub trait Navigator {
    fn schedule_redirect(&self, url: &str, delay: Duration);
}

/// Built from validated input when the user initiates payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub recipient: Address,
    pub amount: Amount,
    pub token_address: Address,
    pub plan: Option<String>,
}

#[derive(Default)]
struct FlowInner {
    status: TransactionStatus,
    last_transaction: Option<TransactionId>,
    watchers: Vec<mpsc::UnboundedSender<TransactionStatus>>,
}

impl FlowInner {
    fn set(&mut self, status: TransactionStatus) {
        debug!(from = %self.status.state, to = %status.state, "flow transition");
        self.status = status;
        let status = &self.status;
        self.watchers.retain(|tx| tx.unbounded_send(status.clone()).is_ok());
    }
}

pub struct PaymentFlow {
    session: Rc<WalletSessionManager>,
    config: PaymentConfig,
    navigator: Option<Rc<dyn Navigator>>,
    inner: Rc<RefCell<FlowInner>>,
    _accounts: AccountSubscription,
}

impl PaymentFlow {
    pub fn new(session: Rc<WalletSessionManager>, config: PaymentConfig) -> Self {
        let inner = Rc::new(RefCell::new(FlowInner::default()));
        let weak: Weak<RefCell<FlowInner>> = Rc::downgrade(&inner);
        let accounts = session.on_accounts_changed(move |account| {
            let Some(inner) = weak.upgrade() else { return };
            let state = inner.borrow().status.state;
            if state.is_in_flight() {
                warn!(%state, account = ?account.as_ref().map(Address::as_str), "wallet account changed while payment in flight");
            }
        });
        Self { session, config, navigator: None, inner, _accounts: accounts }
    }

    pub fn with_navigator(mut self, navigator: Rc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    pub fn session(&self) -> &WalletSessionManager {
        &self.session
    }

    pub fn status(&self) -> TransactionStatus {
        self.inner.borrow().status.clone()
    }

    pub fn state(&self) -> FlowState {
        self.inner.borrow().status.state
    }

    pub fn last_transaction(&self) -> Option<TransactionId> {
        self.inner.borrow().last_transaction.clone()
    }

    /// Receive every status change from now on.
    pub fn watch(&self) -> mpsc::UnboundedReceiver<TransactionStatus> {
        let (tx, rx) = mpsc::unbounded();
        self.inner.borrow_mut().watchers.push(tx);
        rx
    }

    /// Back to `Idle` from a terminal state. Refused while in flight.
    pub fn reset(&self) -> Result<(), FlowError> {
        if self.state().is_in_flight() {
            return Err(FlowError::Busy);
        }
        let mut inner = self.inner.borrow_mut();
        inner.last_transaction = None;
        inner.set(TransactionStatus::default());
        Ok(())
    }

    /// Validate `token_address` and pay the configured amount.
    pub async fn submit(&self, token_address: &str) -> Result<TransactionId, FlowError> {
        self.run(token_address, None).await
    }

    /// Same as [`submit`](Self::submit), charging the named plan.
    pub async fn submit_plan(&self, token_address: &str, plan: &str) -> Result<TransactionId, FlowError> {
        self.run(token_address, Some(plan)).await
    }

    pub fn prepare(&self, token_address: &str, plan: Option<&str>) -> Result<PaymentRequest, FlowError> {
        let token_address = Address::parse(token_address)?;
        let amount = match plan {
            Some(name) => self.config.plan(name).ok_or_else(|| FlowError::UnknownPlan(name.into()))?.amount,
            None => self.config.amount,
        };
        Ok(PaymentRequest {
            recipient: self.config.recipient.clone(),
            amount,
            token_address,
            plan: plan.map(String::from),
        })
    }

    fn transition(&self, state: FlowState, message: impl Into<String>) {
        self.inner.borrow_mut().set(TransactionStatus::new(state, message));
    }

    fn fail(&self, err: FlowError) -> FlowError {
        warn!(error = %err, "payment flow failed");
        self.transition(FlowState::Error, err.to_string());
        err
    }

    async fn run(&self, input: &str, plan: Option<&str>) -> Result<TransactionId, FlowError> {
        // Everything up to the first await runs synchronously, so the guard
        // and the first transition cannot interleave with another submit.
        let state = self.state();
        if state.is_in_flight() {
            debug!(%state, "submit ignored: payment in flight");
            return Err(FlowError::Busy);
        }
        if state == FlowState::Success {
            debug!("submit ignored: payment already submitted");
            return Err(FlowError::Completed);
        }
        let request = self.prepare(input, plan).map_err(|e| self.fail(e))?;
        info!(token = %request.token_address, amount = %request.amount, plan = ?request.plan, "payment initiated");

        let resume = match (state, self.session.session()) {
            (FlowState::Error, session) => session.account.map(|a| (a, session.generation)),
            _ => None,
        };
        let (from, generation) = match resume {
            Some(captured) => captured,
            None => {
                self.transition(FlowState::Connecting, "Connecting to your wallet... Please check your wallet extension.");
                let account = self.session.connect().await.map_err(|e| self.fail(e.into()))?;
                (account, self.session.session().generation)
            }
        };

        self.transition(
            FlowState::AwaitingConfirmation,
            format!(
                "Please confirm the payment of {} {} to {} in your wallet.",
                request.amount, self.config.asset, request.recipient
            ),
        );
        self.revalidate(&from, generation).await.map_err(|e| self.fail(e))?;

        let txid = self
            .session
            .send_payment(&from, &request.recipient, request.amount)
            .await
            .map_err(|e| self.fail(e.into()))?;

        self.transition(FlowState::Sending, "Processing transaction... This may take a few moments.");
        if self.session.session().generation != generation {
            warn!(from = %from, txid = %txid, "account changed while the wallet was signing; transaction was submitted from the original account");
        }
        self.inner.borrow_mut().last_transaction = Some(txid.clone());
        self.transition(
            FlowState::Success,
            format!(
                "Transaction for {} {} submitted. Transaction ID: {}",
                request.amount, self.config.asset, txid
            ),
        );
        info!(txid = %txid, "payment submitted");
        self.schedule_redirect();
        Ok(txid)
    }

    /// The account captured before the last await must still be the wallet's
    /// active account, untouched by any change notification in between.
    async fn revalidate(&self, from: &Address, generation: u64) -> Result<(), FlowError> {
        let current = self.session.current_account().await?;
        let unchanged = self.session.session().generation == generation;
        match current {
            None => Err(FlowError::Disconnected),
            Some(account) if &account == from && unchanged => Ok(()),
            Some(account) => {
                warn!(expected = %from, current = %account, "stale from address, aborting");
                Err(FlowError::AccountChanged)
            }
        }
    }

    /// Builder-made configs skip `validate`, so the scheme is checked here too.
    fn schedule_redirect(&self) {
        let (Some(navigator), Some(redirect)) = (&self.navigator, &self.config.redirect) else {
            return;
        };
        if let Err(e) = redirect.check() {
            warn!(error = %e, "redirect refused");
            return;
        }
        info!(url = %redirect.url, delay_ms = redirect.delay_ms, "redirect scheduled");
        navigator.schedule_redirect(&redirect.url, redirect.delay());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;

    const RECIPIENT: &str = "0x43b608fA9AEcE01036f3227849A889435f830428";
    const TOKEN: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
    const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";

    fn flow(mock: &MockProvider) -> PaymentFlow {
        let session = Rc::new(WalletSessionManager::new(Some(Rc::new(mock.clone()))));
        let config = PaymentConfig::new(Address::parse(RECIPIENT).unwrap(), Amount::parse_decimal("2.1").unwrap())
            .with_plan("premier", Amount::parse_decimal("3").unwrap());
        PaymentFlow::new(session, config)
    }

    #[test]
    fn prepare_picks_plan_amount() {
        let flow = flow(&MockProvider::new());
        assert_eq!(flow.prepare(TOKEN, None).unwrap().amount.to_string(), "2.1");
        assert_eq!(flow.prepare(TOKEN, Some("premier")).unwrap().amount.to_string(), "3");
        assert_eq!(flow.prepare(TOKEN, Some("gold")), Err(FlowError::UnknownPlan("gold".into())));
        assert_eq!(flow.prepare("", None), Err(FlowError::Validation(ValidationError::Empty)));
    }

    #[tokio::test]
    async fn unknown_plan_fails_without_provider_calls() {
        let mock = MockProvider::new().with_accounts(&[ACCOUNT]);
        let flow = flow(&mock);
        assert!(matches!(flow.submit_plan(TOKEN, "gold").await, Err(FlowError::UnknownPlan(_))));
        assert_eq!(flow.state(), FlowState::Error);
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn success_message_names_amount_and_tx() {
        let mock = MockProvider::new().with_accounts(&[ACCOUNT]);
        let flow = flow(&mock);
        let txid = flow.submit_plan(TOKEN, "premier").await.unwrap();
        let status = flow.status();
        assert_eq!(status.state, FlowState::Success);
        assert!(status.message.contains("3 ETH"));
        assert!(status.message.contains(&txid));
        assert_eq!(mock.sent()[0].value, "0x29a2241af62c0000");
        assert_eq!(flow.last_transaction(), Some(txid));
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let mock = MockProvider::new().with_accounts(&[ACCOUNT]);
        let flow = flow(&mock);
        flow.submit(TOKEN).await.unwrap();
        flow.reset().unwrap();
        assert_eq!(flow.status(), TransactionStatus::default());
        assert_eq!(flow.last_transaction(), None);
    }

    #[test]
    fn dropping_flow_unsubscribes() {
        let mock = MockProvider::new();
        let flow = flow(&mock);
        assert_eq!(mock.listener_count(), 1);
        drop(flow);
        assert_eq!(mock.listener_count(), 0);
    }
}
