//! Config Tests: BEEPAY_* variables end to end
//!
//! Process environment is global, so every test holds ENV_LOCK.

use beepay::config::{env, DEFAULT_REDIRECT_DELAY_MS};
use beepay::{ConfigError, MockProvider, PaymentConfig, PaymentFlow, WalletSessionManager};
use once_cell::sync::Lazy;
use std::rc::Rc;
use std::sync::Mutex;

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

const ALL: [&str; 6] = [
    env::RECIPIENT,
    env::AMOUNT,
    env::ASSET,
    env::PLANS,
    env::REDIRECT_URL,
    env::REDIRECT_DELAY_MS,
];

fn set_vars(vars: &[(&str, &str)]) {
    for key in ALL {
        std::env::remove_var(key);
    }
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
}

const RECIPIENT: &str = "0x43b608fA9AEcE01036f3227849A889435f830428";
const TOKEN: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";

/// Test: nothing configured means no recipient, never a built-in one
#[test]
fn missing_recipient_is_an_error() {
    let _guard = lock_env();
    set_vars(&[]);
    assert_eq!(PaymentConfig::from_env(), Err(ConfigError::Missing(env::RECIPIENT)));

    set_vars(&[(env::RECIPIENT, RECIPIENT)]);
    assert_eq!(PaymentConfig::from_env(), Err(ConfigError::Missing(env::AMOUNT)));
}

/// Test: redirect delay defaults, and blank values count as unset
#[test]
fn redirect_from_env() {
    let _guard = lock_env();
    set_vars(&[
        (env::RECIPIENT, RECIPIENT),
        (env::AMOUNT, "2.1"),
        (env::ASSET, "  "),
        (env::REDIRECT_URL, "https://shop.example/thanks"),
    ]);
    let config = PaymentConfig::from_env().unwrap();
    assert_eq!(config.asset, "ETH");
    assert_eq!(config.redirect.unwrap().delay_ms, DEFAULT_REDIRECT_DELAY_MS);

    set_vars(&[
        (env::RECIPIENT, RECIPIENT),
        (env::AMOUNT, "2.1"),
        (env::REDIRECT_URL, "https://shop.example/thanks"),
        (env::REDIRECT_DELAY_MS, "soon"),
    ]);
    assert_eq!(PaymentConfig::from_env(), Err(ConfigError::RedirectDelay("soon".into())));
}

/// Test: an env-built config drives a full payment
#[tokio::test]
async fn env_config_drives_flow() {
    let config = {
        let _guard = lock_env();
        set_vars(&[
            (env::RECIPIENT, RECIPIENT),
            (env::AMOUNT, "2.1"),
            (env::PLANS, "standard=1.1,premier=3"),
        ]);
        PaymentConfig::from_env().unwrap()
    };

    let mock = MockProvider::new().with_accounts(&[ACCOUNT]);
    let session = Rc::new(WalletSessionManager::new(Some(Rc::new(mock.clone()))));
    let flow = PaymentFlow::new(session, config);

    flow.submit_plan(TOKEN, "premier").await.unwrap();
    let sent = mock.sent();
    assert_eq!(sent[0].to, RECIPIENT);
    assert_eq!(sent[0].value, "0x29a2241af62c0000");
}
