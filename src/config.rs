//! Payment configuration - passed from higher layers
//!
//! Built in code with the `with_*` methods, deserialized from JSON (the
//! browser hands over a plain object), or read from `BEEPAY_*` variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::core::{Address, Amount, AmountError, ValidationError};

pub const DEFAULT_ASSET: &str = "ETH";
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 3000;

pub mod env {
    pub const RECIPIENT: &str = "BEEPAY_RECIPIENT";
    pub const AMOUNT: &str = "BEEPAY_AMOUNT";
    pub const ASSET: &str = "BEEPAY_ASSET";
    pub const PLANS: &str = "BEEPAY_PLANS";
    pub const REDIRECT_URL: &str = "BEEPAY_REDIRECT_URL";
    pub const REDIRECT_DELAY_MS: &str = "BEEPAY_REDIRECT_DELAY_MS";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("invalid recipient: {0}")]
    Recipient(ValidationError),
    #[error("invalid amount: {0}")]
    Amount(#[from] AmountError),
    #[error("invalid plan '{0}' (expected name=amount)")]
    Plan(String),
    #[error("duplicate plan '{0}'")]
    DuplicatePlan(String),
    #[error("invalid redirect url '{0}' (expected http:// or https://)")]
    RedirectUrl(String),
    #[error("invalid redirect delay '{0}'")]
    RedirectDelay(String),
}

/// A named price, e.g. "standard" = 1.1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectConfig {
    pub url: String,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl RedirectConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Only `http://` and `https://` targets may be navigated to.
    pub fn check(&self) -> Result<(), ConfigError> {
        let url = self.url.trim_start().to_ascii_lowercase();
        if url.starts_with("https://") || url.starts_with("http://") {
            Ok(())
        } else {
            Err(ConfigError::RedirectUrl(self.url.clone()))
        }
    }
}

fn default_delay_ms() -> u64 { DEFAULT_REDIRECT_DELAY_MS }
fn default_asset() -> String { DEFAULT_ASSET.into() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Where payments go. Always shown to the user before signing.
    pub recipient: Address,
    /// Charged when no plan is selected.
    pub amount: Amount,
    #[serde(default = "default_asset")]
    pub asset: String,
    #[serde(default)]
    pub plans: Vec<Plan>,
    #[serde(default)]
    pub redirect: Option<RedirectConfig>,
}

impl PaymentConfig {
    pub fn new(recipient: Address, amount: Amount) -> Self {
        Self { recipient, amount, asset: default_asset(), plans: Vec::new(), redirect: None }
    }
    pub fn with_asset(mut self, asset: impl Into<String>) -> Self { self.asset = asset.into(); self }
    pub fn with_plan(mut self, name: impl Into<String>, amount: Amount) -> Self {
        self.plans.push(Plan { name: name.into(), amount });
        self
    }
    pub fn with_redirect(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.redirect = Some(RedirectConfig { url: url.into(), delay_ms: delay.as_millis() as u64 });
        self
    }

    pub fn plan(&self, name: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.name == name)
    }

    /// Checks what serde cannot: plan names and the redirect scheme.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, plan) in self.plans.iter().enumerate() {
            if plan.name.trim().is_empty() {
                return Err(ConfigError::Plan(plan.name.clone()));
            }
            if self.plans[..i].iter().any(|p| p.name == plan.name) {
                return Err(ConfigError::DuplicatePlan(plan.name.clone()));
            }
        }
        if let Some(redirect) = &self.redirect {
            redirect.check()?;
        }
        Ok(())
    }

    pub fn from_json(value: serde_json::Value) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `from_env` over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let recipient = get(env::RECIPIENT).ok_or(ConfigError::Missing(env::RECIPIENT))?;
        let recipient = Address::parse(&recipient).map_err(ConfigError::Recipient)?;
        let amount = Amount::parse_decimal(&get(env::AMOUNT).ok_or(ConfigError::Missing(env::AMOUNT))?)?;

        let mut config = Self::new(recipient, amount);
        if let Some(asset) = get(env::ASSET) {
            config.asset = asset;
        }
        if let Some(plans) = get(env::PLANS) {
            config.plans = parse_plans(&plans)?;
        }
        if let Some(url) = get(env::REDIRECT_URL) {
            let delay_ms = match get(env::REDIRECT_DELAY_MS) {
                Some(raw) => raw.parse().map_err(|_| ConfigError::RedirectDelay(raw))?,
                None => DEFAULT_REDIRECT_DELAY_MS,
            };
            config.redirect = Some(RedirectConfig { url, delay_ms });
        }
        config.validate()?;
        Ok(config)
    }
}

/// `standard=1.1,enhanced=1.6`
fn parse_plans(raw: &str) -> Result<Vec<Plan>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, amount) = entry.split_once('=').ok_or_else(|| ConfigError::Plan(entry.into()))?;
            Ok(Plan { name: name.trim().into(), amount: Amount::parse_decimal(amount.trim())? })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    const RECIPIENT: &str = "0x43b608fA9AEcE01036f3227849A889435f830428";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_minimal() {
        let config = PaymentConfig::from_lookup(lookup(&[(env::RECIPIENT, RECIPIENT), (env::AMOUNT, "2.1")])).unwrap();
        assert_eq!(config.recipient.as_str(), RECIPIENT);
        assert_eq!(config.amount.to_string(), "2.1");
        assert_eq!(config.asset, "ETH");
        assert!(config.plans.is_empty());
        assert!(config.redirect.is_none());
    }

    #[test]
    fn env_full() {
        let config = PaymentConfig::from_lookup(lookup(&[
            (env::RECIPIENT, RECIPIENT),
            (env::AMOUNT, "1"),
            (env::ASSET, "SEP"),
            (env::PLANS, "standard=1.1, enhanced=1.6,premier=2.1"),
            (env::REDIRECT_URL, "https://shop.example/thanks"),
            (env::REDIRECT_DELAY_MS, "500"),
        ]))
        .unwrap();
        assert_eq!(config.asset, "SEP");
        assert_eq!(config.plans.len(), 3);
        assert_eq!(config.plan("enhanced").unwrap().amount.to_string(), "1.6");
        let redirect = config.redirect.unwrap();
        assert_eq!(redirect.delay(), Duration::from_millis(500));
    }

    #[test]
    fn env_errors() {
        assert_eq!(
            PaymentConfig::from_lookup(lookup(&[(env::AMOUNT, "1")])),
            Err(ConfigError::Missing(env::RECIPIENT))
        );
        assert_eq!(
            PaymentConfig::from_lookup(lookup(&[(env::RECIPIENT, "0x12"), (env::AMOUNT, "1")])),
            Err(ConfigError::Recipient(ValidationError::Malformed))
        );
        assert!(matches!(
            PaymentConfig::from_lookup(lookup(&[(env::RECIPIENT, RECIPIENT), (env::AMOUNT, "1"), (env::PLANS, "broken")])),
            Err(ConfigError::Plan(_))
        ));
        assert!(matches!(
            PaymentConfig::from_lookup(lookup(&[(env::RECIPIENT, RECIPIENT), (env::AMOUNT, "1"), (env::PLANS, "a=1,a=2")])),
            Err(ConfigError::DuplicatePlan(_))
        ));
        assert!(matches!(
            PaymentConfig::from_lookup(lookup(&[(env::RECIPIENT, RECIPIENT), (env::AMOUNT, "1"), (env::REDIRECT_URL, "javascript:alert(1)")])),
            Err(ConfigError::RedirectUrl(_))
        ));
    }

    #[test]
    fn redirect_scheme() {
        let redirect = |url: &str| RedirectConfig { url: url.into(), delay_ms: 0 };
        assert!(redirect("https://shop.example/thanks").check().is_ok());
        assert!(redirect("HTTP://shop.example").check().is_ok());
        for bad in ["javascript:alert(1)", "data:text/html,hi", "//shop.example", "ftp://shop.example", ""] {
            assert_eq!(redirect(bad).check(), Err(ConfigError::RedirectUrl(bad.into())), "{bad}");
        }

        let recipient = Address::parse(RECIPIENT).unwrap();
        let built = PaymentConfig::new(recipient, Amount::from_wei(1))
            .with_redirect("javascript:alert(1)", Duration::from_millis(1));
        assert!(matches!(built.validate(), Err(ConfigError::RedirectUrl(_))));
    }

    #[test]
    fn json_defaults() {
        let config = PaymentConfig::from_json(json!({
            "recipient": RECIPIENT,
            "amount": "2.1",
            "redirect": {"url": "https://shop.example/thanks"}
        }))
        .unwrap();
        assert_eq!(config.asset, DEFAULT_ASSET);
        assert_eq!(config.redirect.unwrap().delay_ms, DEFAULT_REDIRECT_DELAY_MS);
        assert!(PaymentConfig::from_json(json!({"recipient": "nope", "amount": "1"})).is_err());
    }
}
