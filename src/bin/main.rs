//! Beepay CLI - inspect and simulate the payment flow
//!
//!   beepay check <address>              → {"valid": true}
//!   beepay quote [--plan <name>]        → recipient, amount, wei, hex value
//!   beepay status <state> [message]     → rendered status view
//!   beepay simulate <address> [opts]    → run the flow against a mock wallet
//!
//! Simulate options:
//!   --plan <name>       Charge a named plan
//!   --account <addr>    Account the mock wallet grants
//!   --no-wallet         No provider injected
//!   --reject-connect    User rejects the account request
//!   --reject-send       User rejects the transaction
//!   --insufficient      Wallet reports insufficient funds
//!
//! Configuration (flags win over environment, environment over .env):
//!   --recipient <addr>  BEEPAY_RECIPIENT
//!   --amount <decimal>  BEEPAY_AMOUNT
//!   BEEPAY_ASSET, BEEPAY_PLANS, BEEPAY_REDIRECT_URL, BEEPAY_REDIRECT_DELAY_MS
//!
//! Output format:
//!   --json     Output compact JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail, Context, Result};
use beepay::config::env as config_env;
use beepay::logging::init_logging_with_default;
use beepay::{
    present, Address, FlowError, FlowState, MockProvider, Navigator, PaymentConfig, PaymentFlow,
    TransactionStatus, WalletSessionManager,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::env;
use std::io::IsTerminal;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

const SIM_ACCOUNT: &str = "0x1111111111111111111111111111111111111111";

fn main() {
    init_logging_with_default("warn");

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("beepay {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("check") => cmd_check(&opts),
        Some("quote") => cmd_quote(&opts),
        Some("status") => cmd_status(&opts),
        Some("simulate") | Some("sim") => cmd_simulate(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = !opts.json && (opts.pretty || std::io::stdout().is_terminal());
    let render = |value: &Value| {
        if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) }
            .unwrap_or_else(|_| value.to_string())
    };

    match result {
        Ok(output) => println!("{}", render(&output)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{:#}", e)})));
            std::process::exit(1);
        }
    }
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    positional: Vec<String>,
    // Config overrides
    recipient: Option<String>,
    amount: Option<String>,
    // Simulation
    plan: Option<String>,
    account: Option<String>,
    no_wallet: bool,
    reject_connect: bool,
    reject_send: bool,
    insufficient: bool,
    // Output options
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_dotenv(".env");

        let mut opts = ParsedArgs::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-h" | "--help" => opts.help = true,
                "-V" | "--version" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--recipient" => opts.recipient = iter.next().cloned(),
                "--amount" => opts.amount = iter.next().cloned(),
                "--plan" => opts.plan = iter.next().cloned(),
                "--account" => opts.account = iter.next().cloned(),
                "--no-wallet" => opts.no_wallet = true,
                "--reject-connect" => opts.reject_connect = true,
                "--reject-send" => opts.reject_send = true,
                "--insufficient" => opts.insufficient = true,
                other if opts.command.is_none() => opts.command = Some(other.to_string()),
                other => opts.positional.push(other.to_string()),
            }
        }
        opts
    }

    fn config(&self) -> Result<PaymentConfig> {
        PaymentConfig::from_lookup(|key| match key {
            config_env::RECIPIENT if self.recipient.is_some() => self.recipient.clone(),
            config_env::AMOUNT if self.amount.is_some() => self.amount.clone(),
            _ => env::var(key).ok(),
        })
        .context("configuration")
    }
}

/// Existing environment variables win over the file.
fn load_dotenv(path: &str) {
    let Ok(contents) = std::fs::read_to_string(path) else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && env::var(key.trim()).is_err() {
                env::set_var(key.trim(), value);
            }
        }
    }
    debug!(path, "loaded .env");
}

fn cmd_check(opts: &ParsedArgs) -> Result<Value> {
    let input = opts.positional.first().ok_or_else(|| anyhow!("Usage: beepay check <address>"))?;
    Ok(match Address::parse(input) {
        Ok(address) => json!({"valid": true, "address": address, "short": address.short()}),
        Err(e) => json!({"valid": false, "error": e.to_string()}),
    })
}

fn cmd_quote(opts: &ParsedArgs) -> Result<Value> {
    let config = opts.config()?;
    let amount = match &opts.plan {
        Some(name) => config.plan(name).ok_or_else(|| FlowError::UnknownPlan(name.clone()))?.amount,
        None => config.amount,
    };
    Ok(json!({
        "recipient": config.recipient,
        "asset": config.asset,
        "plan": opts.plan,
        "amount": amount,
        "wei": amount.wei().to_string(),
        "value": amount.to_hex(),
        "plans": config.plans,
    }))
}

fn cmd_status(opts: &ParsedArgs) -> Result<Value> {
    let state: FlowState = opts
        .positional
        .first()
        .ok_or_else(|| anyhow!("Usage: beepay status <state> [message]"))?
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let message = opts.positional[1..].join(" ");
    Ok(serde_json::to_value(present(Some(&TransactionStatus::new(state, message))))?)
}

/// Records redirects instead of navigating.
#[derive(Default)]
struct RecordingNavigator {
    scheduled: RefCell<Vec<(String, Duration)>>,
}

impl Navigator for RecordingNavigator {
    fn schedule_redirect(&self, url: &str, delay: Duration) {
        self.scheduled.borrow_mut().push((url.to_string(), delay));
    }
}

fn cmd_simulate(opts: &ParsedArgs) -> Result<Value> {
    let input = opts
        .positional
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("Usage: beepay simulate <address> [--plan name] [--no-wallet] [--reject-connect] [--reject-send] [--insufficient]"))?;
    let config = opts.config()?;
    let account = opts.account.clone().unwrap_or_else(|| SIM_ACCOUNT.to_string());
    if !Address::is_valid(&account) {
        bail!("invalid --account '{}'", account);
    }

    let mut mock = if opts.no_wallet { MockProvider::unavailable() } else { MockProvider::new() };
    mock = mock.with_accounts(&[account.as_str()]);
    if opts.reject_connect {
        mock = mock.rejecting_connect();
    }
    if opts.reject_send {
        mock = mock.rejecting_send();
    } else if opts.insufficient {
        mock = mock.insufficient_funds();
    }

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(async {
        let session = Rc::new(WalletSessionManager::new(Some(Rc::new(mock.clone()))));
        session.detect_provider();
        let navigator = Rc::new(RecordingNavigator::default());
        let flow = PaymentFlow::new(session, config).with_navigator(navigator.clone());
        let mut rx = flow.watch();

        let result = match &opts.plan {
            Some(plan) => flow.submit_plan(&input, plan).await,
            None => flow.submit(&input).await,
        };

        let mut transitions = Vec::new();
        while let Ok(status) = rx.try_recv() {
            transitions.push(json!({"state": status.state, "message": status.message}));
        }
        let redirects: Vec<Value> = navigator
            .scheduled
            .borrow()
            .iter()
            .map(|(url, delay)| json!({"url": url, "delay_ms": delay.as_millis() as u64}))
            .collect();

        Ok(json!({
            "transitions": transitions,
            "result": match result {
                Ok(txid) => json!({"success": true, "txid": txid}),
                Err(e) => json!({"success": false, "error": e.to_string()}),
            },
            "view": present(Some(&flow.status())),
            "provider_calls": mock.total_calls(),
            "redirects": redirects,
        }))
    })
}

fn print_usage() {
    println!(
        r#"beepay - wallet connect-and-pay flow

USAGE:
    beepay check <address>
    beepay quote [--plan <name>] [--recipient <addr>] [--amount <decimal>]
    beepay status <state> [message]
    beepay simulate <address> [--plan <name>] [--account <addr>]
                    [--no-wallet] [--reject-connect] [--reject-send] [--insufficient]

STATES:
    idle, connecting, awaiting_confirmation, sending, success, error

ENVIRONMENT:
    BEEPAY_RECIPIENT, BEEPAY_AMOUNT, BEEPAY_ASSET, BEEPAY_PLANS (name=amount,...),
    BEEPAY_REDIRECT_URL, BEEPAY_REDIRECT_DELAY_MS, BEEPAY_LOG_JSON, RUST_LOG

OPTIONS:
    --json       Compact JSON output
    --pretty     Pretty JSON output
    -h, --help   Show this help
    -V, --version"#
    );
}
