//! Native log setup: `RUST_LOG` filter (default `info`) to stderr,
//! JSON lines when `BEEPAY_LOG_JSON=1`.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_JSON_ENV: &str = "BEEPAY_LOG_JSON";

pub fn init_logging() {
    init_logging_with_default("info");
}

/// Like [`init_logging`], with a different fallback level when `RUST_LOG` is unset.
pub fn init_logging_with_default(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let use_json = std::env::var(LOG_JSON_ENV)
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_writer(std::io::stderr)
            .try_init();
    }
}
