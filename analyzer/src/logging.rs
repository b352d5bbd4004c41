// logging.rs — Tracing subscriber setup for the binary
//
// The subscriber is installed only when `CTXLINT_LOG` or `RUST_LOG` is set,
// or when `--verbose` asks for per-unit summaries. `CTXLINT_LOG_FORMAT=json`
// switches to newline-delimited JSON. Log lines always go to stderr.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("CTXLINT_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// `CTXLINT_LOG` first, then `RUST_LOG`, then `info` for this crate when
/// running verbose. `None` means logging stays off.
fn build_filter(verbose: bool) -> Option<EnvFilter> {
    if let Ok(val) = std::env::var("CTXLINT_LOG") {
        return Some(EnvFilter::builder().parse_lossy(val));
    }
    if std::env::var("RUST_LOG").is_ok() {
        return Some(EnvFilter::from_default_env());
    }
    verbose.then(|| EnvFilter::new("ctxlint=info"))
}

/// Install the global subscriber. Call once, from `main`.
pub fn init(verbose: bool) {
    let Some(filter) = build_filter(verbose) else {
        return;
    };
    match LogFormat::from_env() {
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
