//! Tracing setup and log-safe formatting helpers

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber from the parsed logging settings.
///
/// `RUST_LOG` wins over `config.level` when it is set and valid.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = env_filter(std::env::var("RUST_LOG").ok().as_deref(), &config.level);

    let builder = fmt().with_env_filter(filter).with_target(true);
    let result = match config.format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Plain => builder.try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

fn env_filter(rust_log: Option<&str>, level: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level.to_lowercase()).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Mask a payer document (CPF/CNPJ) keeping only the last two digits.
pub fn mask_document(document: &str) -> String {
    let digits: Vec<char> = document.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 2 {
        return "*".repeat(digits.len());
    }
    let visible: String = digits[digits.len() - 2..].iter().collect();
    format!("{}{}", "*".repeat(digits.len() - 2), visible)
}
