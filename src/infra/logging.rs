//! Diagnostic logging to stderr, level taken from `EEPYTAGGER_LOG`.

use std::sync::OnceLock;

pub const LOG_ENV_VAR: &str = "EEPYTAGGER_LOG";

static INIT: OnceLock<()> = OnceLock::new();

fn parse_level(raw: Option<&str>) -> tracing::Level {
    match raw.unwrap_or("warn").to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::WARN,
    }
}

/// Installs the stderr subscriber. Later calls are no-ops.
pub fn init_logging() {
    if INIT.get().is_some() {
        return;
    }
    let level = parse_level(std::env::var(LOG_ENV_VAR).ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    let _ = INIT.set(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_warn() {
        assert_eq!(parse_level(None), tracing::Level::WARN);
        assert_eq!(parse_level(Some("bogus")), tracing::Level::WARN);
        assert_eq!(parse_level(Some("DEBUG")), tracing::Level::DEBUG);
    }

    #[test]
    fn init_is_idempotent() {
        init_logging();
        init_logging();
    }
}
