//! Logging setup utilities for the Tabichat binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directives for the given crates.
///
/// Every crate listed in `targets` (plus `tower_http`, which emits the request
/// spans of the HTTP surface) is logged at `default_log_level`. Crate names are
/// normalised to their module path form (`tabichat-server` -> `tabichat_server`).
pub fn default_directives(targets: &[&str], default_log_level: &str) -> String {
    targets
        .iter()
        .map(|target| target.replace('-', "_"))
        .chain(std::iter::once("tower_http".to_string()))
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
/// Calling this more than once is harmless: later calls leave the already
/// installed subscriber in place and return `false`.
///
/// # Arguments
///
/// * `targets` - Crates whose events should be shown (e.g. `["tabichat-server"]`)
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use tabichat_shared::logger::setup_logger;
///
/// setup_logger(&["tabichat-server", env!("CARGO_PKG_NAME")], "info");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(targets, default_log_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
