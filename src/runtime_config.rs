//! # Runtime Configuration Module
//!
//! Environment variable based configuration for how routes run requests.
//!
//! ## Environment Variables
//!
//! ### `APIROUTE_CATCH_PANICS`
//!
//! When `true` (default), a panic inside middleware, context construction or a method
//! handler is caught and routed to the error handler like any other failure, with
//! the panic payload as the failure value. When `false`, panics unwind through
//! [`crate::route::Route::handle`].
//!
//! ### `APIROUTE_SLOW_REQUEST_MS`
//!
//! Latency threshold in milliseconds. Requests taking longer emit a `warn` event.
//! Unset by default. This is observation only; nothing is cancelled.
//!
//! ## Usage
//!
//! ```rust
//! use apiroute::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Catching panics: {}", config.catch_panics);
//! ```
//!
//! ```bash
//! export APIROUTE_CATCH_PANICS=false
//! export APIROUTE_SLOW_REQUEST_MS=250
//! ```

use std::env;
use std::time::Duration;

/// Runtime configuration for routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Convert panics in request steps into failures (default: true)
    pub catch_panics: bool,
    /// Warn when a request takes longer than this many milliseconds (default: unset)
    pub slow_request_ms: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            slow_request_ms: None,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let catch_panics = lookup("APIROUTE_CATCH_PANICS")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.catch_panics);
        let slow_request_ms = lookup("APIROUTE_SLOW_REQUEST_MS")
            .and_then(|v| v.trim().parse().ok())
            .or(defaults.slow_request_ms);
        RuntimeConfig {
            catch_panics,
            slow_request_ms,
        }
    }

    #[must_use]
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    #[must_use]
    pub fn with_slow_request_ms(mut self, ms: u64) -> Self {
        self.slow_request_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn slow_request_threshold(&self) -> Option<Duration> {
        self.slow_request_ms.map(Duration::from_millis)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
