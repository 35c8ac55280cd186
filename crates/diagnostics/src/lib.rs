// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Logging for the arcfs crates
//!
//! Usage:
//! - `ARCFS_LOG=off` (default): no logs
//! - `ARCFS_LOG=error` / `warn`: problems only, e.g. skipped archive entries
//! - `ARCFS_LOG=info`: archive opens and closes, tree summaries
//! - `ARCFS_LOG=debug`: format detection, scans, registry decisions

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable selecting the log level
pub const LOG_ENV: &str = "ARCFS_LOG";

static INIT: Once = Once::new();

fn parse_level(value: &str) -> Option<Option<emit::Level>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" | "" => Some(None),
        "error" => Some(Some(emit::Level::Error)),
        "warn" => Some(Some(emit::Level::Warn)),
        "info" => Some(Some(emit::Level::Info)),
        "debug" => Some(Some(emit::Level::Debug)),
        _ => None,
    }
}

/// Initialize diagnostics based on the `ARCFS_LOG` environment variable
///
/// Call once at startup; later calls are ignored. An unrecognized value
/// falls back to `info` and says so.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let value = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());
        let parsed = parse_level(&value);

        let Some(level) = parsed.unwrap_or(Some(emit::Level::Info)) else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        if parsed.is_none() {
            emit::warn!("Unknown {env} value '{value}', using 'info'", env: LOG_ENV, value: value);
        }

        // The runtime lives for the rest of the process
        std::mem::forget(rt);
    });
}

/// Log basic operations (archives opened and closed, trees built)
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (scan counts, format decisions, internal state)
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable oddities (skipped entries, fallbacks)
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that stop an operation
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

// Short-name versions

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;
