//! Logging setup plus `log_info!` / `log_warn!` / `log_error!`, which only
//! emit when the calling module defines `const ENABLE_LOGS: bool = true;`.
//!
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("cycle {sequence}: published");
//! ```

use log::LevelFilter;

/// Set to `1` (or `true`) to log at debug level.
pub const DEBUG_ENV_VAR: &str = "PRESENCE_DEBUG";

pub fn level_from_flag(flag: Option<&str>) -> LevelFilter {
    match flag.map(str::trim) {
        Some("1") => LevelFilter::Debug,
        Some(value) if value.eq_ignore_ascii_case("true") => LevelFilter::Debug,
        _ => LevelFilter::Info,
    }
}

/// Initializes env_logger from `RUST_LOG`, then applies the `PRESENCE_DEBUG` level.
pub fn init() {
    let flag = std::env::var(DEBUG_ENV_VAR).ok();
    let level = level_from_flag(flag.as_deref());

    if let Err(err) = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init()
    {
        eprintln!("logger already initialized: {err}");
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
