//! Minimal internal logging and fatal-abort facility.
//!
//! The gate does not pull in an external logging crate: like the host
//! translator's own debug facility, it needs exactly one knob (a level
//! threshold, read once from the environment) and one unrecoverable exit
//! path (`suicide`). Everything else is `eprintln!`.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Debug)]
pub enum LogLevel {
    LogDebug,
    LogInfo,
    LogWarn,
    LogError,
    LogFatal,
}

lazy_static::lazy_static! {
    static ref LOG_THRESHOLD: LogLevel = init_log_threshold();
}

fn init_log_threshold() -> LogLevel {
    match std::env::var("GATE_LOG").ok().as_deref() {
        Some("debug") => LogLevel::LogDebug,
        Some("info") => LogLevel::LogInfo,
        Some("warn") => LogLevel::LogWarn,
        Some("error") => LogLevel::LogError,
        Some("fatal") => LogLevel::LogFatal,
        _ => {
            if cfg!(feature = "debug-trace") {
                LogLevel::LogDebug
            } else {
                LogLevel::LogWarn
            }
        }
    }
}

pub fn log_enabled(level: LogLevel) -> bool {
    level >= *LOG_THRESHOLD
}

/// Log a message at `level` if the configured threshold permits it.
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)+) => {
        if $crate::log::log_enabled($level) {
            eprintln!("[{:?}] {}", $level, format!($($arg)+));
        }
    };
}

/// Assert a condition, logging a fatal message and calling [`suicide`] if it
/// doesn't hold. Mirrors the host translator's own `ed_assert!`.
#[macro_export]
macro_rules! ed_assert {
    ($cx:expr, $cond:expr) => {
        if !($cond) {
            $crate::log::suicide(&format!(
                "assertion failed ({}): {}",
                $cx, stringify!($cond)
            ));
        }
    };
    ($cx:expr, $cond:expr, $($arg:tt)+) => {
        if !($cond) {
            $crate::log::suicide(&format!("assertion failed ({}): {}", $cx, format!($($arg)+)));
        }
    };
}

static PANIC_ON_SUICIDE: AtomicBool = AtomicBool::new(false);

/// Test-only seam: make [`suicide`] unwind instead of aborting the process,
/// so the test harness that triggers a translator-safety violation can
/// observe it and keep running.
pub fn enable_test_suicide_mode() {
    PANIC_ON_SUICIDE.store(true, Ordering::SeqCst);
}

/// Unrecoverable translator abort. Used for every class-1 (translator-safety
/// violation) and class-2 (denied guest request) error in the gate. There is
/// no cleanup path: by the time this is called the caller no longer trusts
/// its own state, so the only safe thing to do is stop the process.
pub fn suicide(msg: &str) -> ! {
    log!(LogLevel::LogFatal, "{}", msg);
    if PANIC_ON_SUICIDE.load(Ordering::SeqCst) {
        panic!("suicide: {}", msg);
    }
    std::process::abort();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn threshold_defaults_to_warn_without_debug_trace_feature() {
        if !cfg!(feature = "debug-trace") && std::env::var("GATE_LOG").is_err() {
            assert!(log_enabled(LogLevel::LogWarn));
            assert!(!log_enabled(LogLevel::LogDebug));
        }
    }

    #[test]
    fn suicide_unwinds_in_test_mode() {
        enable_test_suicide_mode();
        let result = std::panic::catch_unwind(|| suicide("boom"));
        assert!(result.is_err());
    }
}
