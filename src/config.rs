//! Runtime-tunable knobs ("deny_is_fatal" and friends), gathered the way a
//! small long-lived daemon usually does it: read once from the environment
//! at startup, cached for the life of the process.

use std::env;

lazy_static::lazy_static! {
    static ref CONFIG: GateConfig = GateConfig::from_env();
}

#[derive(Clone, Debug)]
pub struct GateConfig {
    /// The library name `execve`'s authorizer looks for in the child's
    /// `LD_PRELOAD`. A child missing it would run outside the gate's
    /// authority entirely, so `auth_execve` denies rather than silently
    /// letting that happen.
    pub preload_library_name: String,
    /// If true, a `Denied` verdict aborts the whole process the moment it's
    /// produced rather than just failing the one syscall back to the guest
    /// with `-1`. Left as an open policy question (see DESIGN.md); default
    /// is permissive -- the guest sees a normal syscall failure.
    pub deny_is_fatal: bool,
}

impl GateConfig {
    fn from_env() -> GateConfig {
        let preload_library_name = env::var("GATE_PRELOAD_NAME").unwrap_or_else(|_| "libgate.so".to_string());
        let deny_is_fatal = env::var("GATE_DENY_IS_FATAL")
            .map(|v| v != "0")
            .unwrap_or(false);
        GateConfig {
            preload_library_name,
            deny_is_fatal,
        }
    }

    pub fn get() -> &'static GateConfig {
        &CONFIG
    }
}
