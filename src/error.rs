//! Error classification for the syscall gate.
//!
//! Only class 3 (kernel-surfaced error) is ever recoverable, and it isn't
//! represented here at all — it travels back to the guest through `*retval`
//! exactly like a normal syscall return. `GateError` exists for the narrow
//! slice of class-2 cases where an authorizer discovers a malformed guest
//! input (not a safety violation, but not something it can quietly ignore
//! either) before it can classify the call as granted/denied/emulated.
use std::fmt;

#[derive(Debug)]
pub enum GateError {
    /// The guest passed a pointer the authorizer could not safely follow
    /// (e.g. a `sigaction` "new" struct at an unreadable address). A real
    /// translator would discover this via `read_bytes_fallible`; this crate
    /// does not implement guest memory access and instead models the
    /// failure mode directly.
    BadGuestPointer { address: usize },
    /// `execve`'s envp array could not be walked (missing NUL terminator,
    /// or ended mid-string).
    MalformedEnviron,
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::BadGuestPointer { address } => {
                write!(f, "unreadable guest pointer at {:#x}", address)
            }
            GateError::MalformedEnviron => write!(f, "malformed envp array"),
        }
    }
}

/// Every authorizer call funnels through here. `Err` is always a class-2
/// condition (the authorizer refuses to reason about the call further) and
/// is always fatal: there is no partial-trust state for this gate to fall
/// back into.
pub fn resolve_or_suicide<T>(cx: &str, result: Result<T, GateError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => crate::log::suicide(&format!("{cx}: {e}")),
    }
}
