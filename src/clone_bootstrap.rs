//! The bootstrap trampoline a freshly cloned thread's stack is patched to
//! return into, and the per-architecture glue that gets there.
//!
//! A `CLONE_VM` child starts life executing the guest's own entry code, with
//! no [`crate::tld::Tld`] yet and not registered anywhere. Letting any guest
//! instruction run first would be a translator-safety violation the moment
//! it touched anything the region registry or dispatch table assume is
//! already in place. [`authorizers::threads::auth_clone`] patches the
//! child's stack so its first `ret` lands here instead.

use std::sync::Arc;

use crate::tld::{SharedData, Tld};
use crate::hooks::GateHooks;
use std::sync::Mutex;

/// Build the new thread's [`Tld`], register it, and hand back the object
/// that the per-architecture entry stub below keeps alive for the life of
/// the thread. Split out from the asm-facing entry point so it is directly
/// unit testable.
pub fn bootstrap_new_thread(tid: libc::pid_t, parent: &Arc<SharedData>, shares_address_space: bool, hooks: Arc<Mutex<dyn GateHooks>>) -> Tld {
    let shared = if shares_address_space {
        SharedData::fork_sharing(parent)
    } else {
        SharedData::fork_independent(parent)
    };
    let mut tld = Tld::new(tid, shared, hooks);
    tld.register_self();
    tld.bootstrapped = true;
    tld
}

/// Real entry point the patched return address in
/// [`crate::authorizers::threads::auth_clone`] targets. Reads the parent's
/// `SharedData` and clone flags out of thread-local storage the clone
/// authorizer stashed them in, builds the child's `Tld`, and falls through
/// into the guest's original entry point. Left unimplemented pending the
/// code-cache component that owns "where does guest execution actually
/// resume"; [`bootstrap_new_thread`] is the part of
/// this file that is in scope today.
#[cfg(target_arch = "x86")]
#[no_mangle]
pub unsafe extern "C" fn gate_clone_bootstrap_entry() -> ! {
    crate::log::suicide("gate_clone_bootstrap_entry: guest-resumption handoff is not implemented")
}
