//! Per-thread and per-address-space-group data.
//!
//! `Tld` is what every authorizer actually touches: it is passed `&mut` into
//! each call, and owns (or reaches, via `Arc`, into) everything an authorizer
//! is allowed to mutate. `SharedData` is the subset that genuinely must be
//! visible across every thread of one address-space group — today that's
//! just the thread registry, but `mmap`/`mprotect` authorizers reach the
//! same [`crate::region_registry::RegionRegistry`] through it too.

use std::sync::{Arc, Mutex};

use libc::pid_t;

use crate::dispatch::DispatchTable;
use crate::hooks::GateHooks;
use crate::region_registry::RegionRegistry;
use crate::signal_table::SignalDispositionTable;
use crate::thread_registry::ThreadRegistry;

/// Data shared by every thread in one `CLONE_VM` group. Threads that do not share an address space (plain `fork`, or a
/// `clone` without `CLONE_VM`) each get their own.
pub struct SharedData {
    pub threads: Arc<ThreadRegistry>,
    pub regions: Arc<RegionRegistry>,
    pub dispatch: Arc<DispatchTable>,
}

impl SharedData {
    pub fn new(dispatch: Arc<DispatchTable>) -> Arc<SharedData> {
        Arc::new(SharedData {
            threads: ThreadRegistry::new(),
            regions: Arc::new(RegionRegistry::new()),
            dispatch,
        })
    }

    /// A `CLONE_VM` child shares everything its parent does; construct its
    /// `SharedData` by cloning the parent's `Arc`s, not by building fresh
    /// ones.
    pub fn fork_sharing(parent: &Arc<SharedData>) -> Arc<SharedData> {
        Arc::clone(parent)
    }

    /// A non-`CLONE_VM` child (plain `fork`, or `clone` without it) gets an
    /// independent address space and so needs its own thread registry and
    /// region registry, seeded from nothing -- the new process will
    /// re-establish its own translator-internal regions during init.
    pub fn fork_independent(parent: &Arc<SharedData>) -> Arc<SharedData> {
        SharedData::new(Arc::clone(&parent.dispatch))
    }
}

/// Thread-local data. One per OS thread running translated
/// code.
pub struct Tld {
    pub tid: pid_t,
    pub shared: Arc<SharedData>,
    pub signals: SignalDispositionTable,
    pub hooks: Arc<Mutex<dyn GateHooks>>,
    /// Set once the thread has passed through the bootstrap trampoline after
    /// a `clone`; read by authorizers that must distinguish "about to become
    /// a guest thread" from "already running guest code".
    pub bootstrapped: bool,
    /// The translator-internal stack this thread runs on, if the translator
    /// allocated one -- `0`/`0` for the initial thread, which runs on the
    /// stack the kernel set up at `execve` time and is never unmapped by
    /// this crate.
    pub translator_stack_base: usize,
    pub translator_stack_size: usize,
}

impl Tld {
    pub fn new(tid: pid_t, shared: Arc<SharedData>, hooks: Arc<Mutex<dyn GateHooks>>) -> Tld {
        Tld {
            tid,
            shared,
            signals: SignalDispositionTable::new(),
            hooks,
            bootstrapped: false,
            translator_stack_base: 0,
            translator_stack_size: 0,
        }
    }

    pub fn register_self(&self) {
        self.shared.threads.register(self.tid);
    }

    pub fn unregister_self(&self) {
        self.shared.threads.unregister(self.tid);
    }
}
