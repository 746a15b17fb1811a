//! Thread Registry: the set of live threads sharing one address
//! space, protected by a single mutex.
//!
//! Unlike the host translator's own thread-group bookkeeping (a `Weak`/`Rc`
//! ownership graph of parent and child thread groups, since it also has to
//! track process-tree relationships for a record/replay debugger), this
//! gate has no hierarchy to preserve: it only ever needs to answer "which
//! threads are currently alive in this address-space group", so a flat
//! `Vec` behind a `Mutex` gives safe concurrent unlinking with none of the
//! weak-pointer bookkeeping that ownership graph needs.

use libc::pid_t;
use std::sync::{Arc, Mutex};

#[derive(Copy, Clone, Debug)]
pub struct ThreadEntry {
    pub tid: pid_t,
}

/// Shared once per address-space group. Held by
/// every [`crate::tld::Tld`] in the group via `Arc`.
#[derive(Default)]
pub struct ThreadRegistry {
    threads: Mutex<Vec<ThreadEntry>>,
}

impl ThreadRegistry {
    pub fn new() -> Arc<ThreadRegistry> {
        Arc::new(ThreadRegistry::default())
    }

    /// Add `tid` to the registry. `register` happens-before any other
    /// thread observing the new entry: the mutex's release/acquire pair
    /// gives that for free.
    pub fn register(&self, tid: pid_t) {
        let mut threads = self.threads.lock().unwrap();
        crate::log!(
            crate::log::LogLevel::LogDebug,
            "registering thread {} (now {} live)",
            tid,
            threads.len() + 1
        );
        threads.push(ThreadEntry { tid });
    }

    /// Remove the entry for `tid`. If it isn't present, log a warning but do
    /// not abort — by the time `exit`/`exit_group` calls this, the registry
    /// not already containing the calling thread is surprising but not a
    /// translator-safety violation.
    pub fn unregister(&self, tid: pid_t) {
        let mut threads = self.threads.lock().unwrap();
        let before = threads.len();
        threads.retain(|t| t.tid != tid);
        if threads.len() == before {
            crate::log!(
                crate::log::LogLevel::LogWarn,
                "*** WARNING *** thread {} was not found in the thread registry on exit",
                tid
            );
        }
    }

    pub fn live_tids(&self) -> Vec<pid_t> {
        self.threads.lock().unwrap().iter().map(|t| t.tid).collect()
    }

    pub fn len(&self) -> usize {
        self.threads.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
