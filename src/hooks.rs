//! External-collaborator contracts. The code cache, the chunk allocator and the trampoline factory
//! are all built by other parts of the translator this crate does not own;
//! authorizers only ever need a narrow slice of each, so that slice is
//! expressed here as a trait. Production wiring supplies a real
//! kernel-backed implementation; tests supply a mock.

use crate::signal_table::Disposition;
use crate::verdict::SyscallArgs;

/// Queries answerable only by the code-cache / loader components.
pub trait TranslatorHooks {
    /// Is `addr` inside a range the translator itself produced code into?
    fn is_code_cache_address(&self, addr: usize) -> bool;

    /// Invalidate every translation whose source lies inside
    /// `[start, start+size)`, e.g. because the guest is about to `mprotect`
    /// it non-executable or `munmap` it.
    fn invalidate_translations_in(&mut self, start: usize, size: usize);

    /// Read the kernel's current disposition for `signal`, used once at
    /// startup to seed a [`crate::signal_table::SignalDispositionTable`].
    fn sigaction_query(&self, signal: i32) -> Disposition;

    /// Ask the kernel to install (or restore) a disposition.
    /// `install_real_handler` is false when the guest asked for
    /// `SIG_DFL`/`SIG_IGN`, in which case the kernel is told the truth
    /// instead of the translator's trampoline.
    fn sigaction_install(&mut self, signal: i32, disposition: Disposition, install_real_handler: bool);

    /// Issue the real `clone(2)` with the guest's original arguments (the
    /// child's stack, if any, already patched by the caller) and return the
    /// kernel's result: the child's tid on parent-side resume. Real wiring
    /// does this with the architecture's raw syscall convention; this lives
    /// behind a hook because a test can't safely clone the test process
    /// itself.
    fn real_clone(&mut self, args: SyscallArgs) -> isize;
}

/// The chunk allocator backing any guest request for fresh translator
/// memory, gated behind the `secu-allow-runtime-alloc` feature.
pub trait ChunkAllocator {
    /// Allocate at least `size` bytes of translator-internal memory and
    /// register the resulting range with the caller's region registry.
    /// Returns the base address, or `None` if the allocator is exhausted.
    fn alloc_chunk(&mut self, size: usize) -> Option<usize>;
}

/// Builds the small stub of code a `clone`d child's stack is patched to
/// return into first.
pub trait TrampolineFactory {
    /// Returns the address of a bootstrap trampoline for a freshly cloned
    /// thread, which the caller then writes into the child's designated
    /// return address before resuming it via `clone`.
    fn make_clone_bootstrap(&mut self) -> usize;
}

/// The union of every external collaborator an authorizer might need,
/// behind one trait object so [`crate::tld::Tld`] can hold a single `Arc`
/// instead of three. Anything implementing all three pieces gets this for
/// free.
pub trait GateHooks: TranslatorHooks + ChunkAllocator + TrampolineFactory + Send {}

impl<T: TranslatorHooks + ChunkAllocator + TrampolineFactory + Send> GateHooks for T {}

#[cfg(any(test, feature = "test-util"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MockHooks {
        pub code_cache_ranges: Vec<(usize, usize)>,
        pub invalidated: Vec<(usize, usize)>,
        pub dispositions: HashMap<i32, Disposition>,
        pub installs: Vec<(i32, Disposition, bool)>,
        pub next_chunk: usize,
        pub chunk_budget: usize,
        pub next_trampoline: usize,
        pub next_clone_tid: isize,
        pub clone_calls: Vec<SyscallArgs>,
    }

    impl TranslatorHooks for MockHooks {
        fn is_code_cache_address(&self, addr: usize) -> bool {
            self.code_cache_ranges
                .iter()
                .any(|&(start, size)| start <= addr && addr < start + size)
        }

        fn invalidate_translations_in(&mut self, start: usize, size: usize) {
            self.invalidated.push((start, size));
        }

        fn sigaction_query(&self, signal: i32) -> Disposition {
            self.dispositions.get(&signal).copied().unwrap_or_default()
        }

        fn sigaction_install(&mut self, signal: i32, disposition: Disposition, install_real_handler: bool) {
            self.installs.push((signal, disposition, install_real_handler));
            self.dispositions.insert(signal, disposition);
        }

        fn real_clone(&mut self, args: SyscallArgs) -> isize {
            self.clone_calls.push(args);
            self.next_clone_tid
        }
    }

    impl ChunkAllocator for MockHooks {
        fn alloc_chunk(&mut self, size: usize) -> Option<usize> {
            if self.chunk_budget == 0 {
                return None;
            }
            self.chunk_budget -= 1;
            let addr = self.next_chunk;
            self.next_chunk += size;
            Some(addr)
        }
    }

    impl TrampolineFactory for MockHooks {
        fn make_clone_bootstrap(&mut self) -> usize {
            self.next_trampoline += 0x100;
            self.next_trampoline
        }
    }

    pub fn shared_mock() -> std::sync::Arc<std::sync::Mutex<MockHooks>> {
        std::sync::Arc::new(std::sync::Mutex::new(MockHooks::default()))
    }
}
