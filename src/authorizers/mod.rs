//! Concrete syscall authorizers and the table they're installed into.

pub mod basic;
pub mod lifecycle;
pub mod memory;
pub mod signals;
pub mod threads;

use crate::dispatch::DispatchTable;
use crate::kernel_abi::sys;
use crate::verdict::Authorizer;

/// Build a fully wired table: default-fill policy first, then each family's
/// specific overrides layered on top. Order matters only in that later
/// `install` calls win on any syscall two families both claim -- none do
/// today, but [`basic::install`] runs last so an explicit deny always wins
/// over a family that forgot to carve a number out.
pub fn init_syscalls() -> DispatchTable {
    let mut table = DispatchTable::new();

    #[cfg(feature = "authorize-syscalls")]
    {
        lifecycle::install(&mut table);
        memory::install(&mut table);
        #[cfg(feature = "handle-signals")]
        signals::install(&mut table);
        #[cfg(feature = "handle-threads")]
        threads::install(&mut table);
        basic::install(&mut table);
    }

    #[cfg(feature = "debug-trace")]
    table.set(sys::GETTID, basic::debug_syscall);

    table
}

/// Human-readable label for whatever authorizer currently sits at `nr`, for
/// `gate-inspect` and for tests that want to assert on wiring without
/// duplicating the dispatch logic. Based on function-pointer identity, so it
/// only ever names an authorizer actually installed in this module, never
/// guesses.
pub fn policy_name(table: &DispatchTable, nr: i32) -> &'static str {
    let f = table.get(nr);
    let mut named: Vec<(Authorizer, &'static str)> = vec![
        (basic::deny_syscall, "deny"),
        (basic::allow_syscall, "allow"),
        (basic::debug_syscall, "debug"),
        (lifecycle::auth_execve, "execve"),
        (lifecycle::auth_exit, "exit"),
        (memory::auth_mmap, "mmap"),
        (memory::auth_mmap2, "mmap2"),
        (memory::auth_mprotect, "mprotect"),
    ];
    #[cfg(feature = "handle-signals")]
    named.extend([
        (signals::auth_sigaction as Authorizer, "sigaction"),
        (signals::auth_rt_sigaction as Authorizer, "rt_sigaction"),
    ]);
    #[cfg(feature = "handle-threads")]
    named.push((threads::auth_clone as Authorizer, "clone"));

    named
        .iter()
        .find(|(candidate, _)| *candidate == f)
        .map(|(_, name)| *name)
        .unwrap_or(if nr >= crate::kernel_abi::NR_SYSCALLS { "default-deny" } else { "default-allow" })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hooks::mock::shared_mock;
    use crate::region_registry::RegionRegistry;
    use crate::thread_registry::ThreadRegistry;
    use crate::tld::{SharedData, Tld};
    use crate::verdict::{SyscallArgs, Verdict};
    use std::sync::Arc;

    fn test_tld() -> Tld {
        let shared = Arc::new(SharedData {
            threads: ThreadRegistry::new(),
            regions: Arc::new(RegionRegistry::new()),
            dispatch: Arc::new(DispatchTable::new_deny_all()),
        });
        Tld::new(1, shared, shared_mock())
    }

    #[test]
    fn fully_wired_table_still_fatally_aborts_ptrace() {
        crate::log::enable_test_suicide_mode();
        let table = init_syscalls();
        let mut tld = test_tld();
        let mut a6 = 0;
        let mut retval = 0;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            table.authorize(&mut tld, SyscallArgs::new(sys::PTRACE, 0, 0, 0, 0, 0), &mut a6, &mut retval)
        }));
        assert!(result.is_err());
    }

    #[test]
    fn fully_wired_table_emulates_a_failed_execve_with_no_ld_preload_entry() {
        let table = init_syscalls();
        let mut tld = test_tld();
        let envp = [0usize]; // empty, NULL-terminated -- no LD_PRELOAD entry at all
        let args = SyscallArgs::new(sys::EXECVE, 0, 0, envp.as_ptr() as usize, 0, 0);
        let mut a6 = 0;
        let mut retval = 0;
        let verdict = table.authorize(&mut tld, args, &mut a6, &mut retval).unwrap();
        assert_eq!(verdict, Verdict::Emulated);
        assert_eq!(retval, -1);
    }

    #[test]
    fn policy_name_reports_deny_for_ptrace_and_execve_for_execve() {
        let table = init_syscalls();
        assert_eq!(policy_name(&table, sys::PTRACE), "deny");
        assert_eq!(policy_name(&table, sys::EXECVE), "execve");
    }
}
