//! The three catch-all authorizers every other syscall's policy is defined
//! relative to.

use crate::dispatch::DispatchTable;
use crate::error::GateError;
use crate::kernel_abi::sys;
use crate::tld::Tld;
use crate::verdict::{SyscallArgs, Verdict};

/// Logs the call and grants it. Installed only when `debug-trace` is on, in
/// front of syscalls worth tracing but not worth restricting.
pub fn debug_syscall(_tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, _retval: &mut isize) -> Result<Verdict, GateError> {
    crate::log!(
        crate::log::LogLevel::LogDebug,
        "syscall {} (a1={:#x} a2={:#x} a3={:#x})",
        args.nr,
        args.a1,
        args.a2,
        args.a3
    );
    Ok(Verdict::Granted)
}

/// Unconditional refusal. Used for syscalls that exist only to let a guest
/// probe or subvert the translator itself: `ptrace`, unused/squatted slots.
/// A guest reaching one of these is itself a translator-safety violation, so
/// this never returns to its caller.
pub fn deny_syscall(_tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, _retval: &mut isize) -> Result<Verdict, GateError> {
    crate::log!(crate::log::LogLevel::LogFatal, "illegal syscall {}", args.nr);
    crate::log::suicide("This system call is illegal")
}

/// Unconditional grant with no logging. Distinct from the dispatch table's
/// own default-fill `allow` so it can be installed explicitly and show up in
/// [`super::init_syscalls`] as a deliberate policy, not an oversight.
pub fn allow_syscall(_tld: &mut Tld, _args: SyscallArgs, _a6: &mut usize, _retval: &mut isize) -> Result<Verdict, GateError> {
    Ok(Verdict::Granted)
}

/// Wire the always-deny syscalls into `table`. Split out from
/// [`super::init_syscalls`] so each policy family can be tested in
/// isolation.
pub fn install(table: &mut DispatchTable) {
    table.set(sys::PTRACE, deny_syscall);
    table.set(sys::SIGRETURN, deny_syscall);
    table.set(sys::RT_SIGRETURN, deny_syscall);
    table.set(sys::UNUSED1, deny_syscall);
    table.set(sys::UNUSED2, deny_syscall);
    table.set(sys::UNUSED3, deny_syscall);
    table.set(sys::SETALTROOT, deny_syscall);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dispatch::DispatchTable;
    use crate::hooks::mock::shared_mock;
    use crate::region_registry::RegionRegistry;
    use crate::thread_registry::ThreadRegistry;
    use crate::tld::{SharedData, Tld};
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
    fn install_wires_ptrace_and_unused_slots_to_the_fatal_deny() {
        let mut table = DispatchTable::new();
        install(&mut table);
        for &nr in &[
            sys::PTRACE,
            sys::SIGRETURN,
            sys::RT_SIGRETURN,
            sys::UNUSED1,
            sys::UNUSED2,
            sys::UNUSED3,
            sys::SETALTROOT,
        ] {
            assert_eq!(
                table.get(nr) as usize,
                deny_syscall as usize,
                "nr={} should be wired to deny_syscall",
                nr
            );
        }
    }

    #[test]
    fn deny_syscall_is_a_fatal_abort_not_a_soft_denial() {
        crate::log::enable_test_suicide_mode();
        let mut tld = test_tld();
        let mut a6 = 0;
        let mut retval = 0;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            deny_syscall(&mut tld, SyscallArgs::new(sys::PTRACE, 0, 0, 0, 0, 0), &mut a6, &mut retval)
        }));
        assert!(result.is_err(), "deny_syscall should abort rather than return");
    }
}
