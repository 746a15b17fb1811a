//! `clone(2)` authorization.
//!
//! Denying thread creation outright isn't a security boundary this gate
//! tries to hold, so both branches below end up issuing the real syscall --
//! the authorizer's job is to get the bookkeeping right around it, not to
//! refuse it. A `CLONE_VM` child given a stack needs its first instruction
//! in the new thread redirected into a bootstrap trampoline, so that
//! [`crate::tld::Tld`] construction and thread registration happen before
//! any translated guest code runs on it. The translated call site issues a
//! bare `ret` immediately after the `clone` syscall instruction returns in
//! the child, so patching the word just below the guest-supplied stack
//! pointer with the trampoline's address is enough to redirect that `ret`
//! there instead of back into guest code. A plain `fork`-like clone (no
//! `CLONE_VM`) needs none of that: its "child" resumes on its own copied
//! stack at the same program counter, same as any other `fork`.

use std::mem::size_of;
use std::sync::Arc;

use crate::clone_bootstrap::bootstrap_new_thread;
use crate::clone_flags::CloneFlags;
use crate::dispatch::DispatchTable;
use crate::error::GateError;
use crate::kernel_abi::sys;
use crate::tld::Tld;
use crate::verdict::{SyscallArgs, Verdict};

/// # Safety
/// `child_stack_top` must be a writable guest stack pointer with at least
/// one machine word available below it.
unsafe fn patch_child_return_address(child_stack_top: usize, bootstrap: usize) -> Result<(), GateError> {
    if child_stack_top == 0 {
        return Err(GateError::BadGuestPointer {
            address: child_stack_top,
        });
    }
    let slot = (child_stack_top - size_of::<usize>()) as *mut usize;
    *slot = bootstrap;
    Ok(())
}

/// Interprets `args.a1` as the clone-flags word. Without `CLONE_VM` this is
/// a `fork`-like clone: the real syscall is issued as-is and its result
/// reported back. With `CLONE_VM` set, this creates a new thread sharing
/// the caller's address space: a bootstrap trampoline is allocated, the
/// child's stack is patched to return into it, a fresh `Tld` is registered
/// for the child, and only then is the real syscall issued. Arriving with
/// `CLONE_VM` set via the fast-sysenter path is not a combination this gate
/// knows how to authorize.
pub fn auth_clone(tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, retval: &mut isize) -> Result<Verdict, GateError> {
    let flags = CloneFlags::from_raw(args.a1);
    let child_stack = args.a2;

    crate::log!(
        crate::log::LogLevel::LogDebug,
        "authorizing clone flags={:?} shares_address_space={} child_stack={:#x}",
        flags,
        flags.shares_address_space(),
        child_stack
    );

    if !flags.shares_address_space() {
        let child_tid = tld.hooks.lock().unwrap().real_clone(args);
        *retval = child_tid;
        return Ok(Verdict::Emulated);
    }

    if args.is_sysenter {
        crate::log::suicide("auth_clone: CLONE_VM arriving via the fast-sysenter path is not a supported clone combination");
    }

    let bootstrap = tld.hooks.lock().unwrap().make_clone_bootstrap();
    if child_stack != 0 {
        unsafe { patch_child_return_address(child_stack, bootstrap)? };
    }

    let child_tid = tld.hooks.lock().unwrap().real_clone(args);
    bootstrap_new_thread(child_tid as libc::pid_t, &tld.shared, true, Arc::clone(&tld.hooks));
    *retval = child_tid;
    Ok(Verdict::Emulated)
}

pub fn install(table: &mut DispatchTable) {
    table.set(sys::CLONE, auth_clone);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dispatch::DispatchTable;
    use crate::hooks::mock::{shared_mock, MockHooks};
    use crate::region_registry::RegionRegistry;
    use crate::thread_registry::ThreadRegistry;
    use crate::tld::{SharedData, Tld};
    use std::sync::{Arc, Mutex};

    fn test_tld() -> (Tld, Arc<Mutex<MockHooks>>) {
        let shared = Arc::new(SharedData {
            threads: ThreadRegistry::new(),
            regions: Arc::new(RegionRegistry::new()),
            dispatch: Arc::new(DispatchTable::new_deny_all()),
        });
        let hooks = shared_mock();
        (Tld::new(1, shared, hooks.clone()), hooks)
    }

    #[test]
    fn fork_like_clone_without_clone_vm_skips_bootstrap_and_reports_the_kernel_tid() {
        let (mut tld, hooks) = test_tld();
        hooks.lock().unwrap().next_clone_tid = 4242;
        let args = SyscallArgs::new(sys::CLONE, 0, 0, 0, 0, 0);
        let mut a6 = 0;
        let mut retval = 0;
        let verdict = auth_clone(&mut tld, args, &mut a6, &mut retval).unwrap();
        assert_eq!(verdict, Verdict::Emulated);
        assert_eq!(retval, 4242);
        assert_eq!(hooks.lock().unwrap().next_trampoline, 0);
        assert!(tld.shared.threads.is_empty());
    }

    #[test]
    fn clone_vm_with_a_stack_patches_the_return_address_and_registers_the_child() {
        let (mut tld, hooks) = test_tld();
        hooks.lock().unwrap().next_clone_tid = 777;
        let mut stack = [0usize; 2];
        let stack_top = unsafe { stack.as_mut_ptr().add(2) } as usize;

        let args = SyscallArgs::new(sys::CLONE, CloneFlags::CLONE_VM.bits() as usize, stack_top, 0, 0, 0);
        let mut a6 = 0;
        let mut retval = 0;
        let verdict = auth_clone(&mut tld, args, &mut a6, &mut retval).unwrap();

        assert_eq!(verdict, Verdict::Emulated);
        assert_eq!(retval, 777);
        assert_eq!(stack[1], 0x100);
        assert_eq!(tld.shared.threads.live_tids(), vec![777]);
    }

    #[test]
    fn clone_vm_arriving_via_fast_sysenter_is_a_fatal_abort() {
        crate::log::enable_test_suicide_mode();
        let (mut tld, _hooks) = test_tld();
        let args = SyscallArgs::new(sys::CLONE, CloneFlags::CLONE_VM.bits() as usize, 0, 0, 0, 0).sysenter();
        let mut a6 = 0;
        let mut retval = 0;
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| auth_clone(&mut tld, args, &mut a6, &mut retval)));
        assert!(result.is_err());
    }
}
