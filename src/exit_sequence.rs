//! `exit` / `exit_group` tail.
//!
//! A thread's own stack is translator-internal memory that must
//! be unmapped once the thread is gone, but the thread is still running on
//! that stack up until the moment it calls `exit`. The two operations --
//! `munmap` the stack, then `exit` the thread -- must happen back to back
//! with no intervening access to the memory being unmapped, which rules out
//! any normal Rust function call between them (a call needs the stack to
//! push a return address). The actual tail is therefore a short run of
//! register-only inline assembly; everything that can safely be ordinary
//! Rust -- unregistering the thread, deciding whether this is the last
//! thread in the group -- happens first and is what [`prepare_exit`]
//! covers on its own so it can be unit tested without ever reaching the
//! asm.

use crate::kernel_abi::{is_exit_syscall, sys};
use crate::tld::Tld;
use crate::verdict::SyscallArgs;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExitPlan {
    pub exit_nr: i32,
    pub code: i32,
    /// True if no other thread remains registered in the address-space
    /// group after this one unregisters -- informational only; both
    /// `exit` and `exit_group` unmap and terminate unconditionally, the
    /// kernel decides whether the process as a whole survives.
    pub was_last_thread: bool,
}

/// Unregister the calling thread and compute what the asm tail needs to
/// know. Pure bookkeeping: no syscalls, no stack-unmap, fully testable.
pub fn prepare_exit(tld: &mut Tld, args: SyscallArgs) -> ExitPlan {
    debug_assert!(is_exit_syscall(args.nr));
    tld.unregister_self();
    ExitPlan {
        exit_nr: args.nr,
        code: args.a1 as i32,
        was_last_thread: tld.shared.threads.is_empty(),
    }
}

/// Unmap `[stack_base, stack_base+stack_size)` and terminate with `plan`'s
/// syscall and code, without touching the unmapped range or any other stack
/// memory in between. Diverges unconditionally; there is no path back into
/// safe Rust once this is called.
///
/// # Safety
/// `stack_base`/`stack_size` must describe a mapping the caller is certain
/// nothing else holds a live reference into, and this must be the last
/// thing the calling thread ever does.
#[cfg(target_arch = "x86")]
pub unsafe fn unmap_and_exit(plan: ExitPlan, stack_base: usize, stack_size: usize) -> ! {
    const MUNMAP: i32 = 91;
    core::arch::asm!(
        "int 0x80",
        "mov eax, {exit_nr}",
        "mov ebx, {code}",
        "int 0x80",
        in("eax") MUNMAP,
        in("ebx") stack_base,
        in("ecx") stack_size,
        exit_nr = in(reg) plan.exit_nr,
        code = in(reg) plan.code,
        options(noreturn)
    )
}

/// Every other host architecture is out of scope: there
/// is no known-correct raw syscall sequence to fall back to, so this aborts
/// rather than guess at one.
#[cfg(not(target_arch = "x86"))]
pub unsafe fn unmap_and_exit(_plan: ExitPlan, _stack_base: usize, _stack_size: usize) -> ! {
    crate::log::suicide("exit_sequence::unmap_and_exit has no implementation for this target architecture")
}
