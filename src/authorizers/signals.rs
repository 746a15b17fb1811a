//! Signal-disposition authorizers.
//!
//! None of these ever forward the guest's raw syscall. The kernel's
//! disposition for a signal is changed exactly once, by the call to
//! [`crate::hooks::TranslatorHooks::sigaction_install`] inside
//! [`crate::signal_table::SignalDispositionTable::install`] -- not by
//! letting the guest's `sigaction(2)` through with its own arguments,
//! because that would require rewriting the new-disposition pointer to
//! point at a translator-owned struct naming the trampoline, and this
//! dispatch table has no way to rewrite anything but the sixth register.
//! Every signal authorizer therefore reports `Emulated`: the shadow table is
//! the only place a disposition change is visible to the guest.

use std::sync::Arc;

use crate::dispatch::DispatchTable;
use crate::error::GateError;
use crate::kernel_abi::sys;
use crate::signal_table::Disposition;
use crate::tld::Tld;
use crate::verdict::{SyscallArgs, Verdict};

/// Layout a raw `sigaction` struct is read from / written to in guest
/// memory. Real kernel `sigaction` and `rt_sigaction` differ in mask width
/// and field order; this crate only reasons about the fields the shadow
/// table actually tracks; [`crate::loader_shim`] and the bootstrap code that
/// builds real kernel-facing structs handle the ABI-exact layout.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct RawSigaction {
    pub handler: usize,
    pub flags: i32,
    pub restorer: usize,
    pub mask: u64,
}

/// # Safety
/// `ptr` must point to readable memory holding at least a [`RawSigaction`].
unsafe fn read_raw_sigaction(ptr: usize) -> Result<RawSigaction, GateError> {
    if ptr == 0 {
        return Err(GateError::BadGuestPointer { address: ptr });
    }
    Ok(*(ptr as *const RawSigaction))
}

/// # Safety
/// `ptr` must point to writable memory holding at least a [`RawSigaction`].
unsafe fn write_raw_sigaction(ptr: usize, value: RawSigaction) -> Result<(), GateError> {
    if ptr == 0 {
        return Err(GateError::BadGuestPointer { address: ptr });
    }
    *(ptr as *mut RawSigaction) = value;
    Ok(())
}

fn disposition_to_raw(d: Disposition) -> RawSigaction {
    RawSigaction {
        handler: d.handler,
        flags: d.flags,
        restorer: d.restorer,
        mask: d.mask,
    }
}

/// Shared body for `sigaction` and `rt_sigaction`: `a1`=signum,
/// `a2`=pointer to the new action (or 0 to query only), `a3`=pointer to
/// receive the old action (or 0 if the guest doesn't want it).
fn auth_sigaction_family(tld: &mut Tld, args: SyscallArgs, retval: &mut isize) -> Result<Verdict, GateError> {
    let signum = args.a1 as i32;
    let new_ptr = args.a2;
    let old_ptr = args.a3;

    let old = tld.signals.fetch(signum);
    if old_ptr != 0 {
        unsafe { write_raw_sigaction(old_ptr, disposition_to_raw(old))? };
    }

    if new_ptr == 0 {
        return Ok(Verdict::Emulated);
    }

    let requested = unsafe { read_raw_sigaction(new_ptr)? };
    let disposition = Disposition {
        handler: requested.handler,
        mask: requested.mask,
        flags: requested.flags,
        restorer: requested.restorer,
    };

    let hooks = Arc::clone(&tld.hooks);
    tld.signals.install(signum, disposition, move |sig, disp, install_real| {
        hooks.lock().unwrap().sigaction_install(sig, disp, install_real);
    });

    *retval = 0;
    Ok(Verdict::Emulated)
}

pub fn auth_sigaction(tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, retval: &mut isize) -> Result<Verdict, GateError> {
    auth_sigaction_family(tld, args, retval)
}

pub fn auth_rt_sigaction(tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, retval: &mut isize) -> Result<Verdict, GateError> {
    auth_sigaction_family(tld, args, retval)
}

/// The pre-POSIX `signal(2)`: `a1`=signum, `a2`=handler value directly (no
/// pointer, no mask/flags/restorer), return value is the previous handler.
#[cfg(feature = "legacy-signal-syscall")]
pub fn auth_signal(tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, retval: &mut isize) -> Result<Verdict, GateError> {
    let signum = args.a1 as i32;
    let old = tld.signals.fetch(signum);
    let disposition = Disposition {
        handler: args.a2,
        mask: 0,
        flags: 0,
        restorer: 0,
    };

    let hooks = Arc::clone(&tld.hooks);
    tld.signals.install(signum, disposition, move |sig, disp, install_real| {
        hooks.lock().unwrap().sigaction_install(sig, disp, install_real);
    });

    *retval = old.handler as isize;
    Ok(Verdict::Emulated)
}

pub fn install(table: &mut DispatchTable) {
    table.set(sys::SIGACTION, auth_sigaction);
    table.set(sys::RT_SIGACTION, auth_rt_sigaction);
    #[cfg(feature = "legacy-signal-syscall")]
    table.set(sys::SIGNAL, auth_signal);
}
