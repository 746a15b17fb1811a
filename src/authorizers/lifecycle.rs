//! Process lifecycle authorizers.

use std::ffi::CStr;

use crate::config::GateConfig;
use crate::dispatch::DispatchTable;
use crate::error::GateError;
use crate::exit_sequence::{prepare_exit, unmap_and_exit};
use crate::kernel_abi::sys;
use crate::tld::Tld;
use crate::verdict::{SyscallArgs, Verdict};

const MAX_ENV_ENTRIES: usize = 4096;

/// # Safety
/// `envp_ptr` must point to a NULL-terminated array of NUL-terminated C
/// strings, as the kernel guarantees for a guest's own `execve` arguments.
unsafe fn envp_names_preload_library(envp_ptr: usize, library_name: &str) -> Result<bool, GateError> {
    if envp_ptr == 0 {
        return Err(GateError::MalformedEnviron);
    }
    let entries = envp_ptr as *const usize;
    for i in 0..MAX_ENV_ENTRIES {
        let entry = *entries.add(i);
        if entry == 0 {
            return Ok(false);
        }
        let var = CStr::from_ptr(entry as *const libc::c_char)
            .to_str()
            .map_err(|_| GateError::MalformedEnviron)?;
        if let Some(value) = var.strip_prefix("LD_PRELOAD=") {
            if value.split(':').any(|entry| entry.ends_with(library_name)) {
                return Ok(true);
            }
        }
    }
    Err(GateError::MalformedEnviron)
}

/// `execve(path, argv, envp)`. A child that doesn't inherit the gate's
/// `LD_PRELOAD` entry would run completely outside this crate's authority,
/// so the guest is denied rather than allowed to silently escape
/// interposition.
pub fn auth_execve(_tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, retval: &mut isize) -> Result<Verdict, GateError> {
    let config = GateConfig::get();
    let names_preload = unsafe { envp_names_preload_library(args.a3, &config.preload_library_name)? };
    if names_preload {
        Ok(Verdict::Granted)
    } else {
        crate::log!(
            crate::log::LogLevel::LogWarn,
            "denying execve: LD_PRELOAD does not name {}",
            config.preload_library_name
        );
        *retval = -1;
        Ok(Verdict::Emulated)
    }
}

/// `exit` / `exit_group`. Bookkeeping runs in ordinary Rust via
/// [`prepare_exit`]; if the translator gave this thread its own stack, the
/// unmap-then-exit tail must run as a single register-only sequence that
/// never touches the memory it's unmapping -- see
/// [`crate::exit_sequence::unmap_and_exit`]. A thread running on the
/// kernel-provided initial stack has nothing of its own to unmap and just
/// falls through to a plain grant, letting the real syscall terminate it.
pub fn auth_exit(tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, _retval: &mut isize) -> Result<Verdict, GateError> {
    let plan = prepare_exit(tld, args);
    if tld.translator_stack_base != 0 {
        unsafe { unmap_and_exit(plan, tld.translator_stack_base, tld.translator_stack_size) }
    }
    Ok(Verdict::Granted)
}

pub fn install(table: &mut DispatchTable) {
    table.set(sys::EXECVE, auth_execve);
    table.set(sys::EXIT, auth_exit);
    table.set(sys::EXIT_GROUP, auth_exit);
}
