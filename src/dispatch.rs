//! Dispatch Table: a fixed-size array of [`Authorizer`] function
//! pointers, one slot per syscall number, with a default and an override
//! mechanism. [`crate::authorizers::init_syscalls`] is what actually
//! populates a production table; this module only owns the table shape and
//! the default-fill policy.

use crate::error::GateError;
use crate::kernel_abi::{MAX_SYSCALLS, NR_SYSCALLS};
use crate::tld::Tld;
use crate::verdict::{Authorizer, SyscallArgs, Verdict};

/// Default for every in-range syscall that has no specific authorizer: let
/// it through unexamined. Matches the host translator's own default, which
/// assumes new syscalls are benign until an authorizer says otherwise.
fn allow_syscall(_tld: &mut Tld, _args: SyscallArgs, _a6: &mut usize, _retval: &mut isize) -> Result<Verdict, GateError> {
    Ok(Verdict::Granted)
}

/// Default for every slot at or beyond [`NR_SYSCALLS`]: a number the gate
/// was not built against is guilty until proven innocent.
fn deny_syscall(_tld: &mut Tld, _args: SyscallArgs, _a6: &mut usize, retval: &mut isize) -> Result<Verdict, GateError> {
    *retval = -1;
    Ok(Verdict::Denied)
}

pub struct DispatchTable {
    slots: [Authorizer; MAX_SYSCALLS],
}

impl DispatchTable {
    /// Build the table with the default-fill policy applied and no
    /// overrides: in-range syscalls `allow`, out-of-range ones `deny`.
    pub fn new() -> DispatchTable {
        let mut slots: [Authorizer; MAX_SYSCALLS] = [deny_syscall; MAX_SYSCALLS];
        for slot in slots.iter_mut().take(NR_SYSCALLS as usize) {
            *slot = allow_syscall;
        }
        DispatchTable { slots }
    }

    /// Every slot denies. Used by tests and by [`crate::tld`] doctests that
    /// need a table but don't exercise any particular syscall's policy.
    pub fn new_deny_all() -> DispatchTable {
        DispatchTable {
            slots: [deny_syscall; MAX_SYSCALLS],
        }
    }

    /// Install `authorizer` at `nr`, overriding whatever default-fill policy
    /// placed there.  Out-of-range `nr` is a translator-safety bug, not a
    /// guest-controllable condition, so it panics rather than returning
    /// `Result`.
    pub fn set(&mut self, nr: i32, authorizer: Authorizer) {
        self.slots[usize::try_from(nr).expect("syscall numbers are never negative")] = authorizer;
    }

    pub fn get(&self, nr: i32) -> Authorizer {
        match usize::try_from(nr) {
            Ok(idx) if idx < self.slots.len() => self.slots[idx],
            _ => deny_syscall,
        }
    }

    /// Run the authorizer for `args.nr` and return its verdict. This is the
    /// single call site the translator's syscall-entry trampoline invokes.
    pub fn authorize(
        &self,
        tld: &mut Tld,
        args: SyscallArgs,
        a6: &mut usize,
        retval: &mut isize,
    ) -> Result<Verdict, GateError> {
        self.get(args.nr)(tld, args, a6, retval)
    }
}

impl Default for DispatchTable {
    fn default() -> DispatchTable {
        DispatchTable::new()
    }
}
