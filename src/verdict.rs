//! The three-valued decision an authorizer hands back to the dispatcher,
//! and the argument bundle every authorizer receives.

use crate::error::GateError;
use crate::tld::Tld;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Verdict {
    /// Caller performs the real syscall with the original arguments.
    Granted,
    /// Caller terminates the process; `*retval` has already been set to -1.
    Denied,
    /// Caller returns to the guest without calling the kernel; `*retval`
    /// carries what the guest will observe.
    Emulated,
}

/// The guest's syscall-entry register state, as handed to the dispatcher by
/// the translator. `a6` and `retval` are separate out-parameters rather than
/// fields here because exactly one authorizer signature needs to mutate
/// them; authorizers may not mutate anything else about the call.
#[derive(Copy, Clone, Debug)]
pub struct SyscallArgs {
    pub nr: i32,
    pub a1: usize,
    pub a2: usize,
    pub a3: usize,
    pub a4: usize,
    pub a5: usize,
    pub is_sysenter: bool,
}

impl SyscallArgs {
    pub fn new(nr: i32, a1: usize, a2: usize, a3: usize, a4: usize, a5: usize) -> SyscallArgs {
        SyscallArgs {
            nr,
            a1,
            a2,
            a3,
            a4,
            a5,
            is_sysenter: false,
        }
    }

    pub fn sysenter(mut self) -> SyscallArgs {
        self.is_sysenter = true;
        self
    }
}

/// Signature shared by every entry in the dispatch table.
/// A plain `fn` pointer, not a `Box<dyn Fn>`: authorizers close over nothing,
/// all state travels through `&mut Tld`, so the table stays `'static` and
/// `Copy` the way a function-pointer table in C would be.
pub type Authorizer =
    fn(&mut Tld, SyscallArgs, a6: &mut usize, retval: &mut isize) -> Result<Verdict, GateError>;
