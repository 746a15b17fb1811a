//! Signal Disposition Table: a per-thread shadow of the guest's
//! intended signal handlers. The kernel never sees the guest's handler
//! directly — it always sees [`trampoline_sighandler`], and this table is
//! what lets the gate answer "what does the guest think its handler for
//! signal N is" without asking the kernel.

use std::convert::TryFrom;

/// SIGRTMAX on the targeted ABI; dispositions beyond this are never touched
/// by this gate.
pub const MAX_SIGNALS: usize = 65;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Disposition {
    pub handler: usize,
    pub mask: u64,
    pub flags: i32,
    pub restorer: usize,
}

impl Disposition {
    pub const SIG_DFL: usize = 0;
    pub const SIG_IGN: usize = 1;

    fn is_dfl_or_ign(&self) -> bool {
        self.handler == Self::SIG_DFL || self.handler == Self::SIG_IGN
    }
}

/// Installs the translator's own handler with the kernel in place of
/// whatever the guest asked for, exactly once per `(thread, signal)` slot
/// transition. Left generic over an installer closure so the table itself
/// doesn't need to know about `nix`/raw syscalls, which keeps it trivially
/// testable without a real kernel underneath.
pub struct SignalDispositionTable {
    slots: [Disposition; MAX_SIGNALS],
}

impl Default for SignalDispositionTable {
    fn default() -> SignalDispositionTable {
        SignalDispositionTable {
            slots: [Disposition::default(); MAX_SIGNALS],
        }
    }
}

impl SignalDispositionTable {
    pub fn new() -> SignalDispositionTable {
        SignalDispositionTable::default()
    }

    fn slot(&self, signal: i32) -> usize {
        usize::try_from(signal).expect("signal numbers are never negative on this ABI")
    }

    /// Query the kernel for each signal's current disposition and store it.
    /// `query` is the `TranslatorHooks`-backed kernel read; see
    /// [`crate::hooks::TranslatorHooks::sigaction_query`].
    pub fn init(&mut self, mut query: impl FnMut(i32) -> Disposition) {
        for signal in 0..MAX_SIGNALS {
            self.slots[signal] = query(signal as i32);
        }
    }

    /// Record the guest's intended disposition and install the
    /// translator-owned trampoline with the kernel, unless the guest asked
    /// for `SIG_IGN`/`SIG_DFL`, in which case no translated code will ever
    /// run for this signal and the kernel can be told the truth.
    pub fn install(
        &mut self,
        signal: i32,
        disposition: Disposition,
        mut kernel_install: impl FnMut(i32, Disposition, bool),
    ) {
        let idx = self.slot(signal);
        self.slots[idx] = disposition;
        let install_real_handler = !disposition.is_dfl_or_ign();
        kernel_install(signal, disposition, install_real_handler);
    }

    /// Return the disposition currently recorded for `signal` (used to
    /// report the "old" handler back to the guest).
    pub fn fetch(&self, signal: i32) -> Disposition {
        self.slots[self.slot(signal)]
    }
}

/// Stub for the translator-owned signal handler installed with the kernel.
/// The full resumption algorithm -- confirm whether the interrupted PC is
/// in translated code, build a trampoline to the guest-intended handler,
/// arrange resumption through it -- belongs to the code-cache component
/// this crate doesn't own. Until that's wired up: print a warning and spin
/// so a debugger can attach, and only when `sleep-on-fail` is enabled.
#[cfg(feature = "sleep-on-fail")]
pub extern "C" fn trampoline_sighandler(signal: libc::c_int) {
    crate::log!(
        crate::log::LogLevel::LogFatal,
        "signal {} delivered to translator trampoline; resumption algorithm \
         is an open design question -- spinning for a debugger",
        signal
    );
    loop {
        std::hint::spin_loop();
    }
}
