//! `clone(2)` flag bits relevant to authorization.
//!
//! Only the bits this crate branches on are named; the guest is free to set
//! any other bit and it passes through untouched once granted.

use bitflags::bitflags;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct CloneFlags: u64 {
        const CLONE_VM      = 0x0000_0100;
        const CLONE_FS      = 0x0000_0200;
        const CLONE_FILES   = 0x0000_0400;
        const CLONE_SIGHAND = 0x0000_0800;
        const CLONE_THREAD  = 0x0001_0000;
    }
}

impl CloneFlags {
    pub fn from_raw(bits: usize) -> CloneFlags {
        CloneFlags::from_bits_truncate(bits as u64)
    }

    /// `CLONE_VM` is the bit that decides whether the new thread shares the
    /// caller's address space, which is what decides whether its
    /// [`crate::tld::SharedData`] is shared or independent.
    pub fn shares_address_space(self) -> bool {
        self.contains(CloneFlags::CLONE_VM)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clone_vm_alone_shares_address_space() {
        assert!(CloneFlags::from_raw(0x100).shares_address_space());
    }

    #[test]
    fn plain_fork_flags_do_not_share_address_space() {
        assert!(!CloneFlags::from_raw(0).shares_address_space());
    }

    #[test]
    fn unrelated_bits_do_not_affect_the_decision() {
        assert!(CloneFlags::from_raw(0x100 | 0x0200_0000).shares_address_space());
        assert!(!CloneFlags::from_raw(0x0200_0000).shares_address_space());
    }
}
