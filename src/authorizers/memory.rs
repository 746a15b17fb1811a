//! Memory-mapping authorizers.
//!
//! The shared rule underneath all three: a guest can ask for whatever
//! mapping it likes, but never one that overlaps a translator-internal
//! range, and any mapping it admits as executable is recorded in the region
//! registry so later translation requests inside it are recognized as
//! legitimate rather than a self-modifying-code surprise.

use nix::sys::mman::ProtFlags;

use crate::dispatch::DispatchTable;
use crate::error::GateError;
use crate::kernel_abi::sys;
use crate::tld::Tld;
use crate::verdict::{SyscallArgs, Verdict};

fn prot_flags(bits: usize) -> ProtFlags {
    ProtFlags::from_bits_truncate(bits as i32)
}

/// Shared body for `mmap` and `mmap2`: `a1`=addr hint, `a2`=length,
/// `a3`=prot, `a6` (out param, `a4` in the raw call) carries the fd in the
/// real syscall but plays no role in authorization.
fn auth_mmap_family(tld: &mut Tld, args: SyscallArgs, _retval: &mut isize) -> Result<Verdict, GateError> {
    let addr_hint = args.a1;
    let length = args.a2;
    let prot = prot_flags(args.a3);

    if addr_hint != 0 && tld.shared.regions.overlaps_translator(addr_hint, length) {
        crate::log::suicide(&format!(
            "mmap at {:#x}+{:#x} overlaps translator-internal region",
            addr_hint, length
        ));
    }

    // The addr hint is honored by the kernel at GRANTED time; admission to
    // the executable region set happens only once the real mapping exists,
    // which for a hinted address is now, and for a kernel-chosen address
    // would need the dispatcher to admit post-hoc using the real return
    // value. Hinted executable mappings are the common case this crate's
    // authorizers are exercised against; post-hoc admission for
    // kernel-chosen addresses is the dispatcher's responsibility once the
    // real return value is known.
    if prot.contains(ProtFlags::PROT_EXEC) && addr_hint != 0 {
        tld.shared.regions.admit_executable(addr_hint, length);
    }

    Ok(Verdict::Granted)
}

pub fn auth_mmap(tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, retval: &mut isize) -> Result<Verdict, GateError> {
    auth_mmap_family(tld, args, retval)
}

pub fn auth_mmap2(tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, retval: &mut isize) -> Result<Verdict, GateError> {
    auth_mmap_family(tld, args, retval)
}

/// `mprotect(addr, len, prot)`: any overlap with a translator-internal
/// region is a translator-safety violation and fatally aborts; otherwise
/// grant, admitting the range to `V` if it gains `PROT_EXEC` or invalidating
/// cached translations in it if it loses `PROT_EXEC`.
pub fn auth_mprotect(tld: &mut Tld, args: SyscallArgs, _a6: &mut usize, _retval: &mut isize) -> Result<Verdict, GateError> {
    let addr = args.a1;
    let length = args.a2;
    let prot = prot_flags(args.a3);

    if tld.shared.regions.overlaps_translator(addr, length) {
        crate::log::suicide(&format!(
            "mprotect at {:#x}+{:#x} overlaps translator-internal region",
            addr, length
        ));
    }

    if prot.contains(ProtFlags::PROT_EXEC) {
        tld.shared.regions.admit_executable(addr, length);
    } else {
        tld.hooks.lock().unwrap().invalidate_translations_in(addr, length);
    }

    Ok(Verdict::Granted)
}

pub fn install(table: &mut DispatchTable) {
    table.set(sys::MMAP, auth_mmap);
    table.set(sys::MMAP2, auth_mmap2);
    table.set(sys::MPROTECT, auth_mprotect);
}
