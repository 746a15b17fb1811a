//! End-to-end checks that a fully wired [`gate::DispatchTable`] behaves the
//! way the individual authorizer unit tests assume it would once installed
//! together.

use std::sync::Arc;

use gate::authorizers::init_syscalls;
use gate::hooks::mock::MockHooks;
use gate::kernel_abi::sys;
use gate::region_registry::RegionRegistry;
use gate::thread_registry::ThreadRegistry;
use gate::{SharedData, SyscallArgs, Tld, Verdict};

fn harness() -> (Tld, std::sync::Arc<std::sync::Mutex<MockHooks>>) {
    let dispatch = Arc::new(init_syscalls());
    let shared = Arc::new(SharedData {
        threads: ThreadRegistry::new(),
        regions: Arc::new(RegionRegistry::new()),
        dispatch,
    });
    let hooks = Arc::new(std::sync::Mutex::new(MockHooks::default()));
    (Tld::new(1, shared, hooks.clone()), hooks)
}

#[test]
fn ptrace_is_a_fatal_abort_end_to_end() {
    gate::log::enable_test_suicide_mode();
    let (mut tld, _hooks) = harness();
    let dispatch = Arc::clone(&tld.shared.dispatch);
    let mut a6 = 0;
    let mut retval = 0;
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        dispatch.authorize(&mut tld, SyscallArgs::new(sys::PTRACE, 0, 0, 0, 0, 0), &mut a6, &mut retval)
    }));
    assert!(result.is_err());
}

#[test]
fn mmap_then_mprotect_admits_then_invalidates_through_the_real_table() {
    let (mut tld, hooks) = harness();
    let dispatch = Arc::clone(&tld.shared.dispatch);
    let mut a6 = 0;
    let mut retval = 0;

    let prot_rx = (nix::sys::mman::ProtFlags::PROT_READ | nix::sys::mman::ProtFlags::PROT_EXEC).bits() as usize;
    let mmap_args = SyscallArgs::new(sys::MMAP, 0x70000, 0x1000, prot_rx, 0, 0);
    let verdict = dispatch.authorize(&mut tld, mmap_args, &mut a6, &mut retval).unwrap();
    assert_eq!(verdict, Verdict::Granted);
    assert!(tld.shared.regions.is_validated_executable(0x70100));

    let prot_r = nix::sys::mman::ProtFlags::PROT_READ.bits() as usize;
    let mprotect_args = SyscallArgs::new(sys::MPROTECT, 0x70000, 0x1000, prot_r, 0, 0);
    let verdict = dispatch.authorize(&mut tld, mprotect_args, &mut a6, &mut retval).unwrap();
    assert_eq!(verdict, Verdict::Granted);
    assert_eq!(hooks.lock().unwrap().invalidated, vec![(0x70000, 0x1000)]);
}

#[test]
fn clone_with_vm_sharing_patches_the_child_stack_through_the_real_table() {
    let (mut tld, hooks) = harness();
    hooks.lock().unwrap().next_trampoline = 0;
    hooks.lock().unwrap().next_clone_tid = 999;
    let dispatch = Arc::clone(&tld.shared.dispatch);

    let mut stack = [0usize; 4];
    let stack_top = unsafe { stack.as_mut_ptr().add(4) } as usize;
    let flags = gate::clone_flags::CloneFlags::CLONE_VM.bits() as usize;
    let args = SyscallArgs::new(sys::CLONE, flags, stack_top, 0, 0, 0);
    let mut a6 = 0;
    let mut retval = 0;
    let verdict = dispatch.authorize(&mut tld, args, &mut a6, &mut retval).unwrap();

    assert_eq!(verdict, Verdict::Emulated);
    assert_eq!(retval, 999);
    assert_ne!(stack[3], 0, "bootstrap address should have been written below the stack top");
    assert_eq!(tld.shared.threads.live_tids(), vec![999]);
}

#[test]
fn rt_sigaction_round_trips_through_the_real_table() {
    let (mut tld, _hooks) = harness();
    let dispatch = Arc::clone(&tld.shared.dispatch);

    #[repr(C)]
    struct RawSigactionLayout {
        handler: usize,
        flags: i32,
        restorer: usize,
        mask: u64,
    }
    let new = RawSigactionLayout {
        handler: 0xabc,
        flags: 0,
        restorer: 0,
        mask: 0,
    };
    let args = SyscallArgs::new(sys::RT_SIGACTION, 2, &new as *const _ as usize, 0, 0, 0);
    let mut a6 = 0;
    let mut retval = 0;
    let verdict = dispatch.authorize(&mut tld, args, &mut a6, &mut retval).unwrap();
    assert_eq!(verdict, Verdict::Emulated);
    assert_eq!(tld.signals.fetch(2).handler, 0xabc);
}

#[test]
fn execve_emulates_a_failed_call_when_ld_preload_is_absent_through_the_real_table() {
    let (mut tld, _hooks) = harness();
    let dispatch = Arc::clone(&tld.shared.dispatch);
    let envp: [usize; 1] = [0];
    let args = SyscallArgs::new(sys::EXECVE, 0, 0, envp.as_ptr() as usize, 0, 0);
    let mut a6 = 0;
    let mut retval = 0;
    let verdict = dispatch.authorize(&mut tld, args, &mut a6, &mut retval).unwrap();
    assert_eq!(verdict, Verdict::Emulated);
    assert_eq!(retval, -1);
}

#[test]
fn exit_on_the_kernel_stack_unregisters_and_grants_through_the_real_table() {
    let (mut tld, _hooks) = harness();
    tld.register_self();
    let dispatch = Arc::clone(&tld.shared.dispatch);
    let args = SyscallArgs::new(sys::EXIT, 0, 0, 0, 0, 0);
    let mut a6 = 0;
    let mut retval = 0;
    let verdict = dispatch.authorize(&mut tld, args, &mut a6, &mut retval).unwrap();
    assert_eq!(verdict, Verdict::Granted);
    assert!(tld.shared.threads.is_empty());
}
