//! Syscall interposition and authorization core for a user-mode dynamic
//! binary translator.
//!
//! A translator that runs guest code out of its own code cache has to
//! answer, for every syscall the guest attempts, one of three things: let
//! it through to the kernel unchanged, refuse it outright, or fake a result
//! without ever reaching the kernel. This crate is the part of the
//! translator that makes that decision -- it owns no code cache, no
//! disassembler, no trampoline generator of its own; those are assumed to
//! exist elsewhere and are reached only through the [`hooks`] traits.
//!
//! Six pieces make up the core:
//! - [`region_registry`]: which memory belongs to the translator and which
//!   the guest has legitimately made executable.
//! - [`signal_table`]: the guest's signal dispositions, shadowed so the
//!   kernel only ever sees the translator's own handler.
//! - [`thread_registry`]: which threads are alive in an address-space
//!   group.
//! - [`authorizers`]: the per-syscall policy functions.
//! - [`dispatch`]: the table that routes a syscall number to its
//!   authorizer.
//! - [`loader_shim`]: the `dlclose` override that keeps the code cache from
//!   outliving the library it was generated from.

pub mod log;

pub mod authorizers;
pub mod clone_bootstrap;
pub mod clone_flags;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod exit_sequence;
pub mod hooks;
pub mod kernel_abi;
pub mod loader_shim;
pub mod region_registry;
pub mod signal_table;
pub mod thread_registry;
pub mod tld;
pub mod verdict;

pub use dispatch::DispatchTable;
pub use error::GateError;
pub use tld::{SharedData, Tld};
pub use verdict::{Authorizer, SyscallArgs, Verdict};
