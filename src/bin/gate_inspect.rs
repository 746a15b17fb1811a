//! Standalone inspector for the compiled-in dispatch table: dumps which
//! authorizer is wired to which syscall number as JSON, so the policy can be
//! audited without reading the source. Adapted from the host translator's
//! own `structopt` + `serde_json` command pattern.

use std::io;

use gate::authorizers::{init_syscalls, policy_name};
use gate::kernel_abi::MAX_SYSCALLS;
use serde::Serialize;
use structopt::StructOpt;

trait GateCommand {
    fn run(&self) -> io::Result<()>;
}

#[derive(StructOpt)]
#[structopt(name = "gate-inspect", about = "Inspect the compiled-in syscall dispatch table")]
struct Opt {
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Print every syscall number's policy as a JSON array
    Dispatch,
    /// Print the policy for one syscall number
    Syscall { nr: i32 },
}

#[derive(Serialize)]
struct SyscallPolicy {
    nr: i32,
    policy: String,
}

struct DispatchCommand;

impl GateCommand for DispatchCommand {
    fn run(&self) -> io::Result<()> {
        let table = init_syscalls();
        let entries: Vec<SyscallPolicy> = (0..MAX_SYSCALLS as i32)
            .map(|nr| SyscallPolicy {
                nr,
                policy: policy_name(&table, nr).to_string(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries).unwrap());
        Ok(())
    }
}

struct SyscallCommand {
    nr: i32,
}

impl GateCommand for SyscallCommand {
    fn run(&self) -> io::Result<()> {
        let table = init_syscalls();
        let entry = SyscallPolicy {
            nr: self.nr,
            policy: policy_name(&table, self.nr).to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&entry).unwrap());
        Ok(())
    }
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();
    let command: Box<dyn GateCommand> = match opt.cmd {
        Command::Dispatch => Box::new(DispatchCommand),
        Command::Syscall { nr } => Box::new(SyscallCommand { nr }),
    };
    command.run()
}
