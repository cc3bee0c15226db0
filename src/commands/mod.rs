//! The pluggable command registry plus a default set of builtins
//! covering every reserved name `spec.md` §6 lists.

pub mod addv;
pub mod append_cmd;
pub mod cat;
pub mod echo;
pub mod help_cmd;
pub mod job_cmds;
pub mod registry;
pub mod run_cmd;
pub mod sleep_cmd;
pub mod test_cmd;
pub mod types;
pub mod upper;
pub mod wc;
pub mod write_cmd;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

pub use registry::CommandRegistry;
pub use types::{Command, CommandContext, FgOutcome, JobSummary, ModuleLoader, NoModules, NullVmControl, VmControl};

/// Build a registry with every reserved command (`spec.md` §6) plus the
/// small extras `pushvm.py` shipped (`upper`, `cat`, `wc`, `help`).
pub fn default_registry() -> CommandRegistry {
    let mut reg = CommandRegistry::new();
    reg.register(Arc::new(echo::EchoCommand));
    reg.register(Arc::new(upper::UpperCommand));
    reg.register(Arc::new(cat::CatCommand));
    reg.register(Arc::new(wc::WcCommand));
    let test_handler = Arc::new(test_cmd::TestCommand);
    reg.register(test_handler.clone());
    reg.alias("[", test_handler);
    reg.register(Arc::new(write_cmd::WriteCommand));
    reg.register(Arc::new(append_cmd::AppendCommand));
    reg.register(Arc::new(addv::AddvCommand));
    reg.register(Arc::new(run_cmd::RunCommand));
    reg.register(Arc::new(sleep_cmd::SleepCommand));
    reg.register(Arc::new(job_cmds::JobsCommand));
    reg.register(Arc::new(job_cmds::KillCommand));
    reg.register(Arc::new(job_cmds::FgCommand));
    reg.register(Arc::new(help_cmd::HelpCommand));
    reg
}
