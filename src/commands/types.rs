//! Command trait, execution context, and the VM-control handle that lets
//! `sleep`/`jobs`/`kill`/`fg` affect the VM that is actually executing.
//!
//! Grounded on the teacher's `commands::types::{Command, CommandContext,
//! CommandResult}`, collapsed to the single-string output model
//! `spec.md` §6 describes (no POSIX exit codes — truthiness drives
//! control flow instead).

use std::sync::Arc;

use async_trait::async_trait;

use crate::fs::FileSystem;
use crate::pipedata::PipeData;

/// One job's listing line, as reported by `jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub id: u64,
    pub name: String,
    pub running: bool,
}

/// The result of running a background job to completion via `fg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FgOutcome {
    pub error: Option<String>,
}

/// `spec.md` §5's "current VM" pointer, rendered as an explicit handle
/// passed to handlers instead of a mutable global (per §9's design
/// note). Implemented by the owning `Vm`/job table so `sleep` affects
/// whichever VM is actually running, and `jobs`/`kill`/`fg` reach the
/// shared job table.
#[async_trait]
pub trait VmControl: Send + Sync {
    /// Arrange for the executing VM to sleep until `now + ms`.
    async fn sleep_for(&self, ms: u64);
    async fn list_jobs(&self) -> Vec<JobSummary>;
    /// `true` if a job with this id existed and was marked done.
    async fn kill_job(&self, id: u64) -> bool;
    /// `None` if no such job; otherwise the job's outcome once it ran
    /// to completion.
    async fn fg_job(&self, id: u64) -> Option<FgOutcome>;
    /// `addv`'s read side: the current text value of a variable
    /// (default empty string, mirroring `GET`).
    async fn get_var(&self, name: &str) -> String;
    /// `addv`'s write side: overwrite a variable's text value.
    async fn set_var(&self, name: &str, value: String);
}

/// A VM control handle that does nothing — used when a `Vm` is
/// constructed standalone (e.g. in unit tests) without a job table.
pub struct NullVmControl;

#[async_trait]
impl VmControl for NullVmControl {
    async fn sleep_for(&self, _ms: u64) {}
    async fn list_jobs(&self) -> Vec<JobSummary> {
        Vec::new()
    }
    async fn kill_job(&self, _id: u64) -> bool {
        false
    }
    async fn fg_job(&self, _id: u64) -> Option<FgOutcome> {
        None
    }
    async fn get_var(&self, _name: &str) -> String {
        String::new()
    }
    async fn set_var(&self, _name: &str, _value: String) {}
}

/// Reports whether a named module is loadable, so the VM can dispatch
/// unknown commands to the registered `run` command as `[name, ...args]`
/// (`spec.md` §6's "module loader" collaborator).
pub trait ModuleLoader: Send + Sync {
    fn is_loadable(&self, name: &str) -> bool;
}

/// The default loader: nothing is loadable, matching `pushvm.py`'s
/// `/lib/<name>.py` check degenerating to "not found" with no such file.
pub struct NoModules;

impl ModuleLoader for NoModules {
    fn is_loadable(&self, _name: &str) -> bool {
        false
    }
}

/// Everything a command handler needs: its arguments, the previous
/// stage's output, the filesystem, and (for the handful of commands
/// that need it) the VM control handle.
pub struct CommandContext {
    pub args: Vec<String>,
    pub input: PipeData,
    pub fs: Arc<dyn FileSystem>,
    pub control: Arc<dyn VmControl>,
}

/// A single command implementation.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, ctx: CommandContext) -> String;
}
