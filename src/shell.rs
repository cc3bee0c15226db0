//! Session wiring: one foreground `Vm`, a shared job table, and the
//! options that configure both. Grounded on the teacher's
//! `bash::{Bash, BashOptions}` — same "options struct plus a long-lived
//! session object" shape, generalized from a bash interpreter session to
//! a PUSH VM session.

use std::sync::Arc;

use crate::commands::{default_registry, CommandRegistry, ModuleLoader, NoModules};
use crate::compiler::compile_line;
use crate::error::{CompileError, RuntimeError};
use crate::fs::{FileSystem, InMemoryFs};
use crate::job::{self, JobTable, JobTableHandle};
use crate::vm::{Vm, VmOptions};

/// Options for creating a `Shell`. Mirrors the teacher's `BashOptions`:
/// everything has a sensible default, callers override only what they
/// need (a host filesystem, a module loader, a non-default spool path).
pub struct ShellOptions {
    pub fs: Option<Arc<dyn FileSystem>>,
    pub module_loader: Option<Arc<dyn ModuleLoader>>,
    pub registry: Option<CommandRegistry>,
    pub spool_path: String,
    pub spool_threshold: usize,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            fs: None,
            module_loader: None,
            registry: None,
            spool_path: "/tmp/.push_spool".to_string(),
            spool_threshold: 64 * 1024,
        }
    }
}

/// A running PUSH session: the foreground `Vm` plus the background job
/// table it shares with every job it spawns.
pub struct Shell {
    vm: Vm,
    jobs: JobTableHandle,
    registry: Arc<CommandRegistry>,
    fs: Arc<dyn FileSystem>,
    module_loader: Arc<dyn ModuleLoader>,
    spool_path: String,
    spool_threshold: usize,
}

/// What a single executed line produced: its compile error (if any),
/// its runtime error (if any), and whether it was backgrounded.
pub enum LineOutcome {
    Compiled,
    CompileFailed(CompileError),
    RuntimeFailed(RuntimeError),
    Backgrounded { job_id: u64 },
}

impl Shell {
    pub fn new(options: ShellOptions) -> Self {
        let fs: Arc<dyn FileSystem> = options.fs.unwrap_or_else(|| Arc::new(InMemoryFs::new()));
        let module_loader: Arc<dyn ModuleLoader> = options.module_loader.unwrap_or_else(|| Arc::new(NoModules));
        let registry = Arc::new(options.registry.unwrap_or_else(default_registry));
        let jobs = JobTable::handle();

        let vm = Vm::new(VmOptions {
            registry: registry.clone(),
            fs: fs.clone(),
            module_loader: module_loader.clone(),
            jobs: jobs.clone(),
            spool_path: options.spool_path.clone(),
            spool_threshold: options.spool_threshold,
        });

        Self {
            vm,
            jobs,
            registry,
            fs,
            module_loader,
            spool_path: options.spool_path,
            spool_threshold: options.spool_threshold,
        }
    }

    /// Compile and run one line against the foreground `Vm`, or spawn it
    /// as a background job when it ends in `&` (`spec.md` §4.1/§4.5).
    pub async fn run_line(&mut self, line: &str) -> LineOutcome {
        let (code, background) = match compile_line(line) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(%line, error = %err, "line failed to compile");
                return LineOutcome::CompileFailed(err);
            }
        };

        if background {
            let mut job_vm = Vm::new(VmOptions {
                registry: self.registry.clone(),
                fs: self.fs.clone(),
                module_loader: self.module_loader.clone(),
                jobs: self.jobs.clone(),
                spool_path: self.spool_path.clone(),
                spool_threshold: self.spool_threshold,
            });
            job_vm.seed_vars(self.vm.snapshot_vars().await).await;
            job_vm.load(code);
            let id = job::spawn(&self.jobs, job_vm, line.trim().to_string()).await;
            tracing::info!(job_id = id, %line, "job spawned");
            return LineOutcome::Backgrounded { job_id: id };
        }

        self.vm.load(code);
        match self.vm.run().await {
            Ok(()) => LineOutcome::Compiled,
            Err(err) => {
                tracing::warn!(%line, error = %err, "line faulted at runtime");
                LineOutcome::RuntimeFailed(err)
            }
        }
    }

    /// Advance every background job by `steps` opcodes, reaping any that
    /// finished. Callers (the REPL, or a test) invoke this between lines
    /// and while idle at a prompt.
    pub async fn poll_jobs(&self, steps: usize) {
        job::poll_jobs(&self.jobs, steps).await;
    }

    /// The foreground `Vm`'s most recently produced output.
    pub fn last_output(&self) -> &str {
        self.vm.last_output()
    }

    /// The foreground `Vm`'s truthiness after its most recent line.
    pub fn last_truth(&self) -> bool {
        self.vm.last_truth()
    }
}
