//! The virtual machine: opcode dispatch, pipeline draining, and the two
//! execution entry points (synchronous and cooperative) `spec.md` §4.3
//! describes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;

use crate::commands::{CommandContext, CommandRegistry, FgOutcome, JobSummary, ModuleLoader, VmControl};
use crate::error::RuntimeError;
use crate::fs::FileSystem;
use crate::job::{self, JobTableHandle};
use crate::opcode::Op;
use crate::pipedata::PipeData;
use crate::value::{text_is_truthy, Value};

/// One pipeline-stage slot accumulated between `PIPE`/`EXEC` boundaries.
struct Stage {
    name: String,
    args: Vec<String>,
}

/// Foreach iterator state, per nested loop.
struct ForeachFrame {
    var: String,
    items: std::vec::IntoIter<String>,
}

/// Outcome of advancing the VM by a single opcode, used by the
/// cooperative driver (`spec.md` §9's generator-form substitution).
pub enum Step {
    Continue,
    Sleeping,
    Done,
    Faulted(RuntimeError),
}

/// Construction parameters for a `Vm`.
pub struct VmOptions {
    pub registry: Arc<CommandRegistry>,
    pub fs: Arc<dyn FileSystem>,
    pub module_loader: Arc<dyn ModuleLoader>,
    pub jobs: JobTableHandle,
    pub spool_path: String,
    pub spool_threshold: usize,
}

/// A single PUSH virtual machine: one opcode stream, one variable
/// environment, one pipeline-in-progress.
pub struct Vm {
    code: Vec<Op>,
    pc: usize,
    token_stack: Vec<Stage>,
    /// The most recently produced scalar (from `ARG`/`GET`), ready to be
    /// consumed by the `SET` that always immediately follows it in an
    /// assignment's lowering. Not a stack: nothing in the opcode stream
    /// ever needs more than the single most recent value.
    last_value: String,
    vars: Arc<AsyncMutex<std::collections::HashMap<String, Value>>>,
    last_output: String,
    last_truth: bool,
    foreach_stack: Vec<ForeachFrame>,
    sleep_until: Arc<std::sync::Mutex<Option<Instant>>>,

    registry: Arc<CommandRegistry>,
    fs: Arc<dyn FileSystem>,
    module_loader: Arc<dyn ModuleLoader>,
    jobs: JobTableHandle,
    spool_path: String,
    spool_threshold: usize,

    control: Arc<dyn VmControl>,
}

impl Vm {
    pub fn new(opts: VmOptions) -> Self {
        let vars = Arc::new(AsyncMutex::new(std::collections::HashMap::new()));
        let sleep_until = Arc::new(std::sync::Mutex::new(None));
        let control: Arc<dyn VmControl> = Arc::new(VmControlHandle {
            vars: vars.clone(),
            sleep_until: sleep_until.clone(),
            jobs: opts.jobs.clone(),
        });
        Self {
            code: Vec::new(),
            pc: 0,
            token_stack: Vec::new(),
            last_value: String::new(),
            vars,
            last_output: String::new(),
            last_truth: false,
            foreach_stack: Vec::new(),
            sleep_until,
            registry: opts.registry,
            fs: opts.fs,
            module_loader: opts.module_loader,
            jobs: opts.jobs,
            spool_path: opts.spool_path,
            spool_threshold: opts.spool_threshold,
            control,
        }
    }

    /// Replace the loaded opcode stream and reset the program counter.
    /// Variables and last-output/truth survive, matching `spec.md` §4.3:
    /// a session's VM persists state across lines.
    pub fn load(&mut self, code: Vec<Op>) {
        self.code = code;
        self.pc = 0;
    }

    /// Snapshot the current variable bindings — used when spawning a
    /// background job so it starts from the parent's variables without
    /// sharing the parent's `vars` map (`spec.md` §4.5).
    pub async fn snapshot_vars(&self) -> std::collections::HashMap<String, Value> {
        self.vars.lock().await.clone()
    }

    pub async fn seed_vars(&mut self, vars: std::collections::HashMap<String, Value>) {
        *self.vars.lock().await = vars;
    }

    pub fn last_truth(&self) -> bool {
        self.last_truth
    }

    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    /// Run to completion, printing `EXEC` stage output as it happens and
    /// napping through any `sleep_until` deadline while polling the job
    /// table so background jobs keep making progress (`spec.md` §4.5).
    pub async fn run(&mut self) -> Result<(), RuntimeError> {
        loop {
            match self.step().await {
                Step::Continue => {}
                Step::Sleeping => {
                    job::poll_jobs(&self.jobs, 1).await;
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                Step::Done => return Ok(()),
                Step::Faulted(err) => return Err(err),
            }
        }
    }

    /// Advance by at most one opcode. Returns `Step::Sleeping` without
    /// advancing `pc` while a sleep deadline is still in the future,
    /// never blocking — the cooperative form background jobs use.
    pub async fn step(&mut self) -> Step {
        if let Some(deadline) = *self.sleep_until.lock().unwrap() {
            if Instant::now() < deadline {
                return Step::Sleeping;
            }
            *self.sleep_until.lock().unwrap() = None;
        }

        let Some(op) = self.code.get(self.pc).cloned() else {
            return Step::Done;
        };

        match self.dispatch(op).await {
            Ok(true) => Step::Done,
            Ok(false) => Step::Continue,
            Err(e) => Step::Faulted(e),
        }
    }

    /// Execute one opcode. Returns `Ok(true)` on `END`.
    async fn dispatch(&mut self, op: Op) -> Result<bool, RuntimeError> {
        match op {
            Op::End => return Ok(true),

            Op::Load(name) => {
                self.token_stack.push(Stage { name, args: Vec::new() });
                self.pc += 1;
            }

            Op::Arg(text) => {
                self.last_value = text.clone();
                if let Some(stage) = self.token_stack.last_mut() {
                    stage.args.push(text);
                }
                self.pc += 1;
            }

            Op::Get(name) => {
                let value = self.vars.lock().await.get(&name).map(Value::as_text).unwrap_or_default();
                self.last_value = value.clone();
                if let Some(stage) = self.token_stack.last_mut() {
                    stage.args.push(value);
                }
                self.pc += 1;
            }

            Op::Set(name) => {
                let value = std::mem::take(&mut self.last_value);
                self.vars.lock().await.insert(name, Value::Text(value));
                self.pc += 1;
            }

            Op::SetList(name, items) => {
                self.vars.lock().await.insert(name, Value::List(items));
                self.pc += 1;
            }

            Op::SplitL(name) => {
                let lines = crate::pipedata::splitlines(&self.last_output);
                self.vars.lock().await.insert(name, Value::List(lines));
                self.pc += 1;
            }

            Op::Pipe => {
                // Each stage already gets its own `Stage` from `LOAD`; `PIPE`
                // is just the compiler's explicit stage-boundary marker and
                // needs no action here (a trailing `PIPE` with no following
                // `LOAD` simply contributes no extra stage).
                self.pc += 1;
            }

            Op::Exec => {
                let output = self.exec_pipeline().await?;
                self.last_truth = text_is_truthy(&output);
                if !output.is_empty() {
                    print!("{}", output);
                    if !output.ends_with('\n') {
                        println!();
                    }
                }
                self.last_output = output;
                self.pc += 1;
            }

            Op::ExecQ => {
                let output = self.exec_pipeline().await?;
                self.last_truth = text_is_truthy(&output);
                self.last_output = output;
                self.pc += 1;
            }

            Op::Jmp(target) => {
                self.check_target(target)?;
                self.pc = target;
            }

            Op::Jz(target) => {
                self.check_target(target)?;
                if self.last_truth {
                    self.pc += 1;
                } else {
                    self.pc = target;
                }
            }

            Op::ForeInit(var, list_var) => {
                let items = match self.vars.lock().await.get(&list_var) {
                    Some(Value::List(items)) => items.clone(),
                    Some(Value::Text(s)) => vec![s.clone()],
                    None => Vec::new(),
                };
                self.foreach_stack.push(ForeachFrame { var, items: items.into_iter() });
                self.pc += 1;
            }

            Op::ForeNext(exit_target) => {
                self.check_target(exit_target)?;
                let done = {
                    let frame = self.foreach_stack.last_mut().expect("FORE_NEXT without FORE_INIT");
                    match frame.items.next() {
                        Some(item) => {
                            let var = frame.var.clone();
                            self.vars.lock().await.insert(var, Value::Text(item));
                            false
                        }
                        None => true,
                    }
                };
                if done {
                    self.foreach_stack.pop();
                    self.pc = exit_target;
                } else {
                    self.pc += 1;
                }
            }
        }
        Ok(false)
    }

    fn check_target(&self, target: usize) -> Result<(), RuntimeError> {
        if target > self.code.len() {
            return Err(RuntimeError::JumpOutOfRange { target, len: self.code.len() });
        }
        Ok(())
    }

    /// Drain every `Stage` accumulated since the last `EXEC`/`EXEC_Q`,
    /// feeding each stage's output as the next stage's input
    /// (`spec.md` §4.3–§4.4). A dangling trailing `PIPE` with no
    /// following `LOAD` contributes no extra stage.
    async fn exec_pipeline(&mut self) -> Result<String, RuntimeError> {
        let stages: Vec<Stage> = self.token_stack.drain(..).collect();
        let mut input = PipeData::empty();

        for stage in stages {
            let output = self.run_stage(&stage.name, stage.args, input).await?;
            input = PipeData::spool(output, self.fs.as_ref(), &self.spool_path, self.spool_threshold).await;
        }

        Ok(input.as_text(self.fs.as_ref()).await)
    }

    async fn run_stage(&self, name: &str, args: Vec<String>, input: PipeData) -> Result<String, RuntimeError> {
        if let Some(cmd) = self.registry.get(name) {
            let ctx = CommandContext { args, input, fs: self.fs.clone(), control: self.control.clone() };
            return Ok(cmd.execute(ctx).await);
        }

        if self.module_loader.is_loadable(name) {
            if let Some(run_cmd) = self.registry.get("run") {
                let mut run_args = vec![name.to_string()];
                run_args.extend(args);
                let ctx = CommandContext { args: run_args, input, fs: self.fs.clone(), control: self.control.clone() };
                return Ok(run_cmd.execute(ctx).await);
            }
        }

        Ok(format!("Error: command not found: {}\n", name))
    }
}

/// The typed substitute for `pushvm.py`'s mutable `_CURRENT_VM` global
/// (`spec.md` §9): command handlers reach the executing VM's sleep
/// deadline and variables through this handle instead of a global, and
/// reach the shared job table for `jobs`/`kill`/`fg`.
struct VmControlHandle {
    vars: Arc<AsyncMutex<std::collections::HashMap<String, Value>>>,
    sleep_until: Arc<std::sync::Mutex<Option<Instant>>>,
    jobs: JobTableHandle,
}

#[async_trait]
impl VmControl for VmControlHandle {
    async fn sleep_for(&self, ms: u64) {
        *self.sleep_until.lock().unwrap() = Some(Instant::now() + Duration::from_millis(ms));
    }

    async fn list_jobs(&self) -> Vec<JobSummary> {
        job::list_jobs(&self.jobs).await
    }

    async fn kill_job(&self, id: u64) -> bool {
        job::kill_job(&self.jobs, id).await
    }

    async fn fg_job(&self, id: u64) -> Option<FgOutcome> {
        job::fg_job(&self.jobs, id).await
    }

    async fn get_var(&self, name: &str) -> String {
        self.vars.lock().await.get(name).map(Value::as_text).unwrap_or_default()
    }

    async fn set_var(&self, name: &str, value: String) {
        self.vars.lock().await.insert(name.to_string(), Value::Text(value));
    }
}
