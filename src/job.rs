//! Job table and cooperative scheduler.
//!
//! See `spec.md` §4.5. A `Job` is a background `Vm` instance; the table
//! advances each live job by at most `n` opcodes per `poll_jobs` call
//! and reaps jobs that finished or faulted, printing a completion line.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::commands::{FgOutcome, JobSummary};
use crate::vm::{Step, Vm};

struct JobEntry {
    name: String,
    vm: Vm,
    error: Option<String>,
}

/// The job table, shared between the foreground session and every
/// background `Vm`'s `VmControl` handle via `Arc<Mutex<_>>`.
#[derive(Default)]
pub struct JobTable {
    jobs: HashMap<u64, JobEntry>,
    next_id: u64,
}

pub type JobTableHandle = Arc<Mutex<JobTable>>;

impl JobTable {
    pub fn new() -> Self {
        Self { jobs: HashMap::new(), next_id: 1 }
    }

    pub fn handle() -> JobTableHandle {
        Arc::new(Mutex::new(Self::new()))
    }
}

/// Spawn `vm` as a new background job named `name`, returning its id.
pub async fn spawn(table: &JobTableHandle, vm: Vm, name: String) -> u64 {
    let mut t = table.lock().await;
    let id = t.next_id;
    t.next_id += 1;
    t.jobs.insert(id, JobEntry { name, vm, error: None });
    id
}

/// Advance every live job by at most `steps` opcodes, reaping and
/// reporting any that finished or faulted. Each job is briefly removed
/// from the table while it is being stepped so that a `jobs`/`kill`/`fg`
/// invocation from *within* another job's opcode stream can still reach
/// the (shared) table without deadlocking on its own lock.
pub async fn poll_jobs(table: &JobTableHandle, steps: usize) {
    let ids: Vec<u64> = { table.lock().await.jobs.keys().copied().collect() };

    for id in ids {
        let mut entry = match table.lock().await.jobs.remove(&id) {
            Some(e) => e,
            None => continue, // killed or reaped by a nested call already
        };

        let mut done = false;
        for _ in 0..steps {
            match entry.vm.step().await {
                Step::Done => {
                    done = true;
                    break;
                }
                Step::Faulted(err) => {
                    entry.error = Some(err.to_string());
                    done = true;
                    break;
                }
                Step::Sleeping | Step::Continue => {}
            }
        }

        if done {
            tracing::info!(job_id = id, name = %entry.name, error = ?entry.error, "job reaped");
            match &entry.error {
                Some(err) => println!("[{}] {} (error: {})", id, entry.name, err),
                None => println!("[{}] {} (done)", id, entry.name),
            }
        } else {
            table.lock().await.jobs.insert(id, entry);
        }
    }
}

pub async fn list_jobs(table: &JobTableHandle) -> Vec<JobSummary> {
    table
        .lock()
        .await
        .jobs
        .iter()
        .map(|(&id, e)| JobSummary { id, name: e.name.clone(), running: true })
        .collect()
}

/// Mark a job done so the next `poll_jobs` pass reaps it without
/// stepping it further. `spec.md` §9 open question: no cleanup hook
/// runs for the underlying command; handlers are assumed side-effect
/// safe under abrupt termination.
pub async fn kill_job(table: &JobTableHandle, id: u64) -> bool {
    table.lock().await.jobs.remove(&id).is_some()
}

/// Advance a single job synchronously to completion and report its
/// outcome, per `spec.md` §4.5's `fg`.
pub async fn fg_job(table: &JobTableHandle, id: u64) -> Option<FgOutcome> {
    let mut entry = table.lock().await.jobs.remove(&id)?;
    loop {
        match entry.vm.step().await {
            Step::Done => break,
            Step::Faulted(err) => {
                entry.error = Some(err.to_string());
                break;
            }
            Step::Sleeping | Step::Continue => {}
        }
    }
    Some(FgOutcome { error: entry.error })
}
