//! `jobs`, `kill`, `fg` — job control commands, grounded on
//! `pushvm.py`'s `cmd_jobs`/`cmd_kill`/`cmd_fg` closures over `vm.jobs`,
//! rendered here as `VmControl` calls instead of a captured global.

use async_trait::async_trait;

use super::types::{Command, CommandContext};

pub struct JobsCommand;

#[async_trait]
impl Command for JobsCommand {
    fn name(&self) -> &'static str {
        "jobs"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        let jobs = ctx.control.list_jobs().await;
        if jobs.is_empty() {
            return "(no jobs)\n".to_string();
        }
        let mut lines: Vec<String> = jobs
            .iter()
            .map(|j| format!("[{}] {} - {}", j.id, if j.running { "running" } else { "done" }, j.name))
            .collect();
        lines.push(String::new());
        lines.join("\n")
    }
}

pub struct KillCommand;

#[async_trait]
impl Command for KillCommand {
    fn name(&self) -> &'static str {
        "kill"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        let Some(arg) = ctx.args.first() else {
            return "kill: usage kill <jobid>\n".to_string();
        };
        let Ok(id) = arg.parse::<u64>() else {
            return "kill: bad jobid\n".to_string();
        };
        if ctx.control.kill_job(id).await {
            String::new()
        } else {
            "kill: no such job\n".to_string()
        }
    }
}

pub struct FgCommand;

#[async_trait]
impl Command for FgCommand {
    fn name(&self) -> &'static str {
        "fg"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        let Some(arg) = ctx.args.first() else {
            return "fg: usage fg <jobid>\n".to_string();
        };
        let Ok(id) = arg.parse::<u64>() else {
            return "fg: bad jobid\n".to_string();
        };
        match ctx.control.fg_job(id).await {
            None => "fg: no such job\n".to_string(),
            Some(outcome) => match outcome.error {
                Some(err) => format!("fg: job error: {}\n", err),
                None => String::new(),
            },
        }
    }
}
