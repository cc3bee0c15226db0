//! `run MODULE [ARGS...]` — the target of the VM's module-loader
//! auto-dispatch (`spec.md` §6). The default implementation here has no
//! modules to load (mirrors `pushvm.py`'s `cmd_run` failing its
//! `__import__`); a host embedding this crate with a real
//! `ModuleLoader` is expected to supply its own `run` command too.

use async_trait::async_trait;

use super::types::{Command, CommandContext};

pub struct RunCommand;

#[async_trait]
impl Command for RunCommand {
    fn name(&self) -> &'static str {
        "run"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        let Some(module) = ctx.args.first() else {
            return "run: usage run <module> [args...]\n".to_string();
        };
        format!("run: couldn't import {}\n", module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::ctx;

    #[tokio::test]
    async fn reports_unloadable_module() {
        let out = RunCommand.execute(ctx(&["frobnicate"])).await;
        assert_eq!(out, "run: couldn't import frobnicate\n");
    }

    #[tokio::test]
    async fn missing_module_name_is_usage_error() {
        let out = RunCommand.execute(ctx(&[])).await;
        assert_eq!(out, "run: usage run <module> [args...]\n");
    }
}
