//! `addv` — the `for` loop's quiet increment step, grounded on
//! `pushvm.py`'s `cmd_addv` closure over the owning VM's `vars`.
//!
//! This is the other handler `spec.md` §9 calls out as needing the
//! "current VM" pointer: it reads and writes a variable on the VM that
//! is actually executing, via `VmControl::{get_var, set_var}`.

use async_trait::async_trait;

use super::types::{Command, CommandContext};

pub struct AddvCommand;

#[async_trait]
impl Command for AddvCommand {
    fn name(&self) -> &'static str {
        "addv"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        let [name, delta] = ctx.args.as_slice() else {
            return String::new();
        };
        let current: i64 = ctx.control.get_var(name).await.trim().parse().unwrap_or(0);
        let delta: i64 = delta.trim().parse().unwrap_or(0);
        ctx.control.set_var(name, (current + delta).to_string()).await;
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::ctx_with_control;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct FakeControl(Mutex<std::collections::HashMap<String, String>>);

    #[async_trait]
    impl super::super::types::VmControl for FakeControl {
        async fn sleep_for(&self, _ms: u64) {}
        async fn list_jobs(&self) -> Vec<super::super::types::JobSummary> {
            Vec::new()
        }
        async fn kill_job(&self, _id: u64) -> bool {
            false
        }
        async fn fg_job(&self, _id: u64) -> Option<super::super::types::FgOutcome> {
            None
        }
        async fn get_var(&self, name: &str) -> String {
            self.0.lock().unwrap().get(name).cloned().unwrap_or_default()
        }
        async fn set_var(&self, name: &str, value: String) {
            self.0.lock().unwrap().insert(name.to_string(), value);
        }
    }

    #[tokio::test]
    async fn increments_existing_variable() {
        let mut map = std::collections::HashMap::new();
        map.insert("i".to_string(), "5".to_string());
        let control: Arc<dyn super::super::types::VmControl> = Arc::new(FakeControl(Mutex::new(map)));
        AddvCommand.execute(ctx_with_control(&["i", "2"], control.clone())).await;
        assert_eq!(control.get_var("i").await, "7");
    }

    #[tokio::test]
    async fn missing_variable_defaults_to_zero() {
        let control: Arc<dyn super::super::types::VmControl> =
            Arc::new(FakeControl(Mutex::new(std::collections::HashMap::new())));
        AddvCommand.execute(ctx_with_control(&["i", "-3"], control.clone())).await;
        assert_eq!(control.get_var("i").await, "-3");
    }
}
