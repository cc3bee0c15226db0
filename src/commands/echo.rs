//! `echo` — reserved: the compiler uses it both directly and as the
//! trailer that re-derives `last_truth` after every assignment.

use async_trait::async_trait;

use super::types::{Command, CommandContext};

pub struct EchoCommand;

#[async_trait]
impl Command for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        ctx.args.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::ctx;

    #[tokio::test]
    async fn joins_args_with_spaces() {
        let out = EchoCommand.execute(ctx(&["a", "b", "c"])).await;
        assert_eq!(out, "a b c");
    }

    #[tokio::test]
    async fn no_args_is_empty() {
        let out = EchoCommand.execute(ctx(&[])).await;
        assert_eq!(out, "");
    }
}
