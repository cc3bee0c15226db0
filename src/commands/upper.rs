//! `upper` — uppercases its input, grounded on `pushvm.py`'s `cmd_upper`.

use async_trait::async_trait;

use super::types::{Command, CommandContext};

pub struct UpperCommand;

#[async_trait]
impl Command for UpperCommand {
    fn name(&self) -> &'static str {
        "upper"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        ctx.input.as_text(ctx.fs.as_ref()).await.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::ctx_with_input;
    use crate::pipedata::PipeData;

    #[tokio::test]
    async fn uppercases_input() {
        let out = UpperCommand.execute(ctx_with_input(&[], PipeData::Inline("hello".into()))).await;
        assert_eq!(out, "HELLO");
    }
}
