//! `wc` — line count of a named file or of stdin, grounded on
//! `pushvm.py`'s `cmd_wc`.

use async_trait::async_trait;

use super::types::{Command, CommandContext};
use crate::pipedata::splitlines;

pub struct WcCommand;

#[async_trait]
impl Command for WcCommand {
    fn name(&self) -> &'static str {
        "wc"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        let text = if let Some(path) = ctx.args.first() {
            match ctx.fs.read_file(path).await {
                Ok(s) => s,
                Err(_) => return "Couldn't open file\n".to_string(),
            }
        } else {
            ctx.input.as_text(ctx.fs.as_ref()).await
        };
        format!("{}\n", splitlines(&text).len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::ctx_with_input;
    use crate::pipedata::PipeData;

    #[tokio::test]
    async fn counts_lines_of_input() {
        let out = WcCommand.execute(ctx_with_input(&[], PipeData::Inline("a\nb\nc".into()))).await;
        assert_eq!(out, "3\n");
    }

    #[tokio::test]
    async fn empty_input_is_zero_lines() {
        let out = WcCommand.execute(ctx_with_input(&[], PipeData::empty())).await;
        assert_eq!(out, "0\n");
    }
}
