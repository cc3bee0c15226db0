//! `write` — the reserved command redirection (`>`) lowers to.

use async_trait::async_trait;

use super::types::{Command, CommandContext};

pub struct WriteCommand;

#[async_trait]
impl Command for WriteCommand {
    fn name(&self) -> &'static str {
        "write"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        let Some(path) = ctx.args.first() else {
            return "write: missing filename\n".to_string();
        };
        let text = ctx.input.as_text(ctx.fs.as_ref()).await;
        match ctx.fs.write_file(path, &text).await {
            Ok(()) => String::new(),
            Err(_) => "Couldn't write file\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::ctx_with_fs;
    use crate::fs::{FileSystem, InMemoryFs};
    use crate::pipedata::PipeData;
    use std::sync::Arc;

    #[tokio::test]
    async fn writes_input_to_named_file() {
        let fs: Arc<dyn FileSystem> = Arc::new(InMemoryFs::new());
        let out = WriteCommand
            .execute(ctx_with_fs(&["F"], PipeData::Inline("X".into()), fs.clone()))
            .await;
        assert_eq!(out, "");
        assert_eq!(fs.read_file("F").await.unwrap(), "X");
    }

    #[tokio::test]
    async fn missing_filename_is_an_error() {
        let out = WriteCommand.execute(crate::commands::test_helpers::ctx(&[])).await;
        assert_eq!(out, "write: missing filename\n");
    }
}
