//! `cat` — with a filename argument, reads that file; otherwise echoes
//! stdin. Grounded on `pushvm.py`'s `cmd_cat`.

use async_trait::async_trait;

use super::types::{Command, CommandContext};

pub struct CatCommand;

#[async_trait]
impl Command for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        if let Some(path) = ctx.args.first() {
            return match ctx.fs.read_file(path).await {
                Ok(s) => s,
                Err(_) => "Couldn't open file\n".to_string(),
            };
        }
        ctx.input.as_text(ctx.fs.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::{ctx, ctx_with_fs, ctx_with_input};
    use crate::fs::{FileSystem, InMemoryFs};
    use crate::pipedata::PipeData;
    use std::sync::Arc;

    #[tokio::test]
    async fn reads_named_file() {
        let fs: Arc<dyn FileSystem> = Arc::new(InMemoryFs::new());
        fs.write_file("/f", "contents").await.unwrap();
        let out = CatCommand.execute(ctx_with_fs(&["/f"], PipeData::empty(), fs)).await;
        assert_eq!(out, "contents");
    }

    #[tokio::test]
    async fn missing_file_reports_error() {
        let out = CatCommand.execute(ctx(&["/nope"])).await;
        assert_eq!(out, "Couldn't open file\n");
    }

    #[tokio::test]
    async fn no_args_echoes_stdin() {
        let out = CatCommand.execute(ctx_with_input(&[], PipeData::Inline("piped".into()))).await;
        assert_eq!(out, "piped");
    }
}
