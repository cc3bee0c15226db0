//! `append` — the reserved command redirection (`>>`) lowers to.

use async_trait::async_trait;

use super::types::{Command, CommandContext};

pub struct AppendCommand;

#[async_trait]
impl Command for AppendCommand {
    fn name(&self) -> &'static str {
        "append"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        let Some(path) = ctx.args.first() else {
            return "append: missing filename\n".to_string();
        };
        let text = ctx.input.as_text(ctx.fs.as_ref()).await;
        match ctx.fs.append_file(path, &text).await {
            Ok(()) => String::new(),
            Err(_) => "Couldn't append file\n".to_string(),
        }
    }
}
