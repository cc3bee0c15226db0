//! `help` — static usage text, grounded on `pushvm.py`'s `cmd_help`.

use async_trait::async_trait;

use super::types::{Command, CommandContext};

pub struct HelpCommand;

const HELP: &str = "\
extras: echo, upper, cat, wc, test (also [ ])
redirection: write (>), append (>>)
flow: if/then/else/fi, while/do/done, for/foreach/do/done, break/continue, &&/||
vars: x=val  $x
jobs: trailing &, jobs, kill <id>, fg <id>
";

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn execute(&self, _ctx: CommandContext) -> String {
        HELP.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::ctx;

    #[tokio::test]
    async fn returns_static_help_text() {
        assert_eq!(HelpCommand.execute(ctx(&[])).await, HELP);
    }
}
