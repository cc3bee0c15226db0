//! `test` (and its `[ ... ]` alias) — the comparator the compiler's
//! `for` loop lowering and `if`/`while` guards rely on.
//!
//! Grounded on the teacher's `commands::test_cmd`, trimmed to the
//! operators `pushvm.py`'s `cmd_test` supports: `-f`/`-d`/`-z`/`-n`,
//! `=`/`!=`, and the six numeric comparators. Output is `"1"` for true,
//! `""` for false — `spec.md`'s truthiness treats both correctly.

use async_trait::async_trait;

use super::types::{Command, CommandContext};

pub struct TestCommand;

#[async_trait]
impl Command for TestCommand {
    fn name(&self) -> &'static str {
        "test"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        let mut args: Vec<&str> = ctx.args.iter().map(|s| s.as_str()).collect();
        if args.first() == Some(&"[") {
            if args.last() != Some(&"]") {
                return "test: missing ']'\n".to_string();
            }
            args = args[1..args.len() - 1].to_vec();
        }

        if evaluate(&args, ctx.fs.as_ref()).await {
            "1".to_string()
        } else {
            String::new()
        }
    }
}

async fn evaluate(args: &[&str], fs: &dyn crate::fs::FileSystem) -> bool {
    if args.is_empty() {
        return false;
    }
    if args.len() == 1 {
        return !args[0].is_empty();
    }
    if args[0] == "!" {
        return !Box::pin(evaluate(&args[1..], fs)).await;
    }

    if args.len() == 2 {
        let (op, a) = (args[0], args[1]);
        return match op {
            "-f" | "-d" => fs.exists(a).await,
            "-z" => a.is_empty(),
            "-n" => !a.is_empty(),
            _ => false,
        };
    }

    if args.len() >= 3 {
        let (a, op, b) = (args[0], args[1], args[2]);
        return match op {
            "=" => a == b,
            "!=" => a != b,
            "-eq" | "-ne" | "-lt" | "-le" | "-gt" | "-ge" => {
                let (Ok(ai), Ok(bi)) = (a.trim().parse::<i64>(), b.trim().parse::<i64>()) else {
                    return false;
                };
                match op {
                    "-eq" => ai == bi,
                    "-ne" => ai != bi,
                    "-lt" => ai < bi,
                    "-le" => ai <= bi,
                    "-gt" => ai > bi,
                    "-ge" => ai >= bi,
                    _ => unreachable!(),
                }
            }
            _ => false,
        };
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::{ctx, ctx_with_fs};
    use crate::fs::{FileSystem, InMemoryFs};
    use crate::pipedata::PipeData;
    use std::sync::Arc;

    #[tokio::test]
    async fn numeric_equality() {
        assert_eq!(TestCommand.execute(ctx(&["3", "-eq", "3"])).await, "1");
        assert_eq!(TestCommand.execute(ctx(&["3", "-eq", "4"])).await, "");
    }

    #[tokio::test]
    async fn numeric_comparators_for_loop_bounds() {
        assert_eq!(TestCommand.execute(ctx(&["1", "-le", "3"])).await, "1");
        assert_eq!(TestCommand.execute(ctx(&["4", "-le", "3"])).await, "");
        assert_eq!(TestCommand.execute(ctx(&["1", "-ge", "3"])).await, "");
    }

    #[tokio::test]
    async fn string_equality() {
        assert_eq!(TestCommand.execute(ctx(&["a", "=", "a"])).await, "1");
        assert_eq!(TestCommand.execute(ctx(&["a", "!=", "b"])).await, "1");
    }

    #[tokio::test]
    async fn bracket_syntax_strips_brackets() {
        assert_eq!(TestCommand.execute(ctx(&["[", "1", "-eq", "1", "]"])).await, "1");
    }

    #[tokio::test]
    async fn bracket_syntax_requires_closing_bracket() {
        let out = TestCommand.execute(ctx(&["[", "1", "-eq", "1"])).await;
        assert_eq!(out, "test: missing ']'\n");
    }

    #[tokio::test]
    async fn file_existence_check() {
        let fs: Arc<dyn FileSystem> = Arc::new(InMemoryFs::new());
        fs.write_file("/f", "x").await.unwrap();
        assert_eq!(TestCommand.execute(ctx_with_fs(&["-f", "/f"], PipeData::empty(), fs.clone())).await, "1");
        assert_eq!(TestCommand.execute(ctx_with_fs(&["-f", "/nope"], PipeData::empty(), fs)).await, "");
    }

    #[tokio::test]
    async fn empty_args_is_false() {
        assert_eq!(TestCommand.execute(ctx(&[])).await, "");
    }
}
