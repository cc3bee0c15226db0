//! `sleep NUMBER[SUFFIX]` — delays the executing VM without blocking
//! the scheduler, grounded on the teacher's `commands::sleep_cmd` for
//! duration parsing and on `pushvm.py`'s `cmd_sleep`/`_CURRENT_VM` for
//! the "affect whichever VM is running" semantics (here `VmControl`).

use async_trait::async_trait;
use regex_lite::Regex;

use super::types::{Command, CommandContext};

pub struct SleepCommand;

fn parse_duration_ms(arg: &str) -> Option<f64> {
    let re = Regex::new(r"^(\d+\.?\d*)(s|m|h|d)?$").unwrap();
    let caps = re.captures(arg)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let suffix = caps.get(2).map(|m| m.as_str()).unwrap_or("s");
    Some(match suffix {
        "s" => value * 1000.0,
        "m" => value * 60.0 * 1000.0,
        "h" => value * 3600.0 * 1000.0,
        "d" => value * 86400.0 * 1000.0,
        _ => return None,
    })
}

#[async_trait]
impl Command for SleepCommand {
    fn name(&self) -> &'static str {
        "sleep"
    }

    async fn execute(&self, ctx: CommandContext) -> String {
        if ctx.args.is_empty() {
            return "sleep: missing operand\n".to_string();
        }
        let mut total_ms = 0.0;
        for arg in &ctx.args {
            match parse_duration_ms(arg) {
                Some(ms) => total_ms += ms,
                None => return format!("sleep: invalid time interval '{}'\n", arg),
            }
        }
        if total_ms > 0.0 {
            ctx.control.sleep_for(total_ms as u64).await;
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::ctx;

    #[tokio::test]
    async fn zero_is_a_noop() {
        let out = SleepCommand.execute(ctx(&["0"])).await;
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn missing_operand_is_an_error() {
        let out = SleepCommand.execute(ctx(&[])).await;
        assert_eq!(out, "sleep: missing operand\n");
    }

    #[tokio::test]
    async fn invalid_interval_is_an_error() {
        let out = SleepCommand.execute(ctx(&["banana"])).await;
        assert!(out.starts_with("sleep: invalid time interval"));
    }

    #[test]
    fn parses_suffixed_durations() {
        assert_eq!(parse_duration_ms("2"), Some(2000.0));
        assert_eq!(parse_duration_ms("1.5s"), Some(1500.0));
        assert_eq!(parse_duration_ms("2m"), Some(120_000.0));
    }
}
