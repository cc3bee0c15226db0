//! Test-only helpers for constructing a `CommandContext` without a full
//! `Vm`/session. Not compiled outside `#[cfg(test)]`.
#![cfg(test)]

use std::sync::Arc;

use super::types::{CommandContext, NullVmControl, VmControl};
use crate::fs::InMemoryFs;
use crate::pipedata::PipeData;

pub fn ctx(args: &[&str]) -> CommandContext {
    ctx_with_input(args, PipeData::empty())
}

pub fn ctx_with_input(args: &[&str], input: PipeData) -> CommandContext {
    CommandContext {
        args: args.iter().map(|s| s.to_string()).collect(),
        input,
        fs: Arc::new(InMemoryFs::new()),
        control: Arc::new(NullVmControl),
    }
}

pub fn ctx_with_fs(args: &[&str], input: PipeData, fs: Arc<dyn crate::fs::FileSystem>) -> CommandContext {
    CommandContext {
        args: args.iter().map(|s| s.to_string()).collect(),
        input,
        fs,
        control: Arc::new(NullVmControl),
    }
}

pub fn ctx_with_control(args: &[&str], control: Arc<dyn VmControl>) -> CommandContext {
    CommandContext {
        args: args.iter().map(|s| s.to_string()).collect(),
        input: PipeData::empty(),
        fs: Arc::new(InMemoryFs::new()),
        control,
    }
}
