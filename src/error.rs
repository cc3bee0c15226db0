//! Error types for the PUSH shell core.
//!
//! Mirrors the teacher's convention of one `thiserror`-derived enum per
//! concern (`fs::types::FsError`, `parser::types::ParseException`).

use thiserror::Error;

/// Errors raised while compiling a line into an opcode stream.
///
/// Compilation is fatal at line granularity: the REPL reports the error
/// and moves on to the next line without touching VM state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("expected '{expected}' but got '{got}'")]
    Expected { expected: String, got: String },

    #[error("expected '{expected}' but found end of input")]
    UnexpectedEof { expected: String },

    #[error("break used outside of a loop")]
    BreakOutsideLoop,

    #[error("continue used outside of a loop")]
    ContinueOutsideLoop,

    #[error("for: missing variable name")]
    ForMissingVar,

    #[error("for: needs start and end")]
    ForMissingBounds,

    #[error("foreach: missing variable name")]
    ForeachMissingVar,

    #[error("foreach: missing 'do'")]
    ForeachMissingDo,

    #[error("redirection missing filename")]
    RedirectionMissingFilename,
}

/// Errors raised while executing an already-compiled opcode stream.
///
/// Foreground lines print these as `Error: ...`; background jobs store
/// them in `Job::error` and surface them at reap time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("unknown opcode at pc {0}")]
    UnknownOpcode(usize),

    #[error("jump target {target} out of range (code length {len})")]
    JumpOutOfRange { target: usize, len: usize },

    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),
}

/// Errors raised by the virtual filesystem backing `write`/`append`/`cat`
/// and the pipe-data spool. Trimmed to the subset PUSH's reserved
/// commands actually touch, in the spirit of the teacher's
/// `fs::types::FsError` (which models the full POSIX errno surface).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("ENOENT: no such file or directory, {operation} '{path}'")]
    NotFound { path: String, operation: String },

    #[error("EISDIR: illegal operation on a directory, {operation} '{path}'")]
    IsDirectory { path: String, operation: String },

    #[error("{message}")]
    Other { message: String },
}
