//! Opcode stream emitted by the compiler and executed by the VM.
//!
//! See `spec.md` §3.

/// A single bytecode instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Push a command-slot with this name onto the token stack.
    Load(String),
    /// Append an argument to the current pipeline stage and record it as
    /// the most recently produced scalar (for a following `SET`).
    Arg(String),
    /// Mark a pipeline stage boundary (each stage already starts its own
    /// slot at the preceding `LOAD`; this is just the delimiter).
    Pipe,
    /// Execute the accumulated pipeline; print non-empty output.
    Exec,
    /// Execute the accumulated pipeline; do not print.
    ExecQ,
    /// Store the most recently produced scalar (from `ARG`/`GET`) in
    /// `vars[name]`.
    Set(String),
    /// Look up `vars[name]` (default empty string), append it as an
    /// argument to the current stage, and record it as the most recently
    /// produced scalar.
    Get(String),
    /// Unconditional branch.
    Jmp(usize),
    /// Branch if `last_truth` is false.
    Jz(usize),
    /// Assign a literal list to `vars[name]`.
    SetList(String, Vec<String>),
    /// Assign `splitlines(last_output)` to `vars[name]`.
    SplitL(String),
    /// Push foreach iterator state: iterate `vars[listname]` binding `var`.
    ForeInit(String, String),
    /// Advance the innermost foreach iterator; on exhaustion pop it and jump.
    ForeNext(usize),
    /// Halt execution.
    End,
}

/// Validate that every branch target in `code` points inside `code`.
///
/// `spec.md` §3 invariant: "All `JMP`/`JZ`/`FORE_NEXT` targets point to a
/// valid instruction index produced by the same compilation pass." The
/// compiler only ever emits targets it computed from its own `code.len()`,
/// so this should never fail for compiler output; it exists as a
/// debug-time / test-time check.
pub fn targets_in_range(code: &[Op]) -> bool {
    let len = code.len();
    code.iter().all(|op| match op {
        Op::Jmp(t) | Op::Jz(t) | Op::ForeNext(t) => *t <= len,
        _ => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_targets_within_bounds() {
        let code = vec![Op::Jmp(1), Op::End];
        assert!(targets_in_range(&code));
    }

    #[test]
    fn rejects_targets_past_end() {
        let code = vec![Op::Jmp(5), Op::End];
        assert!(!targets_in_range(&code));
    }
}
