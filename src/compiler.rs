//! Single-pass recursive-descent compiler: tokens → opcode stream.
//!
//! See `spec.md` §4.2.

use crate::error::CompileError;
use crate::lexer::{lex, Token};
use crate::opcode::Op;

/// Per-loop compile-time bookkeeping: the loop header PC (`continue`
/// targets it) and the forward-patch positions of any `break`s seen so
/// far inside it (patched to the instruction after the loop on exit).
struct LoopCtx {
    start: usize,
    break_jumps: Vec<usize>,
}

/// Compiles one line's token stream into a flat `Vec<Op>`.
pub struct Compiler {
    toks: Vec<Token>,
    pos: usize,
    code: Vec<Op>,
    loop_stack: Vec<LoopCtx>,
    tmp_counter: u32,
}

/// Compile a full line (including lexing) into an opcode stream and a
/// `background` flag, mirroring `spec.md`'s `compile_line`.
pub fn compile_line(line: &str) -> Result<(Vec<Op>, bool), CompileError> {
    let lexed = lex(line.trim());
    let mut compiler = Compiler::new(lexed.tokens);
    let code = compiler.compile()?;
    Ok((code, lexed.background))
}

impl Compiler {
    pub fn new(toks: Vec<Token>) -> Self {
        Self { toks, pos: 0, code: Vec::new(), loop_stack: Vec::new(), tmp_counter: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.toks.get(self.pos)
    }

    fn peek_word(&self) -> Option<&str> {
        match self.peek() {
            Some(Token::Word(w)) => Some(w.as_str()),
            _ => None,
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.toks.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect_word(&mut self, expected: &str) -> Result<(), CompileError> {
        match self.advance() {
            Some(Token::Word(ref w)) if w == expected => Ok(()),
            Some(other) => Err(CompileError::Expected {
                expected: expected.to_string(),
                got: other.as_text(),
            }),
            None => Err(CompileError::UnexpectedEof { expected: expected.to_string() }),
        }
    }

    fn emit(&mut self, op: Op) -> usize {
        self.code.push(op);
        self.code.len() - 1
    }

    fn patch(&mut self, idx: usize, target: usize) {
        match &mut self.code[idx] {
            Op::Jmp(t) | Op::Jz(t) | Op::ForeNext(t) => *t = target,
            other => panic!("patch called on non-jump opcode {other:?}"),
        }
    }

    fn new_tmp(&mut self) -> String {
        self.tmp_counter += 1;
        format!("__tmp{}", self.tmp_counter)
    }

    /// Top-level entry: `compile_stmts(∅)` followed by `END`.
    pub fn compile(&mut self) -> Result<Vec<Op>, CompileError> {
        self.compile_stmts(&[])?;
        self.emit(Op::End);
        Ok(std::mem::take(&mut self.code))
    }

    fn compile_stmts(&mut self, terminators: &[&str]) -> Result<(), CompileError> {
        loop {
            // Skip stray semicolons before looking for a statement word, so
            // leading/consecutive `;`s (and `then ; echo ...`) don't get
            // mistaken for the end of the statement list. Mirrors
            // `pushvm.py`'s `compile_stmts`, which does the same skip.
            if matches!(self.peek(), Some(Token::Semi)) {
                self.advance();
                continue;
            }

            let Some(word) = self.peek_word() else { return Ok(()) };
            if terminators.contains(&word) {
                return Ok(());
            }

            match word {
                "if" => self.compile_if()?,
                "while" => self.compile_while()?,
                "for" => self.compile_for()?,
                "foreach" => self.compile_foreach()?,
                "break" => {
                    self.compile_break()?;
                    self.emit(Op::ExecQ);
                }
                "continue" => {
                    self.compile_continue()?;
                    self.emit(Op::ExecQ);
                }
                _ => self.compile_chain(terminators)?,
            }

            if matches!(self.peek(), Some(Token::Semi)) {
                self.advance();
            }
        }
    }

    // ---- if / while / for / foreach ----

    fn compile_if(&mut self) -> Result<(), CompileError> {
        self.expect_word("if")?;
        self.compile_pipeline(&["then"])?;
        self.emit(Op::ExecQ);
        let jz_idx = self.emit(Op::Jz(0));

        self.expect_word("then")?;
        self.compile_stmts(&["else", "fi"])?;

        if self.peek_word() == Some("else") {
            let jmp_end = self.emit(Op::Jmp(0));
            self.expect_word("else")?;
            let else_target = self.code.len();
            self.patch(jz_idx, else_target);
            self.compile_stmts(&["fi"])?;
            self.expect_word("fi")?;
            let end_target = self.code.len();
            self.patch(jmp_end, end_target);
        } else {
            self.expect_word("fi")?;
            let end_target = self.code.len();
            self.patch(jz_idx, end_target);
        }
        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), CompileError> {
        self.expect_word("while")?;
        let loop_start = self.code.len();

        self.compile_pipeline(&["do"])?;
        self.emit(Op::ExecQ);
        let jz_exit = self.emit(Op::Jz(0));

        self.expect_word("do")?;
        self.loop_stack.push(LoopCtx { start: loop_start, break_jumps: Vec::new() });

        self.compile_stmts(&["done"])?;
        self.expect_word("done")?;

        self.emit(Op::Jmp(loop_start));

        let exit_target = self.code.len();
        self.patch(jz_exit, exit_target);
        let ctx = self.loop_stack.pop().unwrap();
        for jidx in ctx.break_jumps {
            self.patch(jidx, exit_target);
        }
        Ok(())
    }

    fn compile_for(&mut self) -> Result<(), CompileError> {
        // for var start end [step] do ... done
        self.expect_word("for")?;
        let var = self.advance_word().ok_or(CompileError::ForMissingVar)?;

        let start = self.advance_word().ok_or(CompileError::ForMissingBounds)?;
        let end = self.advance_word().ok_or(CompileError::ForMissingBounds)?;

        let step = if self.peek_word() != Some("do") {
            self.advance_word()
        } else {
            None
        };
        if self.peek_word() != Some("do") {
            return Err(CompileError::Expected {
                expected: "do".to_string(),
                got: self.peek().map(Token::as_text).unwrap_or_default(),
            });
        }

        self.emit(Op::Arg(start));
        self.emit(Op::Set(var.clone()));

        let loop_start = self.code.len();

        // The comparator is `-ge` only when `step` parses as a negative
        // integer; a variable-valued or missing step always maps to
        // `-le` (spec.md §9 open question: left as-is, not "fixed").
        let cmpop = match &step {
            Some(s) if s.trim().parse::<i64>().map(|n| n < 0).unwrap_or(false) => "-ge",
            _ => "-le",
        };

        self.emit(Op::Load("test".to_string()));
        self.emit(Op::Get(var.clone()));
        self.emit(Op::Arg(cmpop.to_string()));
        self.emit(Op::Arg(end));
        self.emit(Op::ExecQ);
        let jz_exit = self.emit(Op::Jz(0));

        self.expect_word("do")?;
        self.loop_stack.push(LoopCtx { start: loop_start, break_jumps: Vec::new() });

        self.compile_stmts(&["done"])?;
        self.expect_word("done")?;

        let step = step.unwrap_or_else(|| "1".to_string());
        self.emit(Op::Load("addv".to_string()));
        self.emit(Op::Arg(var));
        self.emit(Op::Arg(step));
        self.emit(Op::ExecQ);

        self.emit(Op::Jmp(loop_start));

        let exit_target = self.code.len();
        self.patch(jz_exit, exit_target);
        let ctx = self.loop_stack.pop().unwrap();
        for jidx in ctx.break_jumps {
            self.patch(jidx, exit_target);
        }
        Ok(())
    }

    fn compile_foreach(&mut self) -> Result<(), CompileError> {
        // foreach var in a b c do ... done
        // foreach var in <pipeline> do ... done  (splits output by lines)
        self.expect_word("foreach")?;
        let var = self.advance_word().ok_or(CompileError::ForeachMissingVar)?;
        self.expect_word("in")?;

        let list_var = self.new_tmp();

        let mut collected: Vec<Token> = Vec::new();
        let mut has_pipe = false;
        loop {
            match self.peek() {
                None => return Err(CompileError::ForeachMissingDo),
                Some(Token::Word(w)) if w == "do" => break,
                Some(tok) => {
                    if matches!(tok, Token::Pipe) {
                        has_pipe = true;
                    }
                    collected.push(tok.clone());
                    self.advance();
                }
            }
        }

        if has_pipe {
            let mut sub = Compiler::new(collected);
            sub.compile_pipeline(&[])?;
            self.code.extend(sub.code);
            self.emit(Op::ExecQ);
            self.emit(Op::SplitL(list_var.clone()));
        } else {
            let items: Vec<String> = collected.iter().map(Token::as_text).collect();
            self.emit(Op::SetList(list_var.clone(), items));
        }

        self.expect_word("do")?;

        self.emit(Op::ForeInit(var, list_var));
        let loop_start = self.code.len();
        let fore_next = self.emit(Op::ForeNext(0));

        self.loop_stack.push(LoopCtx { start: loop_start, break_jumps: Vec::new() });

        self.compile_stmts(&["done"])?;
        self.expect_word("done")?;

        self.emit(Op::Jmp(loop_start));

        let exit_target = self.code.len();
        self.patch(fore_next, exit_target);
        let ctx = self.loop_stack.pop().unwrap();
        for jidx in ctx.break_jumps {
            self.patch(jidx, exit_target);
        }
        Ok(())
    }

    fn compile_break(&mut self) -> Result<(), CompileError> {
        self.expect_word("break")?;
        if self.loop_stack.is_empty() {
            return Err(CompileError::BreakOutsideLoop);
        }
        let jidx = self.emit(Op::Jmp(0));
        self.loop_stack.last_mut().unwrap().break_jumps.push(jidx);
        Ok(())
    }

    fn compile_continue(&mut self) -> Result<(), CompileError> {
        self.expect_word("continue")?;
        let Some(ctx) = self.loop_stack.last() else {
            return Err(CompileError::ContinueOutsideLoop);
        };
        self.emit(Op::Jmp(ctx.start));
        Ok(())
    }

    // ---- && / || chains + redirection ----

    fn compile_chain(&mut self, terminators: &[&str]) -> Result<(), CompileError> {
        let is_assignment = match self.peek() {
            Some(Token::Word(w)) => {
                w.contains('=') && !w.starts_with('$')
            }
            _ => false,
        };

        if is_assignment {
            let word = self.advance_word().unwrap();
            let (name, value) = word.split_once('=').unwrap();
            self.emit(Op::Arg(value.to_string()));
            self.emit(Op::Set(name.to_string()));
            // Assignment side effect on last_truth (spec.md §9: deliberate).
            self.emit(Op::Load("echo".to_string()));
            self.emit(Op::Get(name.to_string()));
            self.emit(Op::ExecQ);
        } else {
            self.compile_pipeline(terminators)?;
            self.compile_redirection_if_present()?;
            self.emit(Op::Exec);
        }

        loop {
            let is_and = matches!(self.peek(), Some(Token::AndAnd));
            let is_or = matches!(self.peek(), Some(Token::OrOr));
            if !is_and && !is_or {
                return Ok(());
            }
            self.advance();

            if is_and {
                let skip_rhs = self.emit(Op::Jz(0));
                self.compile_pipeline(terminators)?;
                self.compile_redirection_if_present()?;
                self.emit(Op::Exec);
                let target = self.code.len();
                self.patch(skip_rhs, target);
            } else {
                let run_rhs = self.emit(Op::Jz(0));
                let skip_rhs = self.emit(Op::Jmp(0));
                let rhs_target = self.code.len();
                self.patch(run_rhs, rhs_target);
                self.compile_pipeline(terminators)?;
                self.compile_redirection_if_present()?;
                self.emit(Op::Exec);
                let end_target = self.code.len();
                self.patch(skip_rhs, end_target);
            }
        }
    }

    fn compile_redirection_if_present(&mut self) -> Result<(), CompileError> {
        let op = match self.peek() {
            Some(Token::Great) => "write",
            Some(Token::DGreat) => "append",
            _ => return Ok(()),
        };
        self.advance();
        let fname = self.advance_word().ok_or(CompileError::RedirectionMissingFilename)?;
        self.emit(Op::Pipe);
        self.emit(Op::Load(op.to_string()));
        self.emit(Op::Arg(fname));
        Ok(())
    }

    fn advance_word(&mut self) -> Option<String> {
        match self.advance()? {
            Token::Word(w) => Some(w),
            other => {
                // An operator token where a word was expected; put it back
                // semantically unreachable for our grammar, but guard anyway.
                self.pos -= 1;
                let _ = other;
                None
            }
        }
    }

    // ---- pipelines ----

    /// Compile one pipeline, stopping before `&&`, `||`, `>`, `>>`, `;`,
    /// or any word in `terminators`.
    fn compile_pipeline(&mut self, terminators: &[&str]) -> Result<(), CompileError> {
        let mut expecting_cmd = true;
        loop {
            match self.peek() {
                None | Some(Token::AndAnd) | Some(Token::OrOr) | Some(Token::Great)
                | Some(Token::DGreat) | Some(Token::Semi) => return Ok(()),
                Some(Token::Word(w)) if terminators.contains(&w.as_str()) => return Ok(()),
                Some(Token::Pipe) => {
                    self.advance();
                    self.emit(Op::Pipe);
                    expecting_cmd = true;
                    continue;
                }
                Some(Token::Word(_)) => {}
                Some(Token::Amp) => return Ok(()),
            }

            let word = self.advance_word().expect("peeked word");

            if let Some(var) = word.strip_prefix('$') {
                if !var.is_empty() {
                    self.emit(Op::Get(var.to_string()));
                    expecting_cmd = false;
                    continue;
                }
            }

            if expecting_cmd {
                self.emit(Op::Load(word));
                expecting_cmd = false;
            } else {
                self.emit(Op::Arg(word));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::targets_in_range;

    fn compile(line: &str) -> Vec<Op> {
        let (code, _) = compile_line(line).unwrap();
        code
    }

    #[test]
    fn simple_pipeline() {
        let code = compile("echo hello | upper");
        assert_eq!(
            code,
            vec![
                Op::Load("echo".into()),
                Op::Arg("hello".into()),
                Op::Pipe,
                Op::Load("upper".into()),
                Op::Exec,
                Op::End,
            ]
        );
        assert!(targets_in_range(&code));
    }

    #[test]
    fn assignment_sets_truth_via_echo_trailer() {
        let code = compile("x=5");
        assert_eq!(
            code,
            vec![
                Op::Arg("5".into()),
                Op::Set("x".into()),
                Op::Load("echo".into()),
                Op::Get("x".into()),
                Op::ExecQ,
                Op::End,
            ]
        );
    }

    #[test]
    fn variable_reference_emits_get() {
        let code = compile("echo $x");
        assert_eq!(
            code,
            vec![Op::Load("echo".into()), Op::Get("x".into()), Op::Exec, Op::End]
        );
    }

    #[test]
    fn redirection_reuses_pipe_machinery() {
        let code = compile("echo a > F");
        assert_eq!(
            code,
            vec![
                Op::Load("echo".into()),
                Op::Arg("a".into()),
                Op::Pipe,
                Op::Load("write".into()),
                Op::Arg("F".into()),
                Op::Exec,
                Op::End,
            ]
        );
    }

    #[test]
    fn append_redirection() {
        let code = compile("echo a >> F");
        assert!(code.contains(&Op::Load("append".into())));
    }

    #[test]
    fn redirection_without_filename_is_compile_error() {
        let err = compile_line("echo a >").unwrap_err();
        assert_eq!(err, CompileError::RedirectionMissingFilename);
    }

    #[test]
    fn and_and_short_circuit_jumps() {
        let code = compile("a && b");
        assert!(targets_in_range(&code));
        // First EXEC followed by a JZ skipping the rhs pipeline.
        assert!(matches!(code[2], Op::Jz(_)));
    }

    #[test]
    fn or_or_short_circuit_jumps() {
        let code = compile("false || echo fallback");
        assert!(targets_in_range(&code));
        assert!(code.iter().any(|op| matches!(op, Op::Jmp(_))));
    }

    #[test]
    fn if_then_else_fi() {
        let code = compile("if test $x -eq 3 then echo yes else echo no fi");
        assert!(targets_in_range(&code));
        assert!(code.iter().any(|op| matches!(op, Op::Jz(_))));
    }

    #[test]
    fn if_without_else() {
        let code = compile("if test $x -eq 3 then echo yes fi");
        assert!(targets_in_range(&code));
    }

    #[test]
    fn while_loop_jumps_back_to_header() {
        let code = compile("while test $x -lt 3 do addv x 1 done");
        assert!(targets_in_range(&code));
        assert_eq!(code.last(), Some(&Op::End));
    }

    #[test]
    fn for_loop_desugars_with_default_step() {
        let code = compile("for i 1 3 do echo $i done");
        assert!(targets_in_range(&code));
        assert!(code.contains(&Op::Arg("-le".into())));
        assert!(code.contains(&Op::Arg("1".into())));
    }

    #[test]
    fn for_loop_negative_literal_step_uses_ge() {
        let code = compile("for i 3 1 -1 do echo $i done");
        assert!(code.contains(&Op::Arg("-ge".into())));
    }

    #[test]
    fn for_loop_variable_step_defaults_to_le() {
        // spec.md §9 open question: a variable-valued step always maps to -le.
        let code = compile("for i 1 3 $step do echo $i done");
        assert!(code.contains(&Op::Arg("-le".into())));
    }

    #[test]
    fn foreach_over_literal_list() {
        let code = compile("foreach v in a b c do echo $v done");
        assert!(targets_in_range(&code));
        assert!(matches!(code[0], Op::SetList(_, _)));
        if let Op::SetList(_, items) = &code[0] {
            assert_eq!(items, &vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        }
    }

    #[test]
    fn foreach_over_pipeline_splits_lines() {
        let code = compile("foreach v in echo a | upper do echo $v done");
        assert!(code.iter().any(|op| matches!(op, Op::SplitL(_))));
    }

    #[test]
    fn break_outside_loop_is_compile_error() {
        let err = compile_line("break").unwrap_err();
        assert_eq!(err, CompileError::BreakOutsideLoop);
    }

    #[test]
    fn continue_outside_loop_is_compile_error() {
        let err = compile_line("continue").unwrap_err();
        assert_eq!(err, CompileError::ContinueOutsideLoop);
    }

    #[test]
    fn break_and_continue_inside_while() {
        let code = compile("while test $x -lt 3 do if test $x -eq 1 then break fi continue done");
        assert!(targets_in_range(&code));
    }

    #[test]
    fn missing_fi_is_compile_error() {
        let err = compile_line("if test $x -eq 3 then echo yes").unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedEof { .. }));
    }

    #[test]
    fn empty_line_compiles_to_just_end() {
        let code = compile("");
        assert_eq!(code, vec![Op::End]);
    }

    #[test]
    fn bare_semicolon_is_a_noop() {
        let code = compile(";");
        assert_eq!(code, vec![Op::End]);
    }

    #[test]
    fn dangling_pipe_with_no_rhs_compiles() {
        // spec.md §8: "| with no right-hand command -> left-hand output
        // becomes last_output with no additional stage." The compiler
        // still emits a trailing PIPE with no following LOAD; the VM's
        // pipeline drain (not the compiler) is what skips the empty stage.
        let code = compile("echo a |");
        assert!(code.contains(&Op::Pipe));
    }

    #[test]
    fn every_emitted_jump_target_is_in_range() {
        for line in [
            "echo a",
            "x=1 && echo $x",
            "false || echo fallback",
            "if test $x -eq 3 then echo yes else echo no fi",
            "while test $x -lt 3 do addv x 1 done",
            "for i 1 3 do echo $i done",
            "foreach v in a b c do echo $v done",
        ] {
            let code = compile(line);
            assert!(targets_in_range(&code), "line {line:?} produced out-of-range target");
        }
    }
}
