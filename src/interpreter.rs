//! The public embedding surface.
//!
//! Grounded on `sandbox.rs`'s `Sandbox` facade: a thin, stateful wrapper
//! that hides the loader/engine split behind `load`/`run`, and offers a
//! `capture`-style variant for tests that must not touch the process's
//! real stdout/stderr.

use std::io::Write;

use crate::engine::{Engine, ExitOutcome};
use crate::error::{Error, Result};
use crate::io::{BufferedInput, InputSource, NoInput, StdinInput};
use crate::loader::{self, LoadedProgram};
use crate::raw::RawProgram;

/// Optional resource governor. Mirrors the ambient crate's own
/// `Limits { max_instructions, .. }`, scoped here to the one axis this
/// interpreter needs (SPEC_FULL.md §4.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct Limits {
    pub max_instructions: Option<u64>,
}

/// Captured output from [`Interpreter::run_capturing`], the equivalent of
/// the ambient crate's `Output { value, output }`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapturedOutput {
    pub exit_code: u8,
    pub stdout: String,
    pub stderr: String,
}

/// Loads and runs one IPPcode22 program.
pub struct Interpreter {
    limits: Limits,
    input: Box<dyn InputSource>,
    loaded: Option<LoadedProgram>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            input: Box::new(NoInput),
            loaded: None,
        }
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            ..Self::new()
        }
    }

    /// Read `READ`'s input from stdin (the default is [`NoInput`], which
    /// always yields end-of-input).
    pub fn set_input(&mut self, input: impl InputSource + 'static) {
        self.input = Box::new(input);
    }

    pub fn set_input_from_stdin(&mut self) {
        self.input = Box::new(StdinInput::new());
    }

    pub fn set_input_from_file(&mut self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        self.input = Box::new(BufferedInput::open_file(path)?);
        Ok(())
    }

    /// Validate and decode a program. Atomic: on error, no prior `load`'s
    /// state is disturbed (there is only ever one loaded program at a
    /// time, and a failed load leaves the previous one, if any, in place).
    pub fn load(&mut self, raw: RawProgram) -> Result<()> {
        let loaded = loader::load(raw)?;
        self.loaded = Some(loaded);
        Ok(())
    }

    /// Run the loaded program against the process's real stdout/stderr.
    pub fn run(&mut self) -> Result<ExitOutcome> {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        self.run_with(&mut stdout.lock(), &mut stderr.lock())
    }

    /// Run the loaded program, capturing its stdout/stderr instead of
    /// inheriting the process's real streams — the shape
    /// `Sandbox::capture` returns, used by tests that must not pollute
    /// the test runner's own output.
    pub fn run_capturing(&mut self) -> Result<CapturedOutput> {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let outcome = self.run_with(&mut stdout, &mut stderr)?;
        Ok(CapturedOutput {
            exit_code: outcome.code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    /// Runs the loaded program. Repeatable: a second call re-runs the same
    /// loaded program rather than failing, since nothing else about the
    /// embedding surface stops a caller from invoking `run`/`run_capturing`
    /// more than once between loads.
    fn run_with(&mut self, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<ExitOutcome> {
        let loaded = self.loaded.as_ref().ok_or(Error::NotLoaded)?.clone();
        let mut engine = Engine::new(
            loaded.instructions,
            loaded.labels,
            std::mem::replace(&mut self.input, Box::new(NoInput)),
            self.limits.max_instructions,
        );
        engine.run(stdout, stderr)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawInstruction;

    fn program() -> RawProgram {
        RawProgram::new("IPPcode22")
            .with_instruction(RawInstruction::new("1", "DEFVAR").with_arg(1, "var", "GF@x"))
            .with_instruction(
                RawInstruction::new("2", "MOVE")
                    .with_arg(1, "var", "GF@x")
                    .with_arg(2, "string", "hi"),
            )
            .with_instruction(RawInstruction::new("3", "WRITE").with_arg(1, "var", "GF@x"))
    }

    #[test]
    fn load_then_run_capturing_produces_expected_output() {
        let mut interp = Interpreter::new();
        interp.load(program()).unwrap();
        let out = interp.run_capturing().unwrap();
        assert_eq!(out.stdout, "hi");
        assert_eq!(out.stderr, "");
        assert_eq!(out.exit_code, 0);
    }

    #[test]
    fn failed_load_does_not_touch_a_prior_successful_one() {
        let mut interp = Interpreter::new();
        interp.load(program()).unwrap();
        let bad = RawProgram::new("NotIPP");
        assert!(interp.load(bad).is_err());
        let out = interp.run_capturing().unwrap();
        assert_eq!(out.stdout, "hi");
    }

    #[test]
    fn run_before_load_is_an_error_not_a_panic() {
        let mut interp = Interpreter::new();
        let err = interp.run_capturing().unwrap_err();
        assert_eq!(err, Error::NotLoaded);
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn run_capturing_twice_reruns_the_same_loaded_program() {
        let mut interp = Interpreter::new();
        interp.load(program()).unwrap();
        let first = interp.run_capturing().unwrap();
        let second = interp.run_capturing().unwrap();
        assert_eq!(first, second);
        assert_eq!(second.stdout, "hi");
    }

    #[test]
    fn instruction_limit_surfaces_as_an_error() {
        let raw = RawProgram::new("IPPcode22")
            .with_instruction(RawInstruction::new("1", "LABEL").with_arg(1, "label", "top"))
            .with_instruction(RawInstruction::new("2", "JUMP").with_arg(1, "label", "top"));
        let mut interp = Interpreter::with_limits(Limits { max_instructions: Some(5) });
        interp.load(raw).unwrap();
        let err = interp.run_capturing().unwrap_err();
        assert_eq!(err.exit_code(), None);
    }
}
