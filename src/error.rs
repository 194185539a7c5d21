//! The error taxonomy and its mapping onto IPPcode22 exit codes.

use thiserror::Error;

/// Everything that can go wrong, from malformed input through a runtime
/// type violation. Display text is the one-line description a caller
/// writes to stderr before mapping the variant to its exit code.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid argument text: {0}")]
    Malformed(String),

    #[error("unexpected program structure: {0}")]
    Structure(String),

    #[error("undefined or duplicate label: {0}")]
    Label(String),

    #[error("invalid operand kinds: {0}")]
    InvalidOperand(String),

    #[error("reference to undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("access to invalid or empty frame: {0}")]
    InvalidFrame(String),

    #[error("empty stack or use of uninitialized value: {0}")]
    EmptyOrUninitialized(String),

    #[error("division by zero or exit value out of range: {0}")]
    ArithmeticRange(String),

    #[error("string operation index out of range: {0}")]
    IndexOutOfRange(String),

    /// Not one of the documented exit codes (§6) — an ambient safeguard
    /// (see SPEC_FULL.md §4.5) that aborts a runaway program. An embedder
    /// should treat this as a host-level abort, not a program exit code.
    #[error("instruction limit of {0} exceeded")]
    InstructionLimitExceeded(u64),

    /// Not one of the documented exit codes (§6) — `run`/`run_capturing`
    /// called before any `load` succeeded. A library misuse, not a program
    /// failure.
    #[error("no program loaded")]
    NotLoaded,
}

impl Error {
    /// The IPPcode22 exit code this error maps to, or `None` for the one
    /// variant (`InstructionLimitExceeded`) that has no assigned code.
    pub fn exit_code(&self) -> Option<u8> {
        match self {
            Error::Malformed(_) => Some(31),
            Error::Structure(_) => Some(32),
            Error::Label(_) => Some(52),
            Error::InvalidOperand(_) => Some(53),
            Error::UndefinedVariable(_) => Some(54),
            Error::InvalidFrame(_) => Some(55),
            Error::EmptyOrUninitialized(_) => Some(56),
            Error::ArithmeticRange(_) => Some(57),
            Error::IndexOutOfRange(_) => Some(58),
            Error::InstructionLimitExceeded(_) => None,
            Error::NotLoaded => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_taxonomy() {
        assert_eq!(Error::Malformed("x".into()).exit_code(), Some(31));
        assert_eq!(Error::Structure("x".into()).exit_code(), Some(32));
        assert_eq!(Error::Label("x".into()).exit_code(), Some(52));
        assert_eq!(Error::InvalidOperand("x".into()).exit_code(), Some(53));
        assert_eq!(Error::UndefinedVariable("x".into()).exit_code(), Some(54));
        assert_eq!(Error::InvalidFrame("x".into()).exit_code(), Some(55));
        assert_eq!(Error::EmptyOrUninitialized("x".into()).exit_code(), Some(56));
        assert_eq!(Error::ArithmeticRange("x".into()).exit_code(), Some(57));
        assert_eq!(Error::IndexOutOfRange("x".into()).exit_code(), Some(58));
        assert_eq!(Error::InstructionLimitExceeded(10).exit_code(), None);
        assert_eq!(Error::NotLoaded.exit_code(), None);
    }

    #[test]
    fn display_is_one_line() {
        let err = Error::Label("main".to_string());
        assert!(!err.to_string().contains('\n'));
    }
}
