//! The load-time shape an external front end hands to [`crate::loader`].
//!
//! XML ingestion is an external collaborator: nothing in this crate parses
//! XML bytes. Instead, the loader's input is this small set of plain data
//! records — the shape any XML library (or test code building a program by
//! hand) must produce. This mirrors the way a parser crate hands a compiler
//! a pre-parsed tree rather than the compiler doing its own tokenizing.

/// A parsed-but-not-yet-validated program.
#[derive(Debug, Clone)]
pub struct RawProgram {
    /// The root element's `language` attribute. Must equal `"IPPcode22"`.
    pub language: String,
    pub instructions: Vec<RawInstruction>,
}

/// One `<instruction>` element, not yet validated or decoded.
#[derive(Debug, Clone)]
pub struct RawInstruction {
    /// The `order` attribute, as raw text (decoded and range-checked by the loader).
    pub order: String,
    /// The `opcode` attribute, case-insensitive.
    pub opcode: String,
    /// The `argN` children, in whatever order the front end encountered them.
    pub args: Vec<RawArgument>,
}

/// One `<argN>` element, not yet validated or decoded.
#[derive(Debug, Clone)]
pub struct RawArgument {
    /// Which position this argument claims to occupy (the `N` in `argN`).
    pub position: u8,
    /// The declared `type` attribute.
    pub arg_type: String,
    /// The raw text content (may be empty, e.g. for an empty `string`).
    pub text: String,
}

impl RawProgram {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            instructions: Vec::new(),
        }
    }

    pub fn with_instruction(mut self, instruction: RawInstruction) -> Self {
        self.instructions.push(instruction);
        self
    }
}

impl RawInstruction {
    pub fn new(order: impl Into<String>, opcode: impl Into<String>) -> Self {
        Self {
            order: order.into(),
            opcode: opcode.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, position: u8, arg_type: impl Into<String>, text: impl Into<String>) -> Self {
        self.args.push(RawArgument {
            position,
            arg_type: arg_type.into(),
            text: text.into(),
        });
        self
    }
}
