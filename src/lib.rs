//! ippcode22 - an interpreter for IPPcode22, a three-address instruction set
//!
//! IPPcode22 programs are a flat list of instructions operating on three
//! memory frames (global, temporary, local-stack), a data stack, and a call
//! stack, with statically-unknown but dynamically-checked value types
//! (`int`, `bool`, `string`, `nil`).
//!
//! This crate does not parse the XML representation of a program — that is
//! an external collaborator's job. Instead it accepts a [`RawProgram`]:
//! plain data any front end (an XML library, or test code) can build.
//!
//! # Quick Start
//!
//! ```
//! use ippcode22::{Interpreter, RawProgram, RawInstruction};
//!
//! let program = RawProgram::new("IPPcode22")
//!     .with_instruction(RawInstruction::new("1", "DEFVAR").with_arg(1, "var", "GF@x"))
//!     .with_instruction(
//!         RawInstruction::new("2", "MOVE")
//!             .with_arg(1, "var", "GF@x")
//!             .with_arg(2, "string", "hello"),
//!     )
//!     .with_instruction(RawInstruction::new("3", "WRITE").with_arg(1, "var", "GF@x"));
//!
//! let mut interpreter = Interpreter::new();
//! interpreter.load(program).unwrap();
//! let output = interpreter.run_capturing().unwrap();
//! assert_eq!(output.stdout, "hello");
//! ```

mod engine;
mod error;
mod frame;
mod instruction;
mod interpreter;
mod io;
mod loader;
mod operators;
mod raw;
mod stacks;
mod value;

pub use engine::ExitOutcome;
pub use error::{Error, Result};
pub use instruction::{Argument, FrameTag, Instruction, OpCode};
pub use interpreter::{CapturedOutput, Interpreter, Limits};
pub use io::{BufferedInput, InputSource, NoInput, StdinInput};
pub use raw::{RawArgument, RawInstruction, RawProgram};
pub use value::{TypeTag, Value};
