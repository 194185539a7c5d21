//! The fetch-decode-execute loop.
//!
//! Grounded directly on `vm.rs`'s `Vm::run`/`dispatch_op` split: `run`
//! drives the instruction pointer and the optional instruction-count
//! budget, `dispatch_one` is the per-instruction `match`.

use std::collections::HashMap;
use std::io::Write;

use crate::error::{Error, Result};
use crate::frame::FrameSet;
use crate::instruction::{Argument, FrameTag, Instruction, OpCode};
use crate::io::InputSource;
use crate::operators;
use crate::stacks::{CallStack, DataStack};
use crate::value::Value;

/// How a run ended: either it fell off the end of the program (code 0) or
/// it hit `EXIT` with an explicit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: u8,
}

impl ExitOutcome {
    fn natural() -> Self {
        Self { code: 0 }
    }

    fn explicit(code: u8) -> Self {
        Self { code }
    }
}

pub struct Engine {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
    frames: FrameSet,
    data_stack: DataStack,
    call_stack: CallStack,
    ip: usize,
    instruction_count: u64,
    instruction_limit: Option<u64>,
    input: Box<dyn InputSource>,
}

impl Engine {
    pub fn new(
        instructions: Vec<Instruction>,
        labels: HashMap<String, usize>,
        input: Box<dyn InputSource>,
        instruction_limit: Option<u64>,
    ) -> Self {
        Self {
            instructions,
            labels,
            frames: FrameSet::new(),
            data_stack: DataStack::new(),
            call_stack: CallStack::new(),
            ip: 0,
            instruction_count: 0,
            instruction_limit,
            input,
        }
    }

    pub fn run(&mut self, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<ExitOutcome> {
        loop {
            if self.ip >= self.instructions.len() {
                return Ok(ExitOutcome::natural());
            }

            self.instruction_count += 1;
            if let Some(limit) = self.instruction_limit {
                if self.instruction_count > limit {
                    return Err(Error::InstructionLimitExceeded(limit));
                }
            }

            let inst = self.instructions[self.ip].clone();
            if let Some(exit) = self.dispatch(&inst, stdout, stderr)? {
                return Ok(exit);
            }
        }
    }

    /// Execute one instruction. Returns `Some(outcome)` on `EXIT`,
    /// otherwise advances `ip` (either to `ip + 1` or, for a taken jump,
    /// to the target) and returns `None`.
    fn dispatch(
        &mut self,
        inst: &Instruction,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<Option<ExitOutcome>> {
        use OpCode::*;

        match inst.opcode {
            Move => {
                let (frame, name) = var_target(&inst.args[0])?;
                let value = self.resolve(&inst.args[1])?;
                self.frames.write(frame, name, value)?;
            }
            DefVar => {
                let (frame, name) = var_target(&inst.args[0])?;
                self.frames.define(frame, name)?;
            }
            CreateFrame => self.frames.create_frame(),
            PushFrame => self.frames.push_frame()?,
            PopFrame => self.frames.pop_frame()?,

            Pushs => {
                let value = self.resolve(&inst.args[0])?;
                self.data_stack.push(value);
            }
            Pops => {
                let (frame, name) = var_target(&inst.args[0])?;
                let value = self.data_stack.pop()?;
                self.frames.write(frame, name, value)?;
            }

            Add | Sub | Mul | IDiv => {
                let (frame, name) = var_target(&inst.args[0])?;
                let a = self.resolve(&inst.args[1])?;
                let b = self.resolve(&inst.args[2])?;
                let result = match inst.opcode {
                    Add => operators::add(&a, &b)?,
                    Sub => operators::sub(&a, &b)?,
                    Mul => operators::mul(&a, &b)?,
                    IDiv => operators::idiv(&a, &b)?,
                    _ => unreachable!(),
                };
                self.frames.write(frame, name, result)?;
            }

            Lt | Gt | Eq => {
                let (frame, name) = var_target(&inst.args[0])?;
                let a = self.resolve(&inst.args[1])?;
                let b = self.resolve(&inst.args[2])?;
                let result = match inst.opcode {
                    Lt => operators::lt(&a, &b)?,
                    Gt => operators::gt(&a, &b)?,
                    Eq => operators::eq(&a, &b)?,
                    _ => unreachable!(),
                };
                self.frames.write(frame, name, result)?;
            }

            And | Or => {
                let (frame, name) = var_target(&inst.args[0])?;
                let a = self.resolve(&inst.args[1])?;
                let b = self.resolve(&inst.args[2])?;
                let result = if inst.opcode == And {
                    operators::and(&a, &b)?
                } else {
                    operators::or(&a, &b)?
                };
                self.frames.write(frame, name, result)?;
            }
            Not => {
                let (frame, name) = var_target(&inst.args[0])?;
                let a = self.resolve(&inst.args[1])?;
                self.frames.write(frame, name, operators::not(&a)?)?;
            }

            Int2Char => {
                let (frame, name) = var_target(&inst.args[0])?;
                let code = expect_int("INT2CHAR", &self.resolve(&inst.args[1])?)?;
                let ch = u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| Error::IndexOutOfRange(format!("{} is not a valid code point", code)))?;
                self.frames.write(frame, name, Value::Str(ch.to_string()))?;
            }
            Stri2Int => {
                let (frame, name) = var_target(&inst.args[0])?;
                let s = expect_str("STRI2INT", &self.resolve(&inst.args[1])?)?;
                let index = expect_int("STRI2INT", &self.resolve(&inst.args[2])?)?;
                let ch = char_at(&s, index)?;
                self.frames.write(frame, name, Value::Int(ch as i64))?;
            }

            Concat => {
                let (frame, name) = var_target(&inst.args[0])?;
                let a = expect_str("CONCAT", &self.resolve(&inst.args[1])?)?;
                let b = expect_str("CONCAT", &self.resolve(&inst.args[2])?)?;
                self.frames.write(frame, name, Value::Str(format!("{}{}", a, b)))?;
            }
            Strlen => {
                let (frame, name) = var_target(&inst.args[0])?;
                let s = expect_str("STRLEN", &self.resolve(&inst.args[1])?)?;
                self.frames.write(frame, name, Value::Int(s.chars().count() as i64))?;
            }
            GetChar => {
                let (frame, name) = var_target(&inst.args[0])?;
                let s = expect_str("GETCHAR", &self.resolve(&inst.args[1])?)?;
                let index = expect_int("GETCHAR", &self.resolve(&inst.args[2])?)?;
                let ch = char_at(&s, index)?;
                self.frames.write(frame, name, Value::Str(ch.to_string()))?;
            }
            SetChar => {
                let (frame, name) = var_target(&inst.args[0])?;
                let current = self.frames.read(frame, name)?.clone();
                let mut chars: Vec<char> = expect_str("SETCHAR", &current)?.chars().collect();
                let index = expect_int("SETCHAR", &self.resolve(&inst.args[1])?)?;
                let replacement = expect_str("SETCHAR", &self.resolve(&inst.args[2])?)?;
                let first = replacement
                    .chars()
                    .next()
                    .ok_or_else(|| Error::IndexOutOfRange("SETCHAR replacement string is empty".to_string()))?;
                let position = usize::try_from(index)
                    .ok()
                    .filter(|i| *i < chars.len())
                    .ok_or_else(|| Error::IndexOutOfRange(format!("SETCHAR index {} out of range", index)))?;
                chars[position] = first;
                self.frames.write(frame, name, Value::Str(chars.into_iter().collect()))?;
            }

            Read => {
                let (frame, name) = var_target(&inst.args[0])?;
                let type_tag = inst.args[1]
                    .as_type_tag()
                    .ok_or_else(|| Error::Structure("READ's second operand must be a type".to_string()))?;
                let value = self.read_typed(type_tag)?;
                self.frames.write(frame, name, value)?;
            }
            Write => {
                let value = self.resolve(&inst.args[0])?;
                write!(stdout, "{}", value).map_err(io_error)?;
            }
            Dprint => {
                let value = self.resolve(&inst.args[0])?;
                write!(stderr, "{}", value).map_err(io_error)?;
            }
            Break => {
                writeln!(
                    stderr,
                    "ip={} executed={} globals={}",
                    self.ip,
                    self.instruction_count,
                    self.frames.global_var_count()
                )
                .map_err(io_error)?;
            }

            Label => {}
            Jump => {
                self.ip = self.resolve_label(&inst.args[0])?;
                return Ok(None);
            }
            Call => {
                let target = self.resolve_label(&inst.args[0])?;
                self.call_stack.push(self.ip + 1);
                self.ip = target;
                return Ok(None);
            }
            Return => {
                self.ip = self.call_stack.pop()?;
                return Ok(None);
            }
            JumpIfEq | JumpIfNeq => {
                let target = self.resolve_label(&inst.args[0])?;
                let a = self.resolve(&inst.args[1])?;
                let b = self.resolve(&inst.args[2])?;
                let matches = operators::eq(&a, &b)? == Value::Bool(true);
                let take = if inst.opcode == JumpIfEq { matches } else { !matches };
                if take {
                    self.ip = target;
                    return Ok(None);
                }
            }

            Type => {
                let (frame, name) = var_target(&inst.args[0])?;
                let type_name = match &inst.args[1] {
                    Argument::Var { frame: sf, name: sn } => self.frames.type_name_of(*sf, sn)?,
                    Argument::Const(v) => v.type_name(),
                    _ => return Err(Error::Structure("TYPE's second operand must be a symbol".to_string())),
                };
                self.frames.write(frame, name, Value::Str(type_name.to_string()))?;
            }
            Exit => {
                let value = self.resolve(&inst.args[0])?;
                let code = value
                    .as_int()
                    .ok_or_else(|| Error::ArithmeticRange("EXIT operand must be int".to_string()))?;
                if !(0..=49).contains(&code) {
                    return Err(Error::ArithmeticRange(format!("exit code {} out of range", code)));
                }
                return Ok(Some(ExitOutcome::explicit(code as u8)));
            }
        }

        self.ip += 1;
        Ok(None)
    }

    fn resolve(&self, arg: &Argument) -> Result<Value> {
        match arg {
            Argument::Const(value) => Ok(value.clone()),
            Argument::Var { frame, name } => self.frames.read(*frame, name).cloned(),
            _ => Err(Error::Structure("expected a symbol (variable or constant)".to_string())),
        }
    }

    fn resolve_label(&self, arg: &Argument) -> Result<usize> {
        let name = arg
            .as_label()
            .ok_or_else(|| Error::Structure("expected a label operand".to_string()))?;
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| Error::Label(format!("undefined label: {}", name)))
    }

    fn read_typed(&mut self, type_tag: crate::value::TypeTag) -> Result<Value> {
        use crate::value::TypeTag::*;

        let line = self.input.read_line().ok().flatten();
        let Some(line) = line else {
            return Ok(Value::Nil);
        };
        Ok(match type_tag {
            Int => match crate::loader::parse_signed_int(&line) {
                Some(n) => Value::Int(n),
                None => Value::Nil,
            },
            Bool => Value::Bool(line.eq_ignore_ascii_case("true")),
            Str => Value::Str(line),
        })
    }
}

fn var_target(arg: &Argument) -> Result<(FrameTag, &str)> {
    match arg {
        Argument::Var { frame, name } => Ok((*frame, name.as_str())),
        _ => Err(Error::Structure("expected a variable operand".to_string())),
    }
}

fn expect_int(op: &str, value: &Value) -> Result<i64> {
    value
        .as_int()
        .ok_or_else(|| Error::InvalidOperand(format!("{} expects int, got {}", op, value.type_name())))
}

fn expect_str(op: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidOperand(format!("{} expects string, got {}", op, value.type_name())))
}

fn char_at(s: &str, index: i64) -> Result<char> {
    usize::try_from(index)
        .ok()
        .and_then(|i| s.chars().nth(i))
        .ok_or_else(|| Error::IndexOutOfRange(format!("index {} out of range", index)))
}

fn io_error(err: std::io::Error) -> Error {
    // Output sinks are caller-provided; a write failure on them has no
    // assigned exit code, so it is folded into the structural-error bucket.
    Error::Structure(format!("output write failed: {}", err))
}
