//! Turns a [`RawProgram`] into a validated, order-sorted instruction vector
//! plus a label table.
//!
//! This is the only module that deals with the load-time argument kinds
//! (`var`, `int`, `string`, `bool`, `nil`, `label`, `type`) as raw text; by
//! the time an [`Instruction`] reaches [`crate::engine`] every argument has
//! already been decoded into a runtime [`Argument`].

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::instruction::{Argument, FrameTag, Instruction, OpCode};
use crate::raw::{RawArgument, RawInstruction, RawProgram};
use crate::value::{TypeTag, Value};

/// The result of a successful load: instructions in execution order, and
/// a label name → instruction index table.
#[derive(Debug, Clone)]
pub struct LoadedProgram {
    pub instructions: Vec<Instruction>,
    pub labels: HashMap<String, usize>,
}

/// Validate and decode a [`RawProgram`].
pub fn load(raw: RawProgram) -> Result<LoadedProgram> {
    if raw.language != "IPPcode22" {
        return Err(Error::Structure(format!(
            "unsupported language attribute: {}",
            raw.language
        )));
    }

    let mut ordered: Vec<(u64, RawInstruction)> = Vec::with_capacity(raw.instructions.len());
    let mut seen_orders = std::collections::HashSet::new();

    for inst in raw.instructions {
        let order = parse_order(&inst.order)?;
        if !seen_orders.insert(order) {
            return Err(Error::Structure(format!("duplicate order number {}", order)));
        }
        ordered.push((order, inst));
    }

    ordered.sort_by_key(|(order, _)| *order);

    let mut instructions = Vec::with_capacity(ordered.len());
    for (_, raw_inst) in ordered {
        instructions.push(decode_instruction(raw_inst)?);
    }

    let labels = build_label_table(&instructions)?;

    Ok(LoadedProgram { instructions, labels })
}

fn parse_order(text: &str) -> Result<u64> {
    let value: i64 = text
        .parse()
        .map_err(|_| Error::Structure(format!("order is not an integer: {}", text)))?;
    if value < 1 {
        return Err(Error::Structure(format!("order must be positive: {}", value)));
    }
    Ok(value as u64)
}

fn decode_instruction(raw: RawInstruction) -> Result<Instruction> {
    let opcode = OpCode::parse(&raw.opcode)
        .ok_or_else(|| Error::Structure(format!("unknown opcode: {}", raw.opcode)))?;

    let mut args = raw.args;
    args.sort_by_key(|a| a.position);

    for (expected, arg) in (1u8..).zip(args.iter()) {
        if arg.position != expected {
            return Err(Error::Structure(format!(
                "argument positions are not dense starting at 1 (got {})",
                arg.position
            )));
        }
    }

    let decoded = args
        .into_iter()
        .map(decode_argument)
        .collect::<Result<Vec<_>>>()?;

    Ok(Instruction::new(opcode, decoded))
}

fn decode_argument(raw: RawArgument) -> Result<Argument> {
    match raw.arg_type.as_str() {
        "var" => {
            // Slice by code point, not by byte: `raw.text` is arbitrary
            // Unicode and a byte-index split can land inside a multi-byte
            // character.
            let chars: Vec<char> = raw.text.chars().collect();
            if chars.len() < 4 {
                return Err(Error::Malformed(format!("variable name too short: {}", raw.text)));
            }
            let prefix: String = chars[..3].iter().collect();
            let name: String = chars[3..].iter().collect();
            let frame = match prefix.as_str() {
                "GF@" => FrameTag::Global,
                "LF@" => FrameTag::Local,
                "TF@" => FrameTag::Temporary,
                _ => {
                    return Err(Error::Malformed(format!(
                        "variable name has no frame prefix: {}",
                        raw.text
                    )))
                }
            };
            Ok(Argument::Var { frame, name })
        }
        "int" => {
            let value: i64 = parse_signed_int(&raw.text)
                .ok_or_else(|| Error::Structure(format!("invalid int literal: {}", raw.text)))?;
            Ok(Argument::Const(Value::Int(value)))
        }
        "bool" => match raw.text.as_str() {
            "true" => Ok(Argument::Const(Value::Bool(true))),
            "false" => Ok(Argument::Const(Value::Bool(false))),
            other => Err(Error::Malformed(format!("invalid bool literal: {}", other))),
        },
        "nil" => {
            if raw.text == "nil" {
                Ok(Argument::Const(Value::Nil))
            } else {
                Err(Error::Malformed(format!("invalid nil literal: {}", raw.text)))
            }
        }
        "label" => {
            if raw.text.is_empty() {
                Err(Error::Malformed("empty label name".to_string()))
            } else {
                Ok(Argument::Label(raw.text))
            }
        }
        "type" => match raw.text.as_str() {
            "int" => Ok(Argument::Type(TypeTag::Int)),
            "string" => Ok(Argument::Type(TypeTag::Str)),
            "bool" => Ok(Argument::Type(TypeTag::Bool)),
            other => Err(Error::Malformed(format!("invalid type literal: {}", other))),
        },
        "string" => Ok(Argument::Const(Value::Str(decode_string_literal(&raw.text)?))),
        other => Err(Error::Structure(format!("unknown argument type: {}", other))),
    }
}

/// Accepts a nonempty, optionally-signed run of decimal digits.
pub(crate) fn parse_signed_int(text: &str) -> Option<i64> {
    if text.is_empty() {
        return None;
    }
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Decodes `\NNN` escapes (three decimal digits, 0–999) into their Unicode
/// code point; everything between escapes is copied literally.
fn decode_string_literal(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let bytes: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == '\\' {
            let digits: String = bytes.get(i + 1..i + 4).map(|s| s.iter().collect()).unwrap_or_default();
            if digits.len() != 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::InvalidOperand(format!(
                    "malformed string escape at offset {}",
                    i
                )));
            }
            // Three decimal digits are always in 0..=999 by construction.
            let code: u32 = digits.parse().unwrap();
            let ch = char::from_u32(code)
                .ok_or_else(|| Error::InvalidOperand(format!("escape is not a valid code point: {}", code)))?;
            out.push(ch);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Build the label table: scan instructions in order, recording each
/// `LABEL`'s index. A repeated label name is a structural failure.
fn build_label_table(instructions: &[Instruction]) -> Result<HashMap<String, usize>> {
    let mut labels = HashMap::new();
    for (index, inst) in instructions.iter().enumerate() {
        if inst.opcode == OpCode::Label {
            let name = inst.args[0]
                .as_label()
                .expect("LABEL's sole argument is always a label")
                .to_string();
            if labels.insert(name.clone(), index).is_some() {
                return Err(Error::Label(format!("duplicate label: {}", name)));
            }
        }
    }
    Ok(labels)
}
