//! Frame management: the global frame, the temporary frame, and the local
//! frame stack.
//!
//! Grounded on the reference interpreter's `get_frame`/`get_var` pair,
//! generalized the way `vm.rs` generalizes a single `globals: HashMap` into
//! the three IPPcode22 frame kinds.

use crate::error::{Error, Result};
use crate::instruction::FrameTag;
use crate::value::{Value, Variable};

/// One frame: an ordered list of variable slots, searched by name.
///
/// A `Vec` rather than a map: a repeat `DEFVAR` of an already-declared name
/// appends a new entry rather than replacing the old one, and lookup does a
/// linear scan returning the first match — the same behavior as the
/// reference interpreter's `get_var`, which walks the frame's variable list
/// front-to-back and returns on the first name match, so the original
/// variable (and its value) survives a redefinition.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    vars: Vec<Variable>,
}

impl Frame {
    fn new() -> Self {
        Self::default()
    }

    fn define(&mut self, name: &str) -> Result<()> {
        // Redeclaring an existing name appends a shadow entry rather than
        // erroring or overwriting (see SPEC_FULL.md §9, open question 2,
        // and §4.2).
        self.vars.push(Variable::new(name));
        Ok(())
    }

    fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.iter().find(|v| v.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.vars.iter_mut().find(|v| v.name == name)
    }
}

/// Holds the global frame, the current temporary frame (if any), and the
/// stack of pushed local frames.
#[derive(Debug, Default)]
pub struct FrameSet {
    global: Frame,
    temporary: Option<Frame>,
    locals: Vec<Frame>,
}

impl FrameSet {
    pub fn new() -> Self {
        Self {
            global: Frame::new(),
            temporary: None,
            locals: Vec::new(),
        }
    }

    /// `CREATEFRAME`: replace TF with a fresh, empty frame, discarding
    /// whatever was there.
    pub fn create_frame(&mut self) {
        self.temporary = Some(Frame::new());
    }

    /// `PUSHFRAME`: move TF onto the local frame stack. Fails if TF does
    /// not exist.
    pub fn push_frame(&mut self) -> Result<()> {
        let frame = self
            .temporary
            .take()
            .ok_or_else(|| Error::InvalidFrame("PUSHFRAME with no temporary frame".to_string()))?;
        self.locals.push(frame);
        Ok(())
    }

    /// `POPFRAME`: pop the top local frame into TF. Fails if LF is empty.
    pub fn pop_frame(&mut self) -> Result<()> {
        let frame = self
            .locals
            .pop()
            .ok_or_else(|| Error::InvalidFrame("POPFRAME with empty local frame stack".to_string()))?;
        self.temporary = Some(frame);
        Ok(())
    }

    fn frame_mut(&mut self, tag: FrameTag) -> Result<&mut Frame> {
        match tag {
            FrameTag::Global => Ok(&mut self.global),
            FrameTag::Temporary => self
                .temporary
                .as_mut()
                .ok_or_else(|| Error::InvalidFrame("access to nonexistent temporary frame".to_string())),
            FrameTag::Local => self
                .locals
                .last_mut()
                .ok_or_else(|| Error::InvalidFrame("access to empty local frame stack".to_string())),
        }
    }

    fn frame(&self, tag: FrameTag) -> Result<&Frame> {
        match tag {
            FrameTag::Global => Ok(&self.global),
            FrameTag::Temporary => self
                .temporary
                .as_ref()
                .ok_or_else(|| Error::InvalidFrame("access to nonexistent temporary frame".to_string())),
            FrameTag::Local => self
                .locals
                .last()
                .ok_or_else(|| Error::InvalidFrame("access to empty local frame stack".to_string())),
        }
    }

    /// `DEFVAR`: declare `name` as uninitialized in the named frame.
    pub fn define(&mut self, tag: FrameTag, name: &str) -> Result<()> {
        self.frame_mut(tag)?.define(name)
    }

    /// Read a variable's current value. Errors if the frame is invalid, the
    /// variable was never declared, or it was declared but never assigned.
    pub fn read(&self, tag: FrameTag, name: &str) -> Result<&Value> {
        let var = self
            .frame(tag)?
            .get(name)
            .ok_or_else(|| Error::UndefinedVariable(name.to_string()))?;
        var.get()
            .ok_or_else(|| Error::EmptyOrUninitialized(format!("read of uninitialized variable {}", name)))
    }

    /// Assign a value to a previously-declared variable.
    pub fn write(&mut self, tag: FrameTag, name: &str, value: Value) -> Result<()> {
        let var = self
            .frame_mut(tag)?
            .get_mut(name)
            .ok_or_else(|| Error::UndefinedVariable(name.to_string()))?;
        var.set(value);
        Ok(())
    }

    /// `TYPE`'s special resolution rule: an uninitialized (but declared)
    /// variable yields `""` instead of erroring. An undeclared variable is
    /// still an error.
    pub fn type_name_of(&self, tag: FrameTag, name: &str) -> Result<&'static str> {
        let var = self
            .frame(tag)?
            .get(name)
            .ok_or_else(|| Error::UndefinedVariable(name.to_string()))?;
        Ok(match var.get() {
            Some(value) => value.type_name(),
            None => "",
        })
    }

    /// Number of variables declared in the global frame, for `BREAK`'s
    /// diagnostic line.
    pub fn global_var_count(&self) -> usize {
        self.global.vars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undeclared_variable_is_undefined_variable_error() {
        let frames = FrameSet::new();
        let err = frames.read(FrameTag::Global, "x").unwrap_err();
        assert_eq!(err.exit_code(), Some(54));
    }

    #[test]
    fn declared_but_unassigned_variable_is_uninitialized_error() {
        let mut frames = FrameSet::new();
        frames.define(FrameTag::Global, "x").unwrap();
        let err = frames.read(FrameTag::Global, "x").unwrap_err();
        assert_eq!(err.exit_code(), Some(56));
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut frames = FrameSet::new();
        frames.define(FrameTag::Global, "x").unwrap();
        frames.write(FrameTag::Global, "x", Value::Int(5)).unwrap();
        assert_eq!(frames.read(FrameTag::Global, "x").unwrap(), &Value::Int(5));
    }

    #[test]
    fn temporary_frame_access_without_createframe_fails() {
        let mut frames = FrameSet::new();
        let err = frames.define(FrameTag::Temporary, "x").unwrap_err();
        assert_eq!(err.exit_code(), Some(55));
    }

    #[test]
    fn pushframe_without_createframe_fails() {
        let mut frames = FrameSet::new();
        let err = frames.push_frame().unwrap_err();
        assert_eq!(err.exit_code(), Some(55));
    }

    #[test]
    fn popframe_on_empty_stack_fails() {
        let mut frames = FrameSet::new();
        let err = frames.pop_frame().unwrap_err();
        assert_eq!(err.exit_code(), Some(55));
    }

    #[test]
    fn push_then_pop_frame_round_trips() {
        let mut frames = FrameSet::new();
        frames.create_frame();
        frames.define(FrameTag::Temporary, "x").unwrap();
        frames.write(FrameTag::Temporary, "x", Value::Int(1)).unwrap();
        frames.push_frame().unwrap();
        // TF is now gone.
        assert!(frames.define(FrameTag::Temporary, "y").is_err());
        frames.pop_frame().unwrap();
        assert_eq!(frames.read(FrameTag::Temporary, "x").unwrap(), &Value::Int(1));
    }

    #[test]
    fn redefine_appends_new_entry_but_lookup_finds_first() {
        let mut frames = FrameSet::new();
        frames.define(FrameTag::Global, "x").unwrap();
        frames.write(FrameTag::Global, "x", Value::Int(1)).unwrap();
        frames.define(FrameTag::Global, "x").unwrap();
        assert_eq!(frames.read(FrameTag::Global, "x").unwrap(), &Value::Int(1));
    }

    #[test]
    fn local_frames_nest_independently() {
        let mut frames = FrameSet::new();
        frames.create_frame();
        frames.define(FrameTag::Temporary, "x").unwrap();
        frames.write(FrameTag::Temporary, "x", Value::Int(1)).unwrap();
        frames.push_frame().unwrap();

        frames.create_frame();
        frames.define(FrameTag::Temporary, "x").unwrap();
        frames.write(FrameTag::Temporary, "x", Value::Int(2)).unwrap();
        frames.push_frame().unwrap();

        assert_eq!(frames.read(FrameTag::Local, "x").unwrap(), &Value::Int(2));
        frames.pop_frame().unwrap();
        assert_eq!(frames.read(FrameTag::Local, "x").unwrap(), &Value::Int(1));
    }
}
