//! Append-only instruction stream with jump fixups.
//!
//! Forward jumps reserve an instruction slot and hand back a [`JumpLabel`];
//! the slot is filled in when the label is bound to a target. Calls to
//! functions whose entry is not emitted yet bind to a symbol instead and are
//! resolved by [`InstructionStream::link`].
//!
//! Instructions are appended in address order, so the emission frontier is
//! simply the number of slots. A jump can never be bound past it.

use std::fmt;

use log::trace;
use thiserror::Error;

use super::opcode::{Instruction, OpCode};
use super::{AC, PC};

/// A reserved jump slot awaiting its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpLabel(pub(crate) usize);

impl JumpLabel {
    /// Get the instruction address of the reserved slot.
    pub fn address(&self) -> usize {
        self.0
    }
}

/// How a reserved jump transfers control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    /// `LDA PC,d(PC)`
    Always,
    /// `JEQ AC,d(PC)`, taken when the accumulator is zero
    IfZero,
}

/// Errors from binding or linking jumps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("cannot bind jump at {slot} to {target}: past emission frontier {frontier}")]
    BeyondFrontier {
        slot: usize,
        target: usize,
        frontier: usize,
    },

    #[error("jump at {slot} is already bound")]
    AlreadyBound { slot: usize },

    #[error("instruction at {slot} is not a reserved jump")]
    NotReserved { slot: usize },

    #[error("jump at {slot} was never bound")]
    Unbound { slot: usize },

    #[error("jump at {slot} targets function {name} which has no code")]
    UnknownSymbol { slot: usize, name: String },
}

#[derive(Debug, Clone)]
enum Target {
    Location(usize),
    Symbol(String),
}

#[derive(Debug, Clone)]
enum Slot {
    Emitted(Instruction),
    Reserved {
        kind: JumpKind,
        comment: String,
        target: Option<Target>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Comment(String),
    Code(usize),
}

/// Builds a TM program one instruction at a time.
#[derive(Debug)]
pub struct InstructionStream {
    slots: Vec<Slot>,
    lines: Vec<Line>,
    emit_comments: bool,
}

impl Default for InstructionStream {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionStream {
    /// Create an empty stream that keeps comment lines.
    pub fn new() -> Self {
        Self::with_comments(true)
    }

    pub fn with_comments(emit_comments: bool) -> Self {
        Self {
            slots: Vec::new(),
            lines: Vec::new(),
            emit_comments,
        }
    }

    /// Address the next instruction will get.
    pub fn current_offset(&self) -> usize {
        self.slots.len()
    }

    /// Append a listing comment. Dropped when comments are disabled.
    pub fn comment(&mut self, text: impl Into<String>) {
        if self.emit_comments {
            self.lines.push(Line::Comment(text.into()));
        }
    }

    // ==========================================================================
    // Emission
    // ==========================================================================

    /// Append an instruction, returning its address.
    pub fn emit(&mut self, instr: Instruction) -> usize {
        let loc = self.slots.len();
        trace!("{:3}: {}", loc, instr);
        self.slots.push(Slot::Emitted(instr));
        self.lines.push(Line::Code(loc));
        loc
    }

    pub fn emit_ro(&mut self, op: OpCode, r: u8, s: u8, t: u8, comment: &str) -> usize {
        self.emit(Instruction::ro(op, r, s, t, comment))
    }

    pub fn emit_rm(&mut self, op: OpCode, r: u8, d: i32, s: u8, comment: &str) -> usize {
        self.emit(Instruction::rm(op, r, d, s, comment))
    }

    /// Emit an RM instruction addressing `target` relative to the PC.
    pub fn emit_rm_abs(&mut self, op: OpCode, r: u8, target: usize, comment: &str) -> usize {
        let d = pc_relative(self.current_offset(), target);
        self.emit_rm(op, r, d, PC, comment)
    }

    // ==========================================================================
    // Jumps
    // ==========================================================================

    /// Reserve a slot for a forward jump.
    ///
    /// The returned label must be bound with [`patch_jump`](Self::patch_jump)
    /// or [`bind_jump`](Self::bind_jump) before linking.
    pub fn emit_jump(&mut self, kind: JumpKind, comment: &str) -> JumpLabel {
        self.reserve(kind, comment, None)
    }

    /// Reserve an unconditional jump to the entry of function `name`.
    pub fn emit_call_jump(&mut self, name: &str, comment: &str) -> JumpLabel {
        self.reserve(JumpKind::Always, comment, Some(Target::Symbol(name.to_string())))
    }

    fn reserve(&mut self, kind: JumpKind, comment: &str, target: Option<Target>) -> JumpLabel {
        let loc = self.slots.len();
        trace!("{:3}: <reserved {:?} jump>", loc, kind);
        self.slots.push(Slot::Reserved {
            kind,
            comment: comment.to_string(),
            target,
        });
        self.lines.push(Line::Code(loc));
        JumpLabel(loc)
    }

    /// Bind a jump to the current emission frontier.
    pub fn patch_jump(&mut self, label: JumpLabel) -> Result<(), PatchError> {
        self.bind_jump(label, self.current_offset())
    }

    /// Bind a jump to an already known location.
    pub fn bind_jump(&mut self, label: JumpLabel, target: usize) -> Result<(), PatchError> {
        let frontier = self.current_offset();
        if target > frontier {
            return Err(PatchError::BeyondFrontier {
                slot: label.0,
                target,
                frontier,
            });
        }
        match self.slots.get_mut(label.0) {
            Some(Slot::Reserved { target: bound, .. }) => {
                if bound.is_some() {
                    return Err(PatchError::AlreadyBound { slot: label.0 });
                }
                *bound = Some(Target::Location(target));
                Ok(())
            }
            _ => Err(PatchError::NotReserved { slot: label.0 }),
        }
    }

    // ==========================================================================
    // Linking
    // ==========================================================================

    /// Resolve every reserved slot and produce the final listing.
    ///
    /// `resolve` maps a function name to its entry address. Slots that cannot
    /// be resolved become `HALT` and are reported.
    pub fn link(self, resolve: impl Fn(&str) -> Option<usize>) -> (Listing, Vec<PatchError>) {
        let mut errors = Vec::new();
        let mut code = Vec::with_capacity(self.slots.len());

        for (loc, slot) in self.slots.into_iter().enumerate() {
            let instr = match slot {
                Slot::Emitted(instr) => instr,
                Slot::Reserved {
                    kind,
                    comment,
                    target,
                } => {
                    let resolved = match target {
                        Some(Target::Location(addr)) => Ok(addr),
                        Some(Target::Symbol(name)) => {
                            resolve(&name).ok_or(PatchError::UnknownSymbol { slot: loc, name })
                        }
                        None => Err(PatchError::Unbound { slot: loc }),
                    };
                    match resolved {
                        Ok(addr) => jump_instruction(kind, pc_relative(loc, addr), comment),
                        Err(err) => {
                            errors.push(err);
                            Instruction::ro(OpCode::Halt, 0, 0, 0, "unresolved jump")
                        }
                    }
                }
            };
            code.push(instr);
        }

        let lines = self
            .lines
            .into_iter()
            .map(|line| match line {
                Line::Comment(text) => ListingLine::Comment(text),
                Line::Code(loc) => ListingLine::Code(loc),
            })
            .collect();

        (Listing { lines, code }, errors)
    }
}

/// Displacement from the instruction at `loc` to `target`, relative to the
/// already incremented PC.
fn pc_relative(loc: usize, target: usize) -> i32 {
    target as i32 - (loc as i32 + 1)
}

fn jump_instruction(kind: JumpKind, d: i32, comment: String) -> Instruction {
    match kind {
        JumpKind::Always => Instruction::rm(OpCode::Lda, PC, d, PC, comment),
        JumpKind::IfZero => Instruction::rm(OpCode::Jeq, AC, d, PC, comment),
    }
}

// ============================================================================
// Listing
// ============================================================================

/// One line of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingLine {
    Comment(String),
    /// Address of an instruction in [`Listing::code`]
    Code(usize),
}

/// A linked TM program with its interleaved comments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    lines: Vec<ListingLine>,
    code: Vec<Instruction>,
}

impl Listing {
    /// Instructions indexed by address.
    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    pub fn get(&self, address: usize) -> Option<&Instruction> {
        self.code.get(address)
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn lines(&self) -> &[ListingLine] {
        &self.lines
    }

    /// Comment texts in emission order.
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            ListingLine::Comment(text) => Some(text.as_str()),
            ListingLine::Code(_) => None,
        })
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                ListingLine::Comment(text) => writeln!(f, "* {}", text)?,
                ListingLine::Code(loc) => {
                    if let Some(instr) = self.code.get(*loc) {
                        writeln!(f, "{:3}: {}", loc, instr)?;
                    }
                }
            }
        }
        Ok(())
    }
}
