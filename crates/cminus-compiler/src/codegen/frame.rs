//! Storage allocation for globals, parameters, locals and temporaries.
//!
//! Both areas grow toward lower addresses. Globals are addressed from the
//! global pointer starting at offset 0. Frame slots are addressed from the
//! frame pointer starting at offset -2, below the saved frame pointer and
//! the return address.
//!
//! An array occupies `size` consecutive slots and its recorded offset is the
//! highest of them; element `i` lives at `offset - i`. An array parameter
//! occupies one slot holding the address of the caller's array.

use cminus_ast::VarDecl;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::tm::{FIRST_LOCAL_OFFSET, FP, GP};

// ============================================================================
// Types
// ============================================================================

/// Which base register a slot is addressed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Global,
    Frame,
}

/// What a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// A single value
    Scalar,
    /// The first element of an array stored in place
    Array,
    /// The address of an array stored elsewhere (array parameter)
    ArrayRef,
}

/// A resolved storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: i32,
    pub class: StorageClass,
    pub kind: SlotKind,
}

impl Slot {
    pub fn base_register(&self) -> u8 {
        match self.class {
            StorageClass::Global => GP,
            StorageClass::Frame => FP,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, SlotKind::Array | SlotKind::ArrayRef)
    }
}

/// Why a declaration got no storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("{0} already has storage in this block")]
    Duplicate(String),

    #[error("array {name} of {size} words does not fit in the address space")]
    TooLarge { name: String, size: u32 },
}

/// Slot kind and number of words for a declaration.
///
/// An array of size 0 takes no words.
fn layout(var: &VarDecl<'_>) -> Result<(SlotKind, i32), AllocError> {
    match var {
        VarDecl::Scalar(_) => Ok((SlotKind::Scalar, 1)),
        VarDecl::Array(array) => match array.size {
            Some(size) => i32::try_from(size)
                .map(|words| (SlotKind::Array, words))
                .map_err(|_| too_large(var, size)),
            None => Ok((SlotKind::ArrayRef, 1)),
        },
    }
}

fn too_large(var: &VarDecl<'_>, size: u32) -> AllocError {
    AllocError::TooLarge {
        name: var.name().to_string(),
        size,
    }
}

/// Reserve `words` below `next_offset`, returning the new next offset.
fn reserve(var: &VarDecl<'_>, next_offset: i32, words: i32) -> Result<i32, AllocError> {
    next_offset
        .checked_sub(words)
        .ok_or_else(|| too_large(var, words.unsigned_abs()))
}

// ============================================================================
// GlobalArea
// ============================================================================

/// Addresses of global variables.
#[derive(Debug)]
pub struct GlobalArea {
    slots: FxHashMap<String, Slot>,
    next_offset: i32,
}

impl Default for GlobalArea {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalArea {
    pub fn new() -> Self {
        Self {
            slots: FxHashMap::default(),
            next_offset: 0,
        }
    }

    /// Allocate storage for a global.
    ///
    /// A name that already has storage keeps its first declaration.
    pub fn declare(&mut self, var: &VarDecl<'_>) -> Result<Slot, AllocError> {
        if self.slots.contains_key(var.name()) {
            return Err(AllocError::Duplicate(var.name().to_string()));
        }
        let (kind, words) = layout(var)?;
        let slot = Slot {
            offset: self.next_offset,
            class: StorageClass::Global,
            kind,
        };
        self.next_offset = reserve(var, self.next_offset, words)?;
        self.slots.insert(var.name().to_string(), slot);
        Ok(slot)
    }

    pub fn lookup(&self, name: &str) -> Option<Slot> {
        self.slots.get(name).copied()
    }

    /// First offset below every global.
    pub fn next_offset(&self) -> i32 {
        self.next_offset
    }
}

// ============================================================================
// Frame
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct FrameVar {
    slot: Slot,
    depth: u32,
}

/// Storage of the function being generated.
///
/// Nested blocks may shadow outer names; leaving a block restores them.
/// Offsets are never reused within a function.
#[derive(Debug)]
pub struct Frame {
    variables: FxHashMap<String, FrameVar>,
    /// Current block depth (0 = parameters)
    depth: u32,
    /// `(shadowing_depth, name, old_var)`
    shadowed: Vec<(u32, String, FrameVar)>,
    /// Next unallocated offset
    next_offset: i32,
    /// Temporaries currently claimed below `next_offset`
    temps: i32,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    pub fn new() -> Self {
        Self {
            variables: FxHashMap::default(),
            depth: 0,
            shadowed: Vec::new(),
            next_offset: FIRST_LOCAL_OFFSET,
            temps: 0,
        }
    }

    // ==========================================================================
    // Blocks
    // ==========================================================================

    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave a block, forgetting its names and restoring shadowed ones.
    pub fn pop_scope(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.variables.retain(|_, var| var.depth < self.depth);
        while let Some((shadowing_depth, _, _)) = self.shadowed.last() {
            if *shadowing_depth != self.depth {
                break;
            }
            if let Some((_, name, var)) = self.shadowed.pop() {
                self.variables.insert(name, var);
            }
        }
        self.depth -= 1;
    }

    // ==========================================================================
    // Variables
    // ==========================================================================

    /// Allocate storage for a parameter or local in the current block.
    ///
    /// A name already declared in this block keeps its first slot.
    pub fn declare(&mut self, var: &VarDecl<'_>) -> Result<Slot, AllocError> {
        debug_assert_eq!(self.temps, 0, "locals are declared between expressions");
        let name = var.name();
        let existing = self.variables.get(name).copied();
        if existing.is_some_and(|prev| prev.depth == self.depth) {
            return Err(AllocError::Duplicate(name.to_string()));
        }

        let (kind, words) = layout(var)?;
        let next_offset = reserve(var, self.next_offset, words)?;
        if let Some(existing) = existing {
            self.shadowed.push((self.depth, name.to_string(), existing));
        }
        let slot = Slot {
            offset: self.next_offset,
            class: StorageClass::Frame,
            kind,
        };
        self.next_offset = next_offset;
        self.variables.insert(
            name.to_string(),
            FrameVar {
                slot,
                depth: self.depth,
            },
        );
        Ok(slot)
    }

    pub fn lookup(&self, name: &str) -> Option<Slot> {
        self.variables.get(name).map(|var| var.slot)
    }

    // ==========================================================================
    // Temporaries
    // ==========================================================================

    /// Claim the next temporary slot below the locals.
    pub fn claim_temp(&mut self) -> i32 {
        let offset = self.next_offset - self.temps;
        self.temps += 1;
        offset
    }

    /// Release the most recently claimed temporary.
    pub fn release_temp(&mut self) {
        debug_assert!(self.temps > 0, "temporary released twice");
        self.temps = (self.temps - 1).max(0);
    }

    pub fn temp_depth(&self) -> i32 {
        self.temps
    }

    /// First offset not used by a variable or a live temporary.
    ///
    /// A callee's frame starts here.
    pub fn extent(&self) -> i32 {
        self.next_offset - self.temps
    }
}
