//! Scoped symbol table for semantic analysis.
//!
//! Symbols are stored per scope (not flattened): each [`ScopeId`] maps to
//! the insertion-ordered entries declared directly in it. The analyzer keeps
//! the stack of active scope ids; this module only stores and searches.

use std::fmt;

use cminus_ast::{FunctionDecl, VarDecl};
use cminus_core::{DataType, Span};
use rustc_hash::FxHashMap;

// ============================================================================
// Types
// ============================================================================

/// Identifies one scope in the symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeId {
    /// Program-wide scope holding globals and functions
    Global,
    /// Parameters and top-level locals of a function
    Function(String),
    /// Synthetic scope of an `if` or `while` block
    Block(u32),
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeId::Global => f.write_str("global"),
            ScopeId::Function(name) => f.write_str(name),
            ScopeId::Block(id) => write!(f, "{}", id),
        }
    }
}

/// The tree node that declared a symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Definition<'ast> {
    Var(&'ast VarDecl<'ast>),
    Function(&'ast FunctionDecl<'ast>),
}

impl<'ast> Definition<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Definition::Var(var) => var.span(),
            Definition::Function(func) => func.span,
        }
    }

    pub fn as_function(&self) -> Option<&'ast FunctionDecl<'ast>> {
        match self {
            Definition::Function(func) => Some(*func),
            Definition::Var(_) => None,
        }
    }
}

impl fmt::Display for Definition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Definition::Var(var) => write!(f, "{}", var),
            Definition::Function(func) => write!(f, "{}", func),
        }
    }
}

/// One declared name.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry<'ast> {
    /// Declared name
    pub name: String,
    /// Declaring node
    pub definition: Definition<'ast>,
    /// Nesting level of the declaring scope (0 = global)
    pub level: u32,
    /// Type after normalization (a `void` variable is recorded as `int`)
    pub data_type: DataType,
    /// Whether `data_type` differs from the declared type
    pub normalized: bool,
    /// Runtime function supplied by the environment (`input`, `output`)
    pub builtin: bool,
}

impl<'ast> SymbolEntry<'ast> {
    pub fn new(name: &str, definition: Definition<'ast>, level: u32, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            definition,
            level,
            data_type,
            normalized: false,
            builtin: false,
        }
    }

    /// Source position of the declaration.
    pub fn span(&self) -> Span {
        self.definition.span()
    }

    /// Whether the symbol names an array (sized or parameter).
    pub fn is_array(&self) -> bool {
        matches!(self.definition, Definition::Var(var) if var.is_array())
    }

    pub fn is_function(&self) -> bool {
        matches!(self.definition, Definition::Function(_))
    }
}

// ============================================================================
// SymbolTable
// ============================================================================

/// Mapping from scope id to the entries declared directly in that scope.
#[derive(Debug, Default)]
pub struct SymbolTable<'ast> {
    scopes: FxHashMap<ScopeId, Vec<SymbolEntry<'ast>>>,
}

impl<'ast> SymbolTable<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to a scope's list.
    pub fn insert(&mut self, scope: &ScopeId, entry: SymbolEntry<'ast>) {
        self.scopes.entry(scope.clone()).or_default().push(entry);
    }

    /// First entry named `name` declared directly in `scope`.
    pub fn lookup_in(&self, scope: &ScopeId, name: &str) -> Option<&SymbolEntry<'ast>> {
        self.scopes
            .get(scope)
            .and_then(|entries| entries.iter().find(|entry| entry.name == name))
    }

    /// Remove the entries named `name` from `scope`.
    ///
    /// Returns the number of entries removed.
    pub fn remove_from(&mut self, scope: &ScopeId, name: &str) -> usize {
        let Some(entries) = self.scopes.get_mut(scope) else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|entry| entry.name != name);
        before - entries.len()
    }

    /// Start `scope` with an empty list, discarding any previous entries.
    pub fn open_scope(&mut self, scope: &ScopeId) {
        self.scopes.insert(scope.clone(), Vec::new());
    }

    /// Drop a whole scope.
    pub fn remove_scope(&mut self, scope: &ScopeId) {
        self.scopes.remove(scope);
    }

    /// Entries declared directly in `scope`, in declaration order.
    pub fn entries(&self, scope: &ScopeId) -> &[SymbolEntry<'ast>] {
        self.scopes.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the table currently holds a list for `scope`.
    pub fn contains_scope(&self, scope: &ScopeId) -> bool {
        self.scopes.contains_key(scope)
    }
}
