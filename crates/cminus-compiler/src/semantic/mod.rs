//! Scope and type resolution.
//!
//! [`SemanticAnalyzer`] walks a [`Program`] once, building the scoped
//! [`SymbolTable`], checking types and reporting every problem it finds as a
//! non-fatal diagnostic. While walking it writes a human-readable trace of
//! scope entry, exit and contents:
//!
//! ```text
//! Entering the global scope:
//!     Entering the scope for function main:
//!         x: int x
//!     Leaving the function scope
//!     main: int main(void)
//! Leaving the global scope
//! ```
//!
//! Expression types are computed during the same walk. An expression whose
//! type cannot be determined yields `None`, which suppresses follow-on
//! errors about the same subtree.

mod builtins;
mod call;
mod decl;
mod expr;

use cminus_ast::{FunctionDecl, Program};
use cminus_core::{CompilationError, Diagnostics, Span};
use log::debug;

use crate::scope::{ScopeId, SymbolEntry, SymbolTable};

// ============================================================================
// Configuration
// ============================================================================

/// How names are resolved from inside nested scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPolicy {
    /// Search the innermost scope, then the global scope.
    ///
    /// Names declared in an enclosing function or block scope are not
    /// visible from a nested block.
    #[default]
    CurrentThenGlobal,
    /// Search every active scope from innermost to global.
    Lexical,
}

/// Options for [`SemanticAnalyzer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalyzerConfig {
    pub lookup: LookupPolicy,
    /// Also report names declared twice at global scope.
    pub diagnose_global_redeclaration: bool,
}

/// Result of analyzing a program.
#[derive(Debug)]
pub struct Analysis<'ast> {
    /// Global and function scopes that outlived the walk
    pub symbols: SymbolTable<'ast>,
    pub diagnostics: Diagnostics,
    /// Scope trace, one line per event, indented four spaces per level
    pub trace: String,
}

impl<'ast> Analysis<'ast> {
    /// Whether analysis found no errors.
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

// ============================================================================
// SemanticAnalyzer
// ============================================================================

/// Builds the symbol table and type checks a program.
pub struct SemanticAnalyzer<'ast> {
    config: AnalyzerConfig,
    table: SymbolTable<'ast>,
    /// Active scopes, global at the bottom
    scopes: Vec<ScopeId>,
    /// Id of the innermost active block; sibling blocks reuse ids
    block_depth: u32,
    /// Trace indentation level
    indent: usize,
    current_function: Option<&'ast FunctionDecl<'ast>>,
    diagnostics: Diagnostics,
    trace: String,
}

impl<'ast> SemanticAnalyzer<'ast> {
    pub fn new(config: AnalyzerConfig) -> Self {
        let mut table = SymbolTable::new();
        builtins::declare(&mut table);
        Self {
            config,
            table,
            scopes: vec![ScopeId::Global],
            block_depth: 0,
            indent: 1,
            current_function: None,
            diagnostics: Diagnostics::new(),
            trace: String::new(),
        }
    }

    /// Analyze a whole program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn analyze(mut self, program: &Program<'ast>) -> Analysis<'ast> {
        debug!("analyzing {} top-level declarations", program.decls().len());

        self.line(0, "Entering the global scope:");
        for decl in program.decls() {
            self.visit_decl(decl);
        }
        self.check_missing_definitions();
        self.dump_scope(1);
        self.line(0, "Leaving the global scope");

        debug!("analysis finished with {} error(s)", self.diagnostics.len());
        Analysis {
            symbols: self.table,
            diagnostics: self.diagnostics,
            trace: self.trace,
        }
    }

    // ==========================================================================
    // Scopes
    // ==========================================================================

    fn current_scope(&self) -> ScopeId {
        self.scopes.last().cloned().unwrap_or(ScopeId::Global)
    }

    /// Nesting level of the current scope (0 = global).
    fn level(&self) -> u32 {
        self.scopes.len().saturating_sub(1) as u32
    }

    fn push_scope(&mut self, scope: ScopeId) {
        debug!("entering scope {}", scope);
        self.scopes.push(scope);
    }

    fn pop_scope(&mut self) -> Option<ScopeId> {
        // The global scope is never popped.
        if self.scopes.len() <= 1 {
            return None;
        }
        let scope = self.scopes.pop();
        if let Some(scope) = &scope {
            debug!("leaving scope {}", scope);
        }
        scope
    }

    /// Open the synthetic scope of an `if` or `while` body.
    fn enter_block(&mut self) {
        self.line(self.indent, "Entering a new block:");
        self.indent += 1;
        self.block_depth += 1;
        self.push_scope(ScopeId::Block(self.block_depth));
    }

    /// Close the innermost block scope, discarding its entries.
    fn leave_block(&mut self) {
        self.dump_scope(self.indent);
        if let Some(scope) = self.pop_scope() {
            self.table.remove_scope(&scope);
        }
        self.block_depth = self.block_depth.saturating_sub(1);
        self.indent = self.indent.saturating_sub(1);
        self.line(self.indent, "Leaving the block");
    }

    /// Where `name` is already declared, if declaring it again in the
    /// current scope is a redeclaration.
    fn redeclared(&self, name: &str) -> Option<Span> {
        let scope = self.current_scope();
        if scope == ScopeId::Global && !self.config.diagnose_global_redeclaration {
            return None;
        }
        self.table.lookup_in(&scope, name).map(SymbolEntry::span)
    }

    /// Resolve a name according to the configured lookup policy.
    fn resolve(&self, name: &str) -> Option<&SymbolEntry<'ast>> {
        match self.config.lookup {
            LookupPolicy::CurrentThenGlobal => self
                .table
                .lookup_in(&self.current_scope(), name)
                .or_else(|| self.table.lookup_in(&ScopeId::Global, name)),
            LookupPolicy::Lexical => self
                .scopes
                .iter()
                .rev()
                .find_map(|scope| self.table.lookup_in(scope, name)),
        }
    }

    // ==========================================================================
    // Output
    // ==========================================================================

    fn report(&mut self, error: CompilationError) {
        debug!("{}", error.render());
        self.diagnostics.push(error);
    }

    fn line(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.trace.push_str("    ");
        }
        self.trace.push_str(text);
        self.trace.push('\n');
    }

    /// Trace the entries of the current scope.
    fn dump_scope(&mut self, indent: usize) {
        let lines: Vec<String> = self
            .table
            .entries(&self.current_scope())
            .iter()
            .filter(|entry| !entry.builtin)
            .map(|entry| format!("{}: {}", entry.name, entry.definition))
            .collect();
        for line in lines {
            self.line(indent, &line);
        }
    }
}
