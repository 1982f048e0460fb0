//! Program tree for the C-minus teaching language.
//!
//! The tree is produced by an external parser and is read-only to both
//! compiler passes. All nodes are allocated in a [`bumpalo::Bump`] arena and
//! remain valid for the lifetime of the arena.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use cminus_ast::AstBuilder;
//! use cminus_core::DataType;
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let body = b.compound(&[], &[b.ret(Some(b.int(0)))]);
//! let main = b.function(DataType::Int, "main", &[], Some(body));
//! let program = b.program(&[main]);
//! assert_eq!(program.decls().len(), 1);
//! ```

pub mod builder;
pub mod decl;
pub mod expr;
pub mod ops;

pub use builder::AstBuilder;
pub use decl::*;
pub use expr::*;
pub use ops::*;

use cminus_core::Span;

/// An identifier with its source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    /// The identifier text
    pub name: &'ast str,
    /// Source location
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// A whole program: the ordered top-level declarations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Program<'ast> {
    decls: &'ast [Decl<'ast>],
    span: Span,
}

impl<'ast> Program<'ast> {
    /// Create a program from its top-level declarations.
    pub fn new(decls: &'ast [Decl<'ast>], span: Span) -> Self {
        Self { decls, span }
    }

    /// Top-level declarations in source order.
    pub fn decls(&self) -> &'ast [Decl<'ast>] {
        self.decls
    }

    pub fn span(&self) -> Span {
        self.span
    }
}
