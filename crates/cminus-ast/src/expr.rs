//! Expression nodes.
//!
//! C-minus has no separate statement syntax tree: `if`, `while`, `return`
//! and compound blocks are expressions too, sequenced inside
//! [`CompoundExpr`].

use cminus_core::Span;

use crate::Ident;
use crate::decl::VarDecl;
use crate::ops::{BinaryOp, UnaryOp};

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Integer or boolean literal
    Literal(LiteralExpr),
    /// Variable reference, plain or indexed
    Var(VarRef<'ast>),
    /// Assignment
    Assign(&'ast AssignExpr<'ast>),
    /// Binary operation
    Binary(&'ast BinaryExpr<'ast>),
    /// Unary prefix operation
    Unary(&'ast UnaryExpr<'ast>),
    /// Function call
    Call(&'ast CallExpr<'ast>),
    /// Conditional
    If(&'ast IfExpr<'ast>),
    /// Loop
    While(&'ast WhileExpr<'ast>),
    /// Return from the enclosing function
    Return(&'ast ReturnExpr<'ast>),
    /// Block of local declarations followed by expressions
    Compound(&'ast CompoundExpr<'ast>),
    /// Empty expression (`;`)
    Empty(Span),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Var(e) => e.span,
            Self::Assign(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Call(e) => e.span,
            Self::If(e) => e.span,
            Self::While(e) => e.span,
            Self::Return(e) => e.span,
            Self::Compound(e) => e.span,
            Self::Empty(span) => *span,
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr {
    pub kind: LiteralKind,
    pub span: Span,
}

/// The kind of literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int(i64),
    Bool(bool),
}

/// A reference to a variable: `x` or `a[i]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarRef<'ast> {
    pub name: Ident<'ast>,
    /// Index expression for array element access
    pub index: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

impl<'ast> VarRef<'ast> {
    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }
}

/// `target = value`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignExpr<'ast> {
    pub target: VarRef<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

/// `left op right`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

/// `op operand`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

/// `callee(args...)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: Ident<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
}

/// `if (condition) then_branch else else_branch`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfExpr<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub then_branch: &'ast Expr<'ast>,
    pub else_branch: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

/// `while (condition) body`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileExpr<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub body: &'ast Expr<'ast>,
    pub span: Span,
}

/// `return value;` or `return;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnExpr<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

/// `{ locals... exprs... }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundExpr<'ast> {
    pub locals: &'ast [VarDecl<'ast>],
    pub body: &'ast [Expr<'ast>],
    pub span: Span,
}
