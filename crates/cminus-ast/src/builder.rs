//! Arena-backed construction helpers for program trees.
//!
//! The real parser lives outside this workspace; `AstBuilder` is how tests,
//! benches and tools assemble trees directly. Every node gets the builder's
//! current position, which [`AstBuilder::at`] moves.

use std::cell::Cell;

use bumpalo::Bump;
use cminus_core::{DataType, Span};

use crate::decl::{ArrayDecl, Decl, FunctionDecl, ScalarDecl, VarDecl};
use crate::expr::{
    AssignExpr, BinaryExpr, CallExpr, CompoundExpr, Expr, IfExpr, LiteralExpr, LiteralKind,
    ReturnExpr, UnaryExpr, VarRef, WhileExpr,
};
use crate::ops::{BinaryOp, UnaryOp};
use crate::{Ident, Program};

/// Builds tree nodes in a bump arena.
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    span: Cell<Span>,
}

impl<'ast> AstBuilder<'ast> {
    /// Create a builder positioned at line 1, column 1.
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            span: Cell::new(Span::new(1, 1)),
        }
    }

    /// Move the position given to subsequently built nodes.
    pub fn at(&self, line: u32, col: u32) -> &Self {
        self.span.set(Span::new(line, col));
        self
    }

    /// The position the next node will get.
    pub fn span(&self) -> Span {
        self.span.get()
    }

    fn alloc_expr(&self, expr: Expr<'ast>) -> &'ast Expr<'ast> {
        self.arena.alloc(expr)
    }

    fn ident(&self, name: &str) -> Ident<'ast> {
        Ident::new(self.arena.alloc_str(name), self.span())
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    pub fn scalar(&self, ty: DataType, name: &str) -> VarDecl<'ast> {
        VarDecl::Scalar(ScalarDecl {
            ty,
            name: self.ident(name),
            span: self.span(),
        })
    }

    pub fn array(&self, ty: DataType, name: &str, size: u32) -> VarDecl<'ast> {
        VarDecl::Array(ArrayDecl {
            ty,
            name: self.ident(name),
            size: Some(size),
            span: self.span(),
        })
    }

    /// An array parameter (`int a[]`).
    pub fn array_param(&self, ty: DataType, name: &str) -> VarDecl<'ast> {
        VarDecl::Array(ArrayDecl {
            ty,
            name: self.ident(name),
            size: None,
            span: self.span(),
        })
    }

    /// A top-level variable declaration.
    pub fn global(&self, var: VarDecl<'ast>) -> Decl<'ast> {
        Decl::Var(var)
    }

    pub fn function(
        &self,
        result: DataType,
        name: &str,
        params: &[VarDecl<'ast>],
        body: Option<Expr<'ast>>,
    ) -> Decl<'ast> {
        let body = body.map(|expr| self.alloc_expr(expr));
        Decl::Function(self.arena.alloc(FunctionDecl {
            result,
            name: self.ident(name),
            params: self.arena.alloc_slice_copy(params),
            body,
            span: self.span(),
        }))
    }

    /// A function declaration without a body.
    pub fn prototype(&self, result: DataType, name: &str, params: &[VarDecl<'ast>]) -> Decl<'ast> {
        self.function(result, name, params, None)
    }

    pub fn program(&self, decls: &[Decl<'ast>]) -> Program<'ast> {
        Program::new(self.arena.alloc_slice_copy(decls), Span::new(1, 1))
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    pub fn int(&self, value: i64) -> Expr<'ast> {
        Expr::Literal(LiteralExpr {
            kind: LiteralKind::Int(value),
            span: self.span(),
        })
    }

    pub fn bool_lit(&self, value: bool) -> Expr<'ast> {
        Expr::Literal(LiteralExpr {
            kind: LiteralKind::Bool(value),
            span: self.span(),
        })
    }

    /// A plain variable reference target.
    pub fn var_ref(&self, name: &str) -> VarRef<'ast> {
        VarRef {
            name: self.ident(name),
            index: None,
            span: self.span(),
        }
    }

    /// An indexed variable reference target.
    pub fn index_ref(&self, name: &str, index: Expr<'ast>) -> VarRef<'ast> {
        VarRef {
            name: self.ident(name),
            index: Some(self.alloc_expr(index)),
            span: self.span(),
        }
    }

    pub fn var(&self, name: &str) -> Expr<'ast> {
        Expr::Var(self.var_ref(name))
    }

    pub fn index(&self, name: &str, index: Expr<'ast>) -> Expr<'ast> {
        Expr::Var(self.index_ref(name, index))
    }

    pub fn assign(&self, target: VarRef<'ast>, value: Expr<'ast>) -> Expr<'ast> {
        Expr::Assign(self.arena.alloc(AssignExpr {
            target,
            value: self.arena.alloc(value),
            span: self.span(),
        }))
    }

    pub fn binary(&self, left: Expr<'ast>, op: BinaryOp, right: Expr<'ast>) -> Expr<'ast> {
        Expr::Binary(self.arena.alloc(BinaryExpr {
            left: self.arena.alloc(left),
            op,
            right: self.arena.alloc(right),
            span: self.span(),
        }))
    }

    pub fn neg(&self, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::Unary(self.arena.alloc(UnaryExpr {
            op: UnaryOp::Neg,
            operand: self.arena.alloc(operand),
            span: self.span(),
        }))
    }

    pub fn call(&self, callee: &str, args: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::Call(self.arena.alloc(CallExpr {
            callee: self.ident(callee),
            args: self.arena.alloc_slice_copy(args),
            span: self.span(),
        }))
    }

    pub fn if_(
        &self,
        condition: Expr<'ast>,
        then_branch: Expr<'ast>,
        else_branch: Option<Expr<'ast>>,
    ) -> Expr<'ast> {
        let else_branch = else_branch.map(|expr| self.alloc_expr(expr));
        Expr::If(self.arena.alloc(IfExpr {
            condition: self.arena.alloc(condition),
            then_branch: self.arena.alloc(then_branch),
            else_branch,
            span: self.span(),
        }))
    }

    pub fn while_(&self, condition: Expr<'ast>, body: Expr<'ast>) -> Expr<'ast> {
        Expr::While(self.arena.alloc(WhileExpr {
            condition: self.arena.alloc(condition),
            body: self.arena.alloc(body),
            span: self.span(),
        }))
    }

    pub fn ret(&self, value: Option<Expr<'ast>>) -> Expr<'ast> {
        let value = value.map(|expr| self.alloc_expr(expr));
        Expr::Return(self.arena.alloc(ReturnExpr {
            value,
            span: self.span(),
        }))
    }

    pub fn compound(&self, locals: &[VarDecl<'ast>], body: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::Compound(self.arena.alloc(CompoundExpr {
            locals: self.arena.alloc_slice_copy(locals),
            body: self.arena.alloc_slice_copy(body),
            span: self.span(),
        }))
    }

    pub fn empty(&self) -> Expr<'ast> {
        Expr::Empty(self.span())
    }
}
