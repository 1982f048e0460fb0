//! Declaration nodes: variables, arrays and functions.
//!
//! The `Display` impls print a one-line declaration summary
//! (`int x`, `int a[10]`, `int f(int x, bool b[])`), which the symbol table
//! dump uses.

use std::fmt;

use cminus_core::{DataType, Span};

use crate::Ident;
use crate::expr::Expr;

/// A top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decl<'ast> {
    /// Global variable or array
    Var(VarDecl<'ast>),
    /// Function definition or prototype
    Function(&'ast FunctionDecl<'ast>),
}

impl<'ast> Decl<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Decl::Var(var) => var.span(),
            Decl::Function(func) => func.span,
        }
    }
}

/// A variable declaration (global, local or parameter).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarDecl<'ast> {
    Scalar(ScalarDecl<'ast>),
    Array(ArrayDecl<'ast>),
}

impl<'ast> VarDecl<'ast> {
    pub fn name(&self) -> &'ast str {
        self.ident().name
    }

    pub fn ident(&self) -> Ident<'ast> {
        match self {
            VarDecl::Scalar(d) => d.name,
            VarDecl::Array(d) => d.name,
        }
    }

    /// The type written in the declaration, before any normalization.
    pub fn declared_type(&self) -> DataType {
        match self {
            VarDecl::Scalar(d) => d.ty,
            VarDecl::Array(d) => d.ty,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            VarDecl::Scalar(d) => d.span,
            VarDecl::Array(d) => d.span,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, VarDecl::Array(_))
    }
}

/// `int x;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarDecl<'ast> {
    pub ty: DataType,
    pub name: Ident<'ast>,
    pub span: Span,
}

/// `int a[10];` or, as a parameter, `int a[]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayDecl<'ast> {
    pub ty: DataType,
    pub name: Ident<'ast>,
    /// Number of elements; `None` for array parameters.
    pub size: Option<u32>,
    pub span: Span,
}

/// A function definition, or a prototype when `body` is `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDecl<'ast> {
    pub result: DataType,
    pub name: Ident<'ast>,
    pub params: &'ast [VarDecl<'ast>],
    pub body: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

impl<'ast> FunctionDecl<'ast> {
    pub fn is_prototype(&self) -> bool {
        self.body.is_none()
    }
}

impl fmt::Display for VarDecl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarDecl::Scalar(d) => write!(f, "{} {}", d.ty.keyword(), d.name.name),
            VarDecl::Array(d) => match d.size {
                Some(size) => write!(f, "{} {}[{}]", d.ty.keyword(), d.name.name, size),
                None => write!(f, "{} {}[]", d.ty.keyword(), d.name.name),
            },
        }
    }
}

impl fmt::Display for FunctionDecl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.result.keyword(), self.name.name)?;
        if self.params.is_empty() {
            f.write_str("void")?;
        }
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AstBuilder;
    use bumpalo::Bump;

    #[test]
    fn var_summaries() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);

        assert_eq!(b.scalar(DataType::Int, "x").to_string(), "int x");
        assert_eq!(b.array(DataType::Bool, "flags", 4).to_string(), "bool flags[4]");
        assert_eq!(b.array_param(DataType::Int, "a").to_string(), "int a[]");
    }

    #[test]
    fn function_summary() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);

        let params = [b.scalar(DataType::Int, "x"), b.array_param(DataType::Bool, "b")];
        let Decl::Function(f) = b.prototype(DataType::Int, "f", &params) else {
            panic!("expected a function");
        };
        assert_eq!(f.to_string(), "int f(int x, bool b[])");
        assert!(f.is_prototype());

        let Decl::Function(main) = b.prototype(DataType::Void, "main", &[]) else {
            panic!("expected a function");
        };
        assert_eq!(main.to_string(), "void main(void)");
    }
}
