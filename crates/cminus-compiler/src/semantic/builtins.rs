//! Runtime I/O functions every program can call without declaring them.

use cminus_ast::{FunctionDecl, Ident, ScalarDecl, VarDecl};
use cminus_core::{DataType, Span};

use crate::scope::{Definition, ScopeId, SymbolEntry, SymbolTable};

const NO_SPAN: Span = Span { line: 0, col: 0 };

static OUTPUT_PARAMS: [VarDecl<'static>; 1] = [VarDecl::Scalar(ScalarDecl {
    ty: DataType::Int,
    name: Ident {
        name: "value",
        span: NO_SPAN,
    },
    span: NO_SPAN,
})];

/// `int input(void)`
static INPUT: FunctionDecl<'static> = FunctionDecl {
    result: DataType::Int,
    name: Ident {
        name: "input",
        span: NO_SPAN,
    },
    params: &[],
    body: None,
    span: NO_SPAN,
};

/// `void output(int value)`
static OUTPUT: FunctionDecl<'static> = FunctionDecl {
    result: DataType::Void,
    name: Ident {
        name: "output",
        span: NO_SPAN,
    },
    params: &OUTPUT_PARAMS,
    body: None,
    span: NO_SPAN,
};

/// Enter the built-in functions into the global scope.
pub(super) fn declare<'ast>(table: &mut SymbolTable<'ast>) {
    for func in [&INPUT, &OUTPUT] {
        let mut entry = SymbolEntry::new(func.name.name, Definition::Function(func), 0, func.result);
        entry.builtin = true;
        table.insert(&ScopeId::Global, entry);
    }
}
