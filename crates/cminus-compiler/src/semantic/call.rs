//! Call checking: callee lookup, arity and positional argument types.

use cminus_ast::{CallExpr, Expr};
use cminus_core::{CompilationError, DataType};

use super::SemanticAnalyzer;
use crate::scope::ScopeId;

impl<'ast> SemanticAnalyzer<'ast> {
    /// Check a call and return the callee's result type.
    ///
    /// Once the callee is found the call has its result type, even when the
    /// arguments are wrong.
    pub(super) fn check_call(&mut self, call: &'ast CallExpr<'ast>) -> Option<DataType> {
        let arg_types: Vec<Option<DataType>> =
            call.args.iter().map(|arg| self.check_expr(arg)).collect();

        let name = call.callee.name;
        let Some(func) = self
            .table
            .lookup_in(&ScopeId::Global, name)
            .and_then(|entry| entry.definition.as_function())
        else {
            self.report(CompilationError::UndefinedFunction {
                name: name.to_string(),
                span: call.span,
            });
            return None;
        };

        if call.args.len() != func.params.len() {
            self.report(CompilationError::ArgumentCountMismatch {
                function: name.to_string(),
                expected: func.params.len(),
                found: call.args.len(),
                span: call.span,
            });
            return Some(func.result);
        }

        for (i, ((arg, found), param)) in call
            .args
            .iter()
            .zip(arg_types)
            .zip(func.params)
            .enumerate()
        {
            let Some(found) = found else {
                continue;
            };
            let passes_array = self.is_array_argument(arg);
            // Parameters declared void were recorded as int.
            let expected = match param.declared_type() {
                DataType::Void => DataType::Int,
                ty => ty,
            };
            if passes_array != param.is_array() || found != expected {
                self.report(CompilationError::ArgumentTypeMismatch {
                    function: name.to_string(),
                    position: i + 1,
                    expected: describe(expected, param.is_array()),
                    found: describe(found, passes_array),
                    span: arg.span(),
                });
            }
        }

        Some(func.result)
    }

    /// Whether an argument is a bare array name, passed by address.
    fn is_array_argument(&self, arg: &Expr<'ast>) -> bool {
        match arg {
            Expr::Var(var) if !var.is_indexed() => self
                .resolve(var.name.name)
                .is_some_and(|entry| entry.is_array()),
            _ => false,
        }
    }
}

fn describe(ty: DataType, array: bool) -> String {
    if array {
        format!("{}[]", ty)
    } else {
        ty.to_string()
    }
}
