//! Expression and statement checking.

use cminus_ast::{BinaryExpr, Expr, LiteralKind, ReturnExpr, UnaryExpr, UnaryOp, VarRef};
use cminus_core::{CompilationError, DataType, Span};

use super::SemanticAnalyzer;

impl<'ast> SemanticAnalyzer<'ast> {
    /// Check an expression and compute its type.
    ///
    /// Returns `None` when the type is unknown (because of an earlier error)
    /// or when the expression is a statement with no value.
    pub(super) fn check_expr(&mut self, expr: &'ast Expr<'ast>) -> Option<DataType> {
        match expr {
            Expr::Literal(lit) => Some(match lit.kind {
                LiteralKind::Int(_) => DataType::Int,
                LiteralKind::Bool(_) => DataType::Bool,
            }),
            Expr::Var(var) => self.check_var(var),
            Expr::Assign(assign) => {
                let target = self.check_var(&assign.target);
                let value = self.check_expr(assign.value);
                if let (Some(expected), Some(found)) = (target, value)
                    && expected != found
                {
                    self.report(CompilationError::TypeMismatch {
                        expected,
                        found,
                        span: assign.span,
                    });
                }
                target
            }
            Expr::Binary(bin) => self.check_binary(bin),
            Expr::Unary(unary) => self.check_unary(unary),
            Expr::Call(call) => self.check_call(call),
            Expr::If(if_expr) => {
                self.check_test(if_expr.condition, if_expr.span);
                self.enter_block();
                self.check_expr(if_expr.then_branch);
                if let Some(else_branch) = if_expr.else_branch {
                    self.check_expr(else_branch);
                }
                self.leave_block();
                None
            }
            Expr::While(while_expr) => {
                self.check_test(while_expr.condition, while_expr.span);
                self.enter_block();
                self.check_expr(while_expr.body);
                self.leave_block();
                None
            }
            Expr::Return(ret) => {
                self.check_return(ret);
                None
            }
            Expr::Compound(compound) => {
                for local in compound.locals {
                    self.declare_var(local);
                }
                for expr in compound.body {
                    self.check_expr(expr);
                }
                None
            }
            Expr::Empty(_) => None,
        }
    }

    fn check_var(&mut self, var: &'ast VarRef<'ast>) -> Option<DataType> {
        let name = var.name.name;
        let resolved = self
            .resolve(name)
            .filter(|entry| !entry.is_function())
            .map(|entry| (entry.data_type, entry.is_array()));

        if let Some(index) = var.index
            && let Some(found) = self.check_expr(index)
            && found != DataType::Int
        {
            self.report(CompilationError::InvalidIndex {
                found,
                span: index.span(),
            });
        }

        let Some((data_type, is_array)) = resolved else {
            let name = name.to_string();
            self.report(if var.is_indexed() {
                CompilationError::UndefinedArray {
                    name,
                    span: var.span,
                }
            } else {
                CompilationError::UndefinedVariable {
                    name,
                    span: var.span,
                }
            });
            return None;
        };

        if var.is_indexed() && !is_array {
            self.report(CompilationError::NotAnArray {
                name: name.to_string(),
                span: var.span,
            });
        }
        Some(data_type)
    }

    fn check_binary(&mut self, bin: &'ast BinaryExpr<'ast>) -> Option<DataType> {
        let left = self.check_expr(bin.left);
        let right = self.check_expr(bin.right);
        let (left, right) = (left?, right?);

        if left != right {
            self.report(CompilationError::TypeMismatch {
                expected: left,
                found: right,
                span: bin.span,
            });
            return None;
        }

        if bin.op.is_arithmetic() {
            if left != DataType::Int {
                self.report(CompilationError::InvalidArithmetic {
                    found: left,
                    span: bin.span,
                });
                return None;
            }
            Some(DataType::Int)
        } else {
            if left == DataType::Void {
                self.report(CompilationError::TypeMismatch {
                    expected: DataType::Int,
                    found: left,
                    span: bin.span,
                });
                return None;
            }
            Some(DataType::Bool)
        }
    }

    fn check_unary(&mut self, unary: &'ast UnaryExpr<'ast>) -> Option<DataType> {
        let operand = self.check_expr(unary.operand)?;
        match unary.op {
            UnaryOp::Neg if operand != DataType::Int => {
                self.report(CompilationError::InvalidArithmetic {
                    found: operand,
                    span: unary.span,
                });
                None
            }
            UnaryOp::Neg => Some(DataType::Int),
        }
    }

    /// Check the test of an `if` or `while`, in the enclosing scope.
    fn check_test(&mut self, condition: &'ast Expr<'ast>, span: Span) {
        if let Some(found) = self.check_expr(condition)
            && !found.is_testable()
        {
            self.report(CompilationError::InvalidTest { found, span });
        }
    }

    fn check_return(&mut self, ret: &'ast ReturnExpr<'ast>) {
        let found = match ret.value {
            Some(value) => self.check_expr(value),
            None => Some(DataType::Void),
        };
        if let (Some(func), Some(found)) = (self.current_function, found)
            && found != func.result
        {
            self.report(CompilationError::InvalidReturn {
                expected: func.result,
                found,
                span: ret.span,
            });
        }
    }
}
