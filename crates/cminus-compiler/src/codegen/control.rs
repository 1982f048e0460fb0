//! Statement-level code: blocks, `if`, `while` and `return`.

use cminus_ast::{CompoundExpr, Expr, IfExpr, ReturnExpr, WhileExpr};

use super::CodeGenerator;
use crate::tm::{FP, JumpKind, OpCode, PC, RETURN_OFFSET};

impl CodeGenerator {
    /// Emit one statement, reporting any error in it and carrying on.
    pub(super) fn gen_statement(&mut self, expr: &Expr<'_>) {
        if let Err(err) = self.gen_expr(expr) {
            self.report(err);
        }
    }

    pub(super) fn gen_compound(&mut self, compound: &CompoundExpr<'_>) {
        self.stream.comment("-> compound statement");
        self.frame.push_scope();
        for local in compound.locals {
            self.stream.comment(format!("processing local var: {}", local.name()));
            self.declare_local(local);
        }
        for expr in compound.body {
            self.gen_statement(expr);
        }
        self.frame.pop_scope();
        self.stream.comment("<- compound statement");
    }

    pub(super) fn gen_if(&mut self, if_expr: &IfExpr<'_>) {
        self.stream.comment("-> if");
        self.gen_statement(if_expr.condition);
        let to_else = self.stream.emit_jump(JumpKind::IfZero, "if: jmp to else");

        self.gen_statement(if_expr.then_branch);
        match if_expr.else_branch {
            Some(else_branch) => {
                let to_end = self.stream.emit_jump(JumpKind::Always, "jmp to end");
                self.patch(to_else);
                self.gen_statement(else_branch);
                self.patch(to_end);
            }
            None => self.patch(to_else),
        }
        self.stream.comment("<- if");
    }

    pub(super) fn gen_while(&mut self, while_expr: &WhileExpr<'_>) {
        self.stream.comment("-> while");
        let test = self.stream.current_offset();
        self.gen_statement(while_expr.condition);
        let to_exit = self.stream.emit_jump(JumpKind::IfZero, "while: jmp to end");

        self.gen_statement(while_expr.body);
        self.stream
            .emit_rm_abs(OpCode::Lda, PC, test, "while: absolute jmp to test");
        self.patch(to_exit);
        self.stream.comment("<- while");
    }

    /// Leave the value, if any, in `AC` and return to the caller.
    ///
    /// Inside `main` there is no caller: the jump goes to `main`'s `HALT`.
    pub(super) fn gen_return(&mut self, ret: &ReturnExpr<'_>) {
        self.stream.comment("-> return");
        if let Some(value) = ret.value {
            self.gen_statement(value);
        }
        if self.in_main() {
            let label = self.stream.emit_jump(JumpKind::Always, "return: jmp to halt");
            self.main_returns.push(label);
        } else {
            self.stream
                .emit_rm(OpCode::Ld, PC, RETURN_OFFSET, FP, "return to caller");
        }
        self.stream.comment("<- return");
    }
}
