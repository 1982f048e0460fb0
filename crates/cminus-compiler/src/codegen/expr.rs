//! Expression code: literals, variables, assignment and operators.
//!
//! Every expression leaves its value in `AC`. Binary operators spill the
//! left operand to a frame temporary while the right one is evaluated.

use cminus_ast::{
    AssignExpr, BinaryExpr, BinaryOp, Expr, LiteralKind, UnaryExpr, UnaryOp, VarRef,
};
use cminus_core::CompilationError;

use super::CodeGenerator;
use super::frame::{Slot, SlotKind};
use crate::tm::{AC, AC1, FP, OpCode, PC};

/// Whether a variable reference should produce its value or its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Access {
    Value,
    Address,
}

impl CodeGenerator {
    /// Emit code leaving the value of `expr` in `AC`.
    pub(super) fn gen_expr(&mut self, expr: &Expr<'_>) -> Result<(), CompilationError> {
        match expr {
            Expr::Literal(lit) => {
                let (value, comment) = match lit.kind {
                    LiteralKind::Int(value) => (value, "load const"),
                    LiteralKind::Bool(value) => (i64::from(value), "load bool const"),
                };
                let value = i32::try_from(value).map_err(|_| CompilationError::Internal {
                    message: format!("constant {} does not fit in a TM word", value),
                })?;
                self.stream.emit_rm(OpCode::Ldc, AC, value, 0, comment);
                Ok(())
            }
            Expr::Var(var) => self.gen_var(var, Access::Value),
            Expr::Assign(assign) => self.gen_assign(assign),
            Expr::Binary(bin) => self.gen_binary(bin),
            Expr::Unary(unary) => self.gen_unary(unary),
            Expr::Call(call) => self.gen_call(call),
            Expr::If(if_expr) => {
                self.gen_if(if_expr);
                Ok(())
            }
            Expr::While(while_expr) => {
                self.gen_while(while_expr);
                Ok(())
            }
            Expr::Return(ret) => {
                self.gen_return(ret);
                Ok(())
            }
            Expr::Compound(compound) => {
                self.gen_compound(compound);
                Ok(())
            }
            Expr::Empty(_) => Ok(()),
        }
    }

    /// Storage for a variable reference, checking that indexing fits its kind.
    fn resolve_var(&self, var: &VarRef<'_>) -> Result<Slot, CompilationError> {
        let name = var.name.name;
        let slot = self.lookup(name).ok_or_else(|| {
            if var.is_indexed() {
                CompilationError::UndefinedArray {
                    name: name.to_string(),
                    span: var.span,
                }
            } else {
                CompilationError::UndefinedVariable {
                    name: name.to_string(),
                    span: var.span,
                }
            }
        })?;
        if var.is_indexed() && !slot.is_array() {
            return Err(CompilationError::NotAnArray {
                name: name.to_string(),
                span: var.span,
            });
        }
        Ok(slot)
    }

    /// Load the address of an array's first element into `AC`.
    fn load_array_base(&mut self, slot: Slot) {
        let op = match slot.kind {
            SlotKind::ArrayRef => OpCode::Ld,
            SlotKind::Array | SlotKind::Scalar => OpCode::Lda,
        };
        self.stream
            .emit_rm(op, AC, slot.offset, slot.base_register(), "load array base address");
    }

    /// Emit a variable reference in the requested access mode.
    ///
    /// A bare array name always yields its base address.
    pub(super) fn gen_var(&mut self, var: &VarRef<'_>, access: Access) -> Result<(), CompilationError> {
        let slot = self.resolve_var(var)?;

        let Some(index) = var.index else {
            self.stream.comment(format!("-> id {}", var.name.name));
            match (slot.kind, access) {
                (SlotKind::Scalar, Access::Value) => {
                    self.stream
                        .emit_rm(OpCode::Ld, AC, slot.offset, slot.base_register(), "load id value");
                }
                (SlotKind::Scalar, Access::Address) => {
                    self.stream
                        .emit_rm(OpCode::Lda, AC, slot.offset, slot.base_register(), "load id address");
                }
                (SlotKind::Array | SlotKind::ArrayRef, _) => self.load_array_base(slot),
            }
            self.stream.comment("<- id");
            return Ok(());
        };

        self.stream.comment(format!("-> subs {}", var.name.name));
        self.gen_expr(index)?;
        let temp = self.frame.claim_temp();
        self.stream.emit_rm(OpCode::St, AC, temp, FP, "store array index");
        self.load_array_base(slot);
        self.stream.emit_rm(OpCode::Ld, AC1, temp, FP, "load array index");
        self.frame.release_temp();
        self.stream.emit_ro(OpCode::Sub, AC, AC, AC1, "compute element address");
        if access == Access::Value {
            self.stream.emit_rm(OpCode::Ld, AC, 0, AC, "load array element value");
        }
        self.stream.comment("<- subs");
        Ok(())
    }

    fn gen_assign(&mut self, assign: &AssignExpr<'_>) -> Result<(), CompilationError> {
        self.stream.comment("-> assign");
        self.gen_var(&assign.target, Access::Address)?;
        let temp = self.frame.claim_temp();
        self.stream.emit_rm(OpCode::St, AC, temp, FP, "assign: push target address");
        let value = self.gen_expr(assign.value);
        if value.is_ok() {
            self.stream.emit_rm(OpCode::Ld, AC1, temp, FP, "assign: load target address");
            self.stream.emit_rm(OpCode::St, AC, 0, AC1, "assign: store value");
        }
        self.frame.release_temp();
        value?;
        self.stream.comment("<- assign");
        Ok(())
    }

    fn gen_binary(&mut self, bin: &BinaryExpr<'_>) -> Result<(), CompilationError> {
        self.stream.comment(format!("-> op {}", bin.op));
        self.gen_expr(bin.left)?;
        let temp = self.frame.claim_temp();
        self.stream.emit_rm(OpCode::St, AC, temp, FP, "op: push left");
        let right = self.gen_expr(bin.right);
        if right.is_ok() {
            self.stream.emit_rm(OpCode::Ld, AC1, temp, FP, "op: load left");
            self.emit_operator(bin.op);
        }
        self.frame.release_temp();
        right?;
        self.stream.comment(format!("<- op {}", bin.op));
        Ok(())
    }

    /// Combine `AC1` (left) and `AC` (right) into `AC`.
    fn emit_operator(&mut self, op: BinaryOp) {
        let jump = match op {
            BinaryOp::Add => return self.emit_arith(OpCode::Add, "op +"),
            BinaryOp::Sub => return self.emit_arith(OpCode::Sub, "op -"),
            BinaryOp::Mul => return self.emit_arith(OpCode::Mul, "op *"),
            BinaryOp::Div => return self.emit_arith(OpCode::Div, "op /"),
            BinaryOp::Equal => OpCode::Jeq,
            BinaryOp::NotEqual => OpCode::Jne,
            BinaryOp::Less => OpCode::Jlt,
            BinaryOp::LessEqual => OpCode::Jle,
            BinaryOp::Greater => OpCode::Jgt,
            BinaryOp::GreaterEqual => OpCode::Jge,
        };
        // left - right, then materialize 0 or 1
        self.stream
            .emit_ro(OpCode::Sub, AC, AC1, AC, &format!("op {}", op));
        self.stream.emit_rm(jump, AC, 2, PC, "br if true");
        self.stream.emit_rm(OpCode::Ldc, AC, 0, 0, "false case");
        self.stream.emit_rm(OpCode::Lda, PC, 1, PC, "unconditional jmp");
        self.stream.emit_rm(OpCode::Ldc, AC, 1, 0, "true case");
    }

    fn emit_arith(&mut self, op: OpCode, comment: &str) {
        self.stream.emit_ro(op, AC, AC1, AC, comment);
    }

    fn gen_unary(&mut self, unary: &UnaryExpr<'_>) -> Result<(), CompilationError> {
        self.gen_expr(unary.operand)?;
        match unary.op {
            UnaryOp::Neg => {
                self.stream.emit_rm(OpCode::Ldc, AC1, 0, 0, "load 0");
                self.stream.emit_ro(OpCode::Sub, AC, AC1, AC, "op unary -");
            }
        }
        Ok(())
    }
}
