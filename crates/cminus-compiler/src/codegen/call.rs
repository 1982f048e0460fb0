//! Call sequences.
//!
//! Arguments are evaluated left to right into frame temporaries. The
//! callee's frame then starts at the caller's first free slot, below those
//! temporaries, and the arguments are copied into its parameter slots:
//!
//! ```text
//! frame + 0   old FP         (ST FP,frame(FP))
//! frame - 1   return address (stored by the callee's prologue)
//! frame - 2   argument 0
//! frame - 3   argument 1 ...
//! ```

use cminus_ast::CallExpr;
use cminus_core::CompilationError;

use super::CodeGenerator;
use crate::tm::{AC, FIRST_LOCAL_OFFSET, FP, OLD_FRAME_OFFSET, OpCode, PC};

impl CodeGenerator {
    /// Emit a call, leaving the callee's result in `AC`.
    ///
    /// A call with the wrong number of arguments emits nothing.
    pub(super) fn gen_call(&mut self, call: &CallExpr<'_>) -> Result<(), CompilationError> {
        let name = call.callee.name;
        let info = self
            .functions
            .get(name)
            .copied()
            .ok_or_else(|| CompilationError::UndefinedFunction {
                name: name.to_string(),
                span: call.span,
            })?;
        if info.arity != call.args.len() {
            return Err(CompilationError::ArgumentCountMismatch {
                function: name.to_string(),
                expected: info.arity,
                found: call.args.len(),
                span: call.span,
            });
        }

        self.stream.comment(format!("-> call of function: {}", name));

        let mut temps = Vec::with_capacity(call.args.len());
        for arg in call.args {
            if let Err(err) = self.gen_expr(arg) {
                for _ in &temps {
                    self.frame.release_temp();
                }
                return Err(err);
            }
            let temp = self.frame.claim_temp();
            self.stream.emit_rm(OpCode::St, AC, temp, FP, "store arg val");
            temps.push(temp);
        }

        let frame = self.frame.extent();
        for (i, temp) in temps.iter().enumerate() {
            self.stream.emit_rm(OpCode::Ld, AC, *temp, FP, "load arg val");
            self.stream.emit_rm(
                OpCode::St,
                AC,
                frame + FIRST_LOCAL_OFFSET - i as i32,
                FP,
                "store arg in callee frame",
            );
        }

        self.stream.emit_rm(OpCode::St, FP, frame + OLD_FRAME_OFFSET, FP, "push ofp");
        self.stream.emit_rm(OpCode::Lda, FP, frame, FP, "push frame");
        self.stream.emit_rm(OpCode::Lda, AC, 1, PC, "load ac with ret ptr");
        match info.entry {
            Some(entry) => {
                self.stream.emit_rm_abs(OpCode::Lda, PC, entry, "jump to fun loc");
            }
            None => {
                self.stream.emit_call_jump(name, "jump to fun loc");
            }
        }
        self.stream.emit_rm(OpCode::Ld, FP, OLD_FRAME_OFFSET, FP, "pop frame");

        for _ in &temps {
            self.frame.release_temp();
        }
        self.stream.comment("<- call");
        Ok(())
    }
}
