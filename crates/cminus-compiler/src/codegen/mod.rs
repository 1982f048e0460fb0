//! TM code generation.
//!
//! [`CodeGenerator`] walks a [`Program`] once and emits a TM listing:
//!
//! 1. A prelude that sets up the global and frame pointers and defines the
//!    `input` and `output` routines.
//! 2. Each global declaration and function body, in source order.
//! 3. A finale that calls `main` and halts.
//!
//! Forward jumps are reserved slots in the [`InstructionStream`] and are
//! bound once their target is known. Calls to functions whose body comes
//! later are bound by name and resolved when the stream is linked.
//!
//! An unresolved name is reported and the subtree referring to it emits
//! nothing further; generation carries on with the next statement.

mod call;
mod control;
mod expr;
pub mod frame;

use cminus_ast::{Decl, FunctionDecl, Program, VarDecl};
use cminus_core::{CompilationError, Diagnostics, Span};
use log::debug;
use rustc_hash::FxHashMap;

use crate::tm::{
    AC, FIRST_LOCAL_OFFSET, FP, GP, InstructionStream, JumpKind, JumpLabel, Listing,
    OLD_FRAME_OFFSET, OpCode, PC, PatchError, RETURN_OFFSET,
};
use frame::{AllocError, Frame, GlobalArea, Slot};

// ============================================================================
// Configuration and results
// ============================================================================

/// Options for [`CodeGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenConfig {
    /// Interleave `*` comment lines with the instructions.
    pub emit_comments: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            emit_comments: true,
        }
    }
}

/// Instruction addresses of the routines every program has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoints {
    pub input: usize,
    pub output: usize,
    /// `None` when the program defines no `main`
    pub main: Option<usize>,
}

/// Result of generating code for a program.
#[derive(Debug)]
pub struct Generated {
    pub listing: Listing,
    pub entry_points: EntryPoints,
    /// Words of global storage below the global pointer
    pub global_size: usize,
    pub diagnostics: Diagnostics,
}

impl Generated {
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// What the generator knows about a callable function.
#[derive(Debug, Clone, Copy)]
struct FunctionInfo {
    arity: usize,
    /// Address of the first instruction, once emitted
    entry: Option<usize>,
    /// First declaration of the function
    declared_at: Span,
}

// ============================================================================
// CodeGenerator
// ============================================================================

/// Emits TM code for a program.
pub struct CodeGenerator {
    stream: InstructionStream,
    globals: GlobalArea,
    frame: Frame,
    functions: FxHashMap<String, FunctionInfo>,
    /// Name of the function whose body is being emitted
    current_function: Option<String>,
    /// Returns inside `main`, bound to its final `HALT`
    main_returns: Vec<JumpLabel>,
    input_entry: usize,
    output_entry: usize,
    diagnostics: Diagnostics,
}

impl CodeGenerator {
    pub fn new(config: CodegenConfig) -> Self {
        Self {
            stream: InstructionStream::with_comments(config.emit_comments),
            globals: GlobalArea::new(),
            frame: Frame::new(),
            functions: FxHashMap::default(),
            current_function: None,
            main_returns: Vec::new(),
            input_entry: 0,
            output_entry: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Generate code for a whole program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate(mut self, program: &Program<'_>) -> Generated {
        self.emit_prelude();

        for decl in program.decls() {
            match decl {
                Decl::Var(var) => self.gen_global(var),
                Decl::Function(func) => self.gen_function(func),
            }
        }

        let main = self.functions.get("main").and_then(|info| info.entry);
        match main {
            Some(entry) => self.emit_finale(entry),
            None => self.report(CompilationError::MissingEntryPoint),
        }

        self.finish(main)
    }

    fn finish(mut self, main: Option<usize>) -> Generated {
        let functions = std::mem::take(&mut self.functions);
        let (listing, errors) = self
            .stream
            .link(|name| functions.get(name).and_then(|info| info.entry));

        let mut diagnostics = self.diagnostics;
        let mut undefined = Vec::new();
        for error in errors {
            match error {
                PatchError::UnknownSymbol { name, .. } => {
                    if undefined.contains(&name) {
                        continue;
                    }
                    let span = functions
                        .get(&name)
                        .map(|info| info.declared_at)
                        .unwrap_or_default();
                    undefined.push(name.clone());
                    diagnostics.push(CompilationError::MissingDefinition { name, span });
                }
                other => diagnostics.push(CompilationError::Internal {
                    message: other.to_string(),
                }),
            }
        }

        debug!(
            "generated {} instructions with {} error(s)",
            listing.len(),
            diagnostics.len()
        );
        Generated {
            listing,
            entry_points: EntryPoints {
                input: self.input_entry,
                output: self.output_entry,
                main,
            },
            global_size: self.globals.next_offset().unsigned_abs() as usize,
            diagnostics,
        }
    }

    // ==========================================================================
    // Prelude and finale
    // ==========================================================================

    fn emit_prelude(&mut self) {
        self.stream.comment("Standard prelude:");
        self.stream.emit_rm(OpCode::Ld, GP, 0, AC, "load gp with maxaddress");
        self.stream.emit_rm(OpCode::Lda, FP, 0, GP, "copy gp to fp");
        self.stream.emit_rm(OpCode::St, AC, 0, AC, "clear location 0");

        self.stream.comment("Jump around i/o routines here");
        let skip = self.stream.emit_jump(JumpKind::Always, "jump around i/o code");

        self.stream.comment("code for input routine");
        self.input_entry = self.stream.current_offset();
        self.stream.emit_rm(OpCode::St, AC, RETURN_OFFSET, FP, "store return");
        self.stream.emit_ro(OpCode::In, AC, 0, 0, "input");
        self.stream.emit_rm(OpCode::Ld, PC, RETURN_OFFSET, FP, "return to caller");

        self.stream.comment("code for output routine");
        self.output_entry = self.stream.current_offset();
        self.stream.emit_rm(OpCode::St, AC, RETURN_OFFSET, FP, "store return");
        self.stream.emit_rm(OpCode::Ld, AC, FIRST_LOCAL_OFFSET, FP, "load output value");
        self.stream.emit_ro(OpCode::Out, AC, 0, 0, "output");
        self.stream.emit_rm(OpCode::Ld, PC, RETURN_OFFSET, FP, "return to caller");

        self.patch(skip);
        self.stream.comment("End of standard prelude.");

        for (name, entry, arity) in [("input", self.input_entry, 0), ("output", self.output_entry, 1)] {
            self.functions.insert(
                name.to_string(),
                FunctionInfo {
                    arity,
                    entry: Some(entry),
                    declared_at: Span::default(),
                },
            );
        }
    }

    /// Call `main` with a frame just below the globals, then halt.
    fn emit_finale(&mut self, main: usize) {
        let frame = self.globals.next_offset();
        self.stream.comment("Begin finale: call main");
        self.stream.emit_rm(OpCode::St, FP, frame + OLD_FRAME_OFFSET, FP, "push ofp");
        self.stream.emit_rm(OpCode::Lda, FP, frame, FP, "push frame");
        self.stream.emit_rm(OpCode::Lda, AC, 1, PC, "load ac with ret ptr");
        self.stream.emit_rm_abs(OpCode::Lda, PC, main, "jump to main loc");
        self.stream.emit_rm(OpCode::Ld, FP, OLD_FRAME_OFFSET, FP, "pop frame");
        self.stream.comment("End of execution.");
        self.stream.emit_ro(OpCode::Halt, 0, 0, 0, "");
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn gen_global(&mut self, var: &VarDecl<'_>) {
        self.stream.comment(format!("allocating global var: {}", var.name()));
        let allocated = self.globals.declare(var);
        self.check_alloc(allocated);
        self.stream.comment("<- vardecl");
    }

    /// Allocate a parameter or local in the current frame.
    fn declare_local(&mut self, var: &VarDecl<'_>) {
        let allocated = self.frame.declare(var);
        self.check_alloc(allocated);
    }

    fn check_alloc(&mut self, allocated: Result<Slot, AllocError>) {
        match allocated {
            Ok(slot) => debug!("storage at {:?}", slot),
            Err(err @ AllocError::Duplicate(_)) => debug!("{}", err),
            Err(err @ AllocError::TooLarge { .. }) => self.report(CompilationError::Internal {
                message: err.to_string(),
            }),
        }
    }

    fn gen_function(&mut self, func: &FunctionDecl<'_>) {
        let name = func.name.name;
        let info = self
            .functions
            .entry(name.to_string())
            .or_insert(FunctionInfo {
                arity: func.params.len(),
                entry: None,
                declared_at: func.span,
            });

        let Some(body) = func.body else {
            return;
        };
        info.arity = func.params.len();

        self.stream.comment(format!("processing function: {}", name));
        self.stream.comment("jump around function body here");
        let skip = self.stream.emit_jump(JumpKind::Always, "jump around fn body");

        let entry = self.stream.current_offset();
        if let Some(info) = self.functions.get_mut(name) {
            info.entry = Some(entry);
        }
        debug!("function {} at {}", name, entry);

        self.stream.emit_rm(OpCode::St, AC, RETURN_OFFSET, FP, "store return");

        self.frame = Frame::new();
        for param in func.params {
            self.stream.comment(format!("processing parameter: {}", param.name()));
            self.declare_local(param);
        }

        let is_main = name == "main";
        self.current_function = Some(name.to_string());
        self.main_returns.clear();

        self.gen_statement(body);

        if is_main {
            for label in std::mem::take(&mut self.main_returns) {
                self.patch(label);
            }
            self.stream.emit_ro(OpCode::Halt, 0, 0, 0, "halt for main function");
        } else {
            self.stream.emit_rm(OpCode::Ld, PC, RETURN_OFFSET, FP, "return to caller");
        }

        self.current_function = None;
        self.patch(skip);
        self.stream.comment(format!("<- fundecl {}", name));
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    fn report(&mut self, error: CompilationError) {
        debug!("{}", error.render());
        self.diagnostics.push(error);
    }

    /// Bind a reserved jump to the current frontier.
    fn patch(&mut self, label: JumpLabel) {
        if let Err(err) = self.stream.patch_jump(label) {
            self.report(CompilationError::Internal {
                message: err.to_string(),
            });
        }
    }

    /// Find storage for a name: innermost block, function, then globals.
    fn lookup(&self, name: &str) -> Option<Slot> {
        self.frame.lookup(name).or_else(|| self.globals.lookup(name))
    }

    fn in_main(&self) -> bool {
        self.current_function.as_deref() == Some("main")
    }
}
