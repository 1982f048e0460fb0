//! C-minus compiler targeting the TM virtual machine.
//!
//! This crate ties the two back-end passes together:
//!
//! 1. [`SemanticAnalyzer`] resolves every name, checks types and writes the
//!    scope trace.
//! 2. [`CodeGenerator`] lowers the program to a TM [`Listing`].
//!
//! Both passes report non-fatal [`CompilationError`]s; [`Compiler`] runs them
//! in order and collects the results.
//!
//! # Example
//!
//! ```
//! use cminus::ast::AstBuilder;
//! use cminus::{Bump, Compiler, DataType};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let body = b.compound(&[], &[b.call("output", &[b.int(42)])]);
//! let program = b.program(&[b.function(DataType::Void, "main", &[], Some(body))]);
//!
//! let result = Compiler::default().compile(&program);
//! assert!(result.is_success());
//! assert!(result.trace().starts_with("Entering the global scope:"));
//! println!("{}", result.listing().unwrap());
//! ```

mod compiler;

pub use compiler::{BuildError, CompilationResult, Compiler, CompilerOptions};

pub use bumpalo::Bump;
pub use cminus_ast as ast;
pub use cminus_compiler::{
    Analysis, AnalyzerConfig, CodeGenerator, CodegenConfig, Definition, EntryPoints, Generated,
    Instruction, Listing, LookupPolicy, OpCode, Operands, ScopeId, SemanticAnalyzer, SymbolEntry,
    SymbolTable, codegen, scope, semantic, tm,
};
pub use cminus_core::{CompilationError, DataType, Diagnostics, Span};
