//! C-minus compiler back end.
//!
//! Two independent passes over a parsed [`cminus_ast::Program`]:
//!
//! - **Semantic analysis** ([`semantic`]): build the scoped symbol table,
//!   type check every expression and write the scope trace.
//! - **Code generation** ([`codegen`]): emit a TM listing with a fixed
//!   prelude, one block per function and a finale that runs `main`.
//!
//! Both passes report problems as non-fatal [`CompilationError`]s and keep
//! going.
//!
//! ## Modules
//!
//! - [`scope`]: Symbol table keyed by scope id
//! - [`semantic`]: Scope and type resolution
//! - [`tm`]: TM registers, instructions and the instruction stream
//! - [`codegen`]: TM code generation

pub mod codegen;
pub mod scope;
pub mod semantic;
pub mod tm;

pub use codegen::{CodeGenerator, CodegenConfig, EntryPoints, Generated};
pub use scope::{Definition, ScopeId, SymbolEntry, SymbolTable};
pub use semantic::{Analysis, AnalyzerConfig, LookupPolicy, SemanticAnalyzer};
pub use tm::{Instruction, Listing, OpCode, Operands};

// Re-export CompilationError from core for convenience
pub use cminus_core::CompilationError;
