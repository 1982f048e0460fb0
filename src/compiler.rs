//! Compiler driver: runs analysis and code generation over one program.

use cminus_ast::Program;
use cminus_compiler::{
    Analysis, AnalyzerConfig, CodeGenerator, CodegenConfig, Generated, SemanticAnalyzer,
};
use cminus_compiler::tm::Listing;
use cminus_core::Diagnostics;
use log::{debug, info};
use thiserror::Error;

/// Options for both passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerOptions {
    pub analyzer: AnalyzerConfig,
    pub codegen: CodegenConfig,
    /// Run code generation even when analysis reported errors.
    pub generate_on_errors: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            codegen: CodegenConfig::default(),
            generate_on_errors: true,
        }
    }
}

/// Errors from [`Compiler::build`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("semantic analysis failed with {} error(s)", .0.len())]
    Analysis(Diagnostics),

    #[error("code generation failed with {} error(s)", .0.len())]
    Codegen(Diagnostics),
}

impl BuildError {
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            BuildError::Analysis(diags) | BuildError::Codegen(diags) => diags,
        }
    }
}

/// Everything both passes produced.
#[derive(Debug)]
pub struct CompilationResult<'ast> {
    pub analysis: Analysis<'ast>,
    /// `None` when generation was skipped after analysis errors
    pub generated: Option<Generated>,
}

impl<'ast> CompilationResult<'ast> {
    /// Whether both passes ran without errors.
    pub fn is_success(&self) -> bool {
        self.analysis.is_success() && self.generated.as_ref().is_some_and(Generated::is_success)
    }

    /// Scope trace from analysis.
    pub fn trace(&self) -> &str {
        &self.analysis.trace
    }

    pub fn listing(&self) -> Option<&Listing> {
        self.generated.as_ref().map(|generated| &generated.listing)
    }

    /// Diagnostics of both passes in report order.
    ///
    /// An error both passes found is listed once.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut all = self.analysis.diagnostics.clone();
        if let Some(generated) = &self.generated {
            for error in &generated.diagnostics {
                if !all.iter().any(|seen| seen == error) {
                    all.push(error.clone());
                }
            }
        }
        all
    }
}

/// Runs the compiler passes.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Analyze and generate code, collecting every diagnostic.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile<'ast>(&self, program: &Program<'ast>) -> CompilationResult<'ast> {
        let analysis = {
            #[cfg(feature = "profiling")]
            profiling::scope!("semantic_analysis");
            SemanticAnalyzer::new(self.options.analyzer).analyze(program)
        };
        debug!("analysis reported {} error(s)", analysis.diagnostics.len());

        let generated = if analysis.is_success() || self.options.generate_on_errors {
            #[cfg(feature = "profiling")]
            profiling::scope!("codegen");
            Some(CodeGenerator::new(self.options.codegen).generate(program))
        } else {
            info!("skipping code generation after analysis errors");
            None
        };

        CompilationResult {
            analysis,
            generated,
        }
    }

    /// Compile and return the listing, failing on the first pass with errors.
    pub fn build(&self, program: &Program<'_>) -> Result<Listing, BuildError> {
        let analysis = SemanticAnalyzer::new(self.options.analyzer).analyze(program);
        if !analysis.is_success() {
            return Err(BuildError::Analysis(analysis.diagnostics));
        }

        let generated = CodeGenerator::new(self.options.codegen).generate(program);
        if !generated.is_success() {
            return Err(BuildError::Codegen(generated.diagnostics));
        }
        info!("built {} instructions", generated.listing.len());
        Ok(generated.listing)
    }
}
