//! Diagnostics produced by the semantic analyzer and the code generator.
//!
//! Every diagnostic is non-fatal: both passes collect errors and keep going.
//! The `Display` impl of [`CompilationError`] is the bare description;
//! [`CompilationError::render`] adds the `Error on line R, column C:` prefix
//! used on the diagnostic channel.

use thiserror::Error;

use crate::{DataType, Span};

/// Errors detected while analyzing or generating code for a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// A name was declared twice in the same non-global scope.
    #[error("{kind} {name} has already been declared on {original}")]
    Redeclaration {
        /// What was redeclared ("Variable", "Array variable", "Function").
        kind: &'static str,
        /// The redeclared name.
        name: String,
        /// Where the surviving declaration lives.
        original: Span,
        /// Where the rejected declaration occurred.
        span: Span,
    },

    /// A variable reference could not be resolved.
    #[error("variable {name} is not defined")]
    UndefinedVariable { name: String, span: Span },

    /// An indexed reference named something that is not a known array.
    #[error("array {name} is not defined")]
    UndefinedArray { name: String, span: Span },

    /// A scalar variable was indexed.
    #[error("variable {name} is not an array")]
    NotAnArray { name: String, span: Span },

    /// A call named a function that does not exist.
    #[error("invalid call to undefined function {name}()")]
    UndefinedFunction { name: String, span: Span },

    /// Two operand or assignment types disagree.
    #[error("incompatible types: {found} cannot be converted to {expected}")]
    TypeMismatch {
        expected: DataType,
        found: DataType,
        span: Span,
    },

    /// An arithmetic operator was applied to non-integer operands.
    #[error("performing arithmetic operation on invalid type {found}")]
    InvalidArithmetic { found: DataType, span: Span },

    /// An `if` or `while` test had a type that cannot be tested.
    #[error("invalid test expression of type {found}")]
    InvalidTest { found: DataType, span: Span },

    /// An array index was not an integer.
    #[error("invalid array index of type {found}, expected INT")]
    InvalidIndex { found: DataType, span: Span },

    /// A call supplied the wrong number of arguments.
    #[error("invalid call to {function}(): expected {expected} argument(s), got {found}")]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    /// A call argument does not match its parameter.
    #[error("invalid call to {function}(): argument {position} is {found} when expected {expected}")]
    ArgumentTypeMismatch {
        function: String,
        /// 1-based argument position.
        position: usize,
        expected: String,
        found: String,
        span: Span,
    },

    /// A `return` value does not match the function's result type.
    #[error("function type {expected} cannot return {found}")]
    InvalidReturn {
        expected: DataType,
        found: DataType,
        span: Span,
    },

    /// A variable was declared `void`; it is treated as `int` afterwards.
    #[error("invalid declaration type (VOID) for {name}: expected BOOL or INT, changing to INT")]
    VoidVariable { name: String, span: Span },

    /// A prototype was never followed by a definition.
    #[error("function {name} is declared but never defined")]
    MissingDefinition { name: String, span: Span },

    /// The program has no `main` function to start from.
    #[error("'main' function not found")]
    MissingEntryPoint,

    /// A code generator invariant was violated.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CompilationError {
    /// Get the span where this error occurred.
    ///
    /// Program-wide errors return `Span::default()`.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::Redeclaration { span, .. } => *span,
            CompilationError::UndefinedVariable { span, .. } => *span,
            CompilationError::UndefinedArray { span, .. } => *span,
            CompilationError::NotAnArray { span, .. } => *span,
            CompilationError::UndefinedFunction { span, .. } => *span,
            CompilationError::TypeMismatch { span, .. } => *span,
            CompilationError::InvalidArithmetic { span, .. } => *span,
            CompilationError::InvalidTest { span, .. } => *span,
            CompilationError::InvalidIndex { span, .. } => *span,
            CompilationError::ArgumentCountMismatch { span, .. } => *span,
            CompilationError::ArgumentTypeMismatch { span, .. } => *span,
            CompilationError::InvalidReturn { span, .. } => *span,
            CompilationError::VoidVariable { span, .. } => *span,
            CompilationError::MissingDefinition { span, .. } => *span,
            CompilationError::MissingEntryPoint => Span::default(),
            CompilationError::Internal { .. } => Span::default(),
        }
    }

    /// Render the error as one line of the diagnostic channel.
    pub fn render(&self) -> String {
        let span = self.span();
        if span.is_known() {
            format!("Error on line {}, column {}: {}", span.line, span.col, self)
        } else {
            format!("Error: {}", self)
        }
    }
}

/// A collection of diagnostics, in the order they were reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    errors: Vec<CompilationError>,
}

impl Diagnostics {
    /// Create a new empty collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: CompilationError) {
        self.errors.push(error);
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &CompilationError> {
        self.errors.iter()
    }

    /// Convert to a Vec of errors.
    pub fn into_vec(self) -> Vec<CompilationError> {
        self.errors
    }
}

impl IntoIterator for Diagnostics {
    type Item = CompilationError;
    type IntoIter = std::vec::IntoIter<CompilationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a CompilationError;
    type IntoIter = std::slice::Iter<'a, CompilationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error.render())?;
        }
        Ok(())
    }
}
