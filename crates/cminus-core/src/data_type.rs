//! The C-minus type system.

use std::fmt;

/// A declared or inferred type.
///
/// `Void` is only meaningful as a function result type. Variables declared
/// `void` are diagnosed and treated as `Int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int,
    Void,
}

impl DataType {
    /// Upper-case name used in diagnostics (`BOOL`, `INT`, `VOID`).
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Bool => "BOOL",
            DataType::Int => "INT",
            DataType::Void => "VOID",
        }
    }

    /// Source keyword (`bool`, `int`, `void`).
    pub fn keyword(&self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Void => "void",
        }
    }

    /// Whether a value of this type can drive an `if` or `while` test.
    pub fn is_testable(&self) -> bool {
        matches!(self, DataType::Bool | DataType::Int)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
