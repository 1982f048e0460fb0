//! Core types shared by the C-minus tree and compiler crates.
//!
//! - [`Span`]: source position carried by every tree node
//! - [`DataType`]: the `bool` / `int` / `void` type system
//! - [`CompilationError`] and [`Diagnostics`]: non-fatal diagnostics

mod data_type;
mod error;
mod span;

pub use data_type::DataType;
pub use error::{CompilationError, Diagnostics};
pub use span::Span;
