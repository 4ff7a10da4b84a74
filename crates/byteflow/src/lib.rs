//! ByteFlow: a small C-like imperative language lowered to an eight-
//! instruction tape-machine program.
//!
//! The pipeline is lex → parse → lower (scope/tape-aware codegen) →
//! optimize → render, one module per phase: [`lexer`], [`parser`],
//! [`ast`], [`sema`], [`tape`], [`abi`], [`codegen`], [`bf`]. [`compile`]
//! is the glue a caller actually wants.

pub mod abi;
pub mod ast;
pub mod bf;
pub mod codegen;
pub mod compile;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod sema;
pub mod tape;

#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use compile::{compile, compile_with_options, CompileOptions, CompileOutput};
pub use error::{Error, Position, Result};
