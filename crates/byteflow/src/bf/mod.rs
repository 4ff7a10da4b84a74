pub mod instruction;
pub mod minify;
pub mod peephole;

pub use instruction::{Op, Program};
pub use minify::{minify, render_annotated};
pub use peephole::{optimize, optimize_with_flags, OptimizationFlags};
