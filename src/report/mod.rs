// src/report/mod.rs
pub mod assembler;
pub mod batch;
pub mod prompt;

pub use assembler::{assemble, ReportEntry};
pub use batch::{analyze, ReportSource};
pub use prompt::generate_prompt;
