// Chart DSL parser module

pub mod ast;
pub mod command;
pub mod lexer;
pub mod pipeline;

// Public API re-exports
pub use ast::{ChartSpec, Command};
pub use pipeline::parse_chart_spec;
