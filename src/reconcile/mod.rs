pub mod compiler;
pub mod evaluator;
pub mod merge;

pub use compiler::ReconciliationCompiler;
