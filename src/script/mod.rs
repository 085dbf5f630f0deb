//! Script language for the `run` command.
//!
//! `run` payloads are programs in a small, closed s-expression language bound
//! only to the shared [`FieldStore`](crate::store::FieldStore): scripts can
//! read fields, write fields, build JSON values, and do arithmetic, and
//! nothing else. There is no access to the host process, the filesystem, or
//! the network. This module provides the AST, parser, and evaluator.

/// Abstract syntax tree definitions for the script language.
pub mod ast;
/// Evaluator that executes programs against the field store.
pub mod eval;
/// Parser for the script language.
pub mod parser;

pub use ast::{Expr, Program};
pub use eval::{eval_expr, eval_program};
pub use parser::parse_program;

use thiserror::Error;

/// Convenience result alias for script operations.
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Errors surfaced by the parser/evaluator.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Parsing failed due to invalid syntax.
    #[error("invalid script syntax: {0}")]
    Syntax(String),

    /// Evaluation failed (unknown symbol, bad operand, missing field, etc.).
    #[error("{0}")]
    Eval(String),
}
