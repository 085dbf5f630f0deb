use serde::{Deserialize, Serialize};

/// Generic s-expression nodes used throughout the script language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Expr {
    /// A bare symbol.
    Symbol(String),
    /// Keyword tokens (leading colon), used as object keys.
    Keyword(String),
    /// String literal.
    String(String),
    /// Signed integer literal.
    Integer(i64),
    /// Floating-point literal.
    Float(f64),
    /// Boolean literal.
    Boolean(bool),
    /// Null literal.
    Null,
    /// Nested list.
    List(Vec<Expr>),
}

/// A parsed script: the sequence of top-level forms, evaluated in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Parsed forms (the raw s-expressions).
    pub forms: Vec<Expr>,
    /// Original source text, retained for error reporting and debugging.
    pub source: String,
}

impl Program {
    /// Construct a program from its source text and parsed forms.
    pub fn new(source: impl Into<String>, forms: Vec<Expr>) -> Self {
        Self {
            forms,
            source: source.into(),
        }
    }
}
