//! Constrained predicate language for filter expressions.
//!
//! Source text is tokenized, parsed into an [`ast::Expr`], and every name is
//! resolved against the closed [`crate::context::Field`] schema before the
//! predicate can run. Evaluation is a tree walk over immutable values with no
//! access to anything outside the candidate's [`Context`].

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod resolve;
pub mod value;

use crate::context::Context;

pub use error::{CompileError, EvalError};
pub use value::Value;

/// A compiled boolean expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    expr: ast::Expr,
}

impl Predicate {
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let parsed = parser::parse(source)?;
        let expr = resolve::resolve(parsed)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// A predicate that always yields `value`.
    pub fn constant(value: bool) -> Self {
        Self {
            source: if value { "True" } else { "False" }.to_string(),
            expr: ast::Expr::Literal(Value::Bool(value)),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &ast::Expr {
        &self.expr
    }

    /// Truthiness of the expression for this context.
    pub fn eval(&self, ctx: &Context<'_>) -> Result<bool, EvalError> {
        eval::evaluate(&self.expr, ctx).map(|v| v.truthy())
    }

    /// Raw value of the expression for this context.
    pub fn value(&self, ctx: &Context<'_>) -> Result<Value, EvalError> {
        eval::evaluate(&self.expr, ctx)
    }
}
