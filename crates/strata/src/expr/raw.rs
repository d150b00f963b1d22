use super::{Expr, Predicate};
use crate::value::Value;

/// A SQL fragment emitted verbatim, with its own bound arguments.
///
/// Placeholders inside the fragment are written by the caller in the
/// target dialect's syntax.
#[derive(Debug, Clone)]
pub struct RawExpr {
    pub(crate) sql: String,
    pub(crate) args: Vec<Value>,
}

/// Raw fragment with arguments.
pub fn raw<I>(sql: impl Into<String>, args: I) -> RawExpr
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    RawExpr {
        sql: sql.into(),
        args: args.into_iter().map(Into::into).collect(),
    }
}

impl RawExpr {
    /// Raw fragment without arguments.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Use the fragment as a predicate (WHERE / HAVING / ON item).
    pub fn as_predicate(self) -> Predicate {
        Predicate::new(Some(Expr::Raw(self)), None, None)
    }
}
