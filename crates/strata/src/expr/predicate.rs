use super::{Expr, SubQuery};
use std::fmt;
use std::sync::Arc;

/// SQL operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    And,
    Or,
    Not,
    In,
    Exists,
    NotExists,
    Any,
    All,
    Some,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Like => "LIKE",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
            Op::In => "IN",
            Op::Exists => "EXISTS",
            Op::NotExists => "NOT EXISTS",
            Op::Any => "ANY",
            Op::All => "ALL",
            Op::Some => "SOME",
        }
    }

    /// `ANY` / `ALL` / `SOME` qualify a subquery operand in place.
    pub fn is_quantifier(&self) -> bool {
        matches!(self, Op::Any | Op::All | Op::Some)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A boolean node: `left OP right`.
///
/// Prefix operators (`NOT`, `EXISTS`, ...) leave `left` empty; a raw fragment
/// used as an operand has neither operator nor right side.
#[derive(Debug, Clone)]
pub struct Predicate {
    left: Option<Arc<Expr>>,
    op: Option<Op>,
    right: Option<Arc<Expr>>,
}

impl Predicate {
    pub(crate) fn new(left: Option<Expr>, op: Option<Op>, right: Option<Expr>) -> Self {
        Self {
            left: left.map(Arc::new),
            op,
            right: right.map(Arc::new),
        }
    }

    pub(crate) fn binary(left: Expr, op: Op, right: Expr) -> Self {
        Self::new(Some(left), Some(op), Some(right))
    }

    pub(crate) fn prefix(op: Op, right: Expr) -> Self {
        Self::new(None, Some(op), Some(right))
    }

    /// `(self) AND (other)`
    pub fn and(self, other: Predicate) -> Predicate {
        Self::binary(Expr::Predicate(self), Op::And, Expr::Predicate(other))
    }

    /// `(self) OR (other)`
    pub fn or(self, other: Predicate) -> Predicate {
        Self::binary(Expr::Predicate(self), Op::Or, Expr::Predicate(other))
    }

    /// `NOT (self)`
    pub fn not(self) -> Predicate {
        Self::prefix(Op::Not, Expr::Predicate(self))
    }

    pub fn left(&self) -> Option<&Expr> {
        self.left.as_deref()
    }

    pub fn op(&self) -> Option<Op> {
        self.op
    }

    pub fn right(&self) -> Option<&Expr> {
        self.right.as_deref()
    }

    /// Fold predicates left-to-right with `AND`; `None` if empty.
    pub fn fold_and(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(Predicate::and)
    }
}

/// `NOT (p)`
pub fn not(p: Predicate) -> Predicate {
    p.not()
}

/// `EXISTS (subquery)`
pub fn exists(sub: SubQuery) -> Predicate {
    Predicate::prefix(Op::Exists, Expr::SubQuery(sub))
}

/// `NOT EXISTS (subquery)`
pub fn not_exists(sub: SubQuery) -> Predicate {
    Predicate::prefix(Op::NotExists, Expr::SubQuery(sub))
}

/// `ANY (subquery)`, the right side of a comparison.
pub fn any(sub: SubQuery) -> Expr {
    Expr::Predicate(Predicate::prefix(Op::Any, Expr::SubQuery(sub)))
}

/// `ALL (subquery)`, the right side of a comparison.
pub fn all(sub: SubQuery) -> Expr {
    Expr::Predicate(Predicate::prefix(Op::All, Expr::SubQuery(sub)))
}

/// `SOME (subquery)`, the right side of a comparison.
pub fn some(sub: SubQuery) -> Expr {
    Expr::Predicate(Predicate::prefix(Op::Some, Expr::SubQuery(sub)))
}
