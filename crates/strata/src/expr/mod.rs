//! Typed expression algebra for WHERE / HAVING / ON / SELECT / SET clauses.
//!
//! Expressions form immutable trees. Combinators consume their inputs and
//! share children through `Arc`, so a subtree can be reused in several
//! predicates without copying.
//!
//! ```ignore
//! use strata::expr::{col, not};
//!
//! let adults = col("Age").ge(18).or(col("Age").lt(3));
//! let filter = adults.and(not(col("NickName").eq("admin")));
//! ```

mod assign;
mod column;
mod predicate;
mod raw;
mod subquery;

pub use assign::{Assignable, Assignment, assign};
pub use column::{Aggregate, Column, OrderBy, asc, avg, col, count, desc, max, min, sum};
pub use predicate::{Op, Predicate, all, any, exists, not, not_exists, some};
pub use raw::{RawExpr, raw};
pub use subquery::SubQuery;

use crate::error::OrmError;
use crate::value::Value;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A node in an expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    Column(Column),
    Value(Value),
    Predicate(Predicate),
    Aggregate(Aggregate),
    Raw(RawExpr),
    SubQuery(SubQuery),
    /// Parenthesized value list, the right side of `IN`
    List(Vec<Expr>),
}

/// Conversion into an expression operand.
///
/// Literals become bound values; raw fragments become operator-less
/// predicates so they are parenthesized as operands.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for Column {
    fn into_expr(self) -> Expr {
        Expr::Column(self)
    }
}

impl IntoExpr for Aggregate {
    fn into_expr(self) -> Expr {
        Expr::Aggregate(self)
    }
}

impl IntoExpr for Predicate {
    fn into_expr(self) -> Expr {
        Expr::Predicate(self)
    }
}

impl IntoExpr for RawExpr {
    fn into_expr(self) -> Expr {
        Expr::Predicate(self.as_predicate())
    }
}

impl IntoExpr for SubQuery {
    fn into_expr(self) -> Expr {
        Expr::SubQuery(self)
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::Value(self)
    }
}

impl<T: Into<Value>> IntoExpr for Option<T> {
    fn into_expr(self) -> Expr {
        Expr::Value(self.into())
    }
}

impl IntoExpr for &str {
    fn into_expr(self) -> Expr {
        Expr::Value(self.into())
    }
}

macro_rules! impl_into_expr_value {
    ($($ty:ty),*) => {$(
        impl IntoExpr for $ty {
            fn into_expr(self) -> Expr {
                Expr::Value(Value::from(self))
            }
        }
    )*};
}

impl_into_expr_value!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    bool,
    String,
    Vec<u8>,
    DateTime<Utc>,
    Uuid,
    serde_json::Value
);

/// An item of a SELECT list.
#[derive(Debug, Clone)]
pub enum Selectable {
    Column(Column),
    Aggregate(Aggregate),
    Raw(RawExpr),
    /// Must carry an alias to be referenced from the outer query
    SubQuery(SubQuery),
}

impl From<Column> for Selectable {
    fn from(c: Column) -> Self {
        Selectable::Column(c)
    }
}

impl From<Aggregate> for Selectable {
    fn from(a: Aggregate) -> Self {
        Selectable::Aggregate(a)
    }
}

impl From<RawExpr> for Selectable {
    fn from(r: RawExpr) -> Self {
        Selectable::Raw(r)
    }
}

impl From<SubQuery> for Selectable {
    fn from(s: SubQuery) -> Self {
        Selectable::SubQuery(s)
    }
}

impl TryFrom<Expr> for Selectable {
    type Error = OrmError;

    fn try_from(expr: Expr) -> Result<Self, Self::Error> {
        match expr {
            Expr::Column(c) => Ok(Selectable::Column(c)),
            Expr::Aggregate(a) => Ok(Selectable::Aggregate(a)),
            Expr::Raw(r) => Ok(Selectable::Raw(r)),
            Expr::SubQuery(s) => Ok(Selectable::SubQuery(s)),
            Expr::Value(v) => Err(OrmError::UnsupportedExpression(format!(
                "value {} is not selectable",
                v.kind()
            ))),
            Expr::Predicate(_) => Err(OrmError::UnsupportedExpression(
                "predicate is not selectable".to_string(),
            )),
            Expr::List(_) => Err(OrmError::UnsupportedExpression(
                "value list is not selectable".to_string(),
            )),
        }
    }
}
