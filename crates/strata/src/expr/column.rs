use super::{Expr, IntoExpr, Op, Predicate, RawExpr, SubQuery};
use crate::table::TableRef;

/// Generates the comparison builders shared by columns and aggregates.
macro_rules! comparisons {
    ($variant:ident) => {
        /// `self = rhs`
        pub fn eq(self, rhs: impl IntoExpr) -> Predicate {
            Predicate::binary(Expr::$variant(self), Op::Eq, rhs.into_expr())
        }

        /// `self != rhs`
        pub fn ne(self, rhs: impl IntoExpr) -> Predicate {
            Predicate::binary(Expr::$variant(self), Op::Ne, rhs.into_expr())
        }

        /// `self > rhs`
        pub fn gt(self, rhs: impl IntoExpr) -> Predicate {
            Predicate::binary(Expr::$variant(self), Op::Gt, rhs.into_expr())
        }

        /// `self >= rhs`
        pub fn ge(self, rhs: impl IntoExpr) -> Predicate {
            Predicate::binary(Expr::$variant(self), Op::Ge, rhs.into_expr())
        }

        /// `self < rhs`
        pub fn lt(self, rhs: impl IntoExpr) -> Predicate {
            Predicate::binary(Expr::$variant(self), Op::Lt, rhs.into_expr())
        }

        /// `self <= rhs`
        pub fn le(self, rhs: impl IntoExpr) -> Predicate {
            Predicate::binary(Expr::$variant(self), Op::Le, rhs.into_expr())
        }
    };
}

/// A reference to a model field.
///
/// The field name is the Rust field name; the compiler maps it to the
/// column through the model of the table in scope.
#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) table: Option<TableRef>,
    pub(crate) field: String,
    pub(crate) alias: Option<String>,
}

/// Reference a field of the statement's table.
pub fn col(field: impl Into<String>) -> Column {
    Column {
        table: None,
        field: field.into(),
        alias: None,
    }
}

impl Column {
    pub(crate) fn qualified(table: TableRef, field: impl Into<String>) -> Self {
        Self {
            table: Some(table),
            field: field.into(),
            alias: None,
        }
    }

    /// Alias rendered in SELECT lists (`col AS alias`)
    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    comparisons!(Column);

    /// `self LIKE pattern`
    pub fn like(self, pattern: impl IntoExpr) -> Predicate {
        Predicate::binary(Expr::Column(self), Op::Like, pattern.into_expr())
    }

    /// `self IN (v1, v2, ...)`
    ///
    /// An empty list can never match and compiles to `1 = 0`.
    pub fn in_list<I>(self, values: I) -> Predicate
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        let items: Vec<Expr> = values.into_iter().map(IntoExpr::into_expr).collect();
        if items.is_empty() {
            return RawExpr::new("1 = 0").as_predicate();
        }
        Predicate::binary(Expr::Column(self), Op::In, Expr::List(items))
    }

    /// `self IN (subquery)`
    pub fn in_subquery(self, sub: SubQuery) -> Predicate {
        Predicate::binary(Expr::Column(self), Op::In, Expr::SubQuery(sub))
    }
}

impl From<&str> for Column {
    fn from(field: &str) -> Self {
        col(field)
    }
}

impl From<String> for Column {
    fn from(field: String) -> Self {
        col(field)
    }
}

/// An aggregate function over one column: `FUNC(col)`.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub(crate) func: &'static str,
    pub(crate) column: Column,
    pub(crate) alias: Option<String>,
}

impl Aggregate {
    fn new(func: &'static str, column: impl Into<Column>) -> Self {
        Self {
            func,
            column: column.into(),
            alias: None,
        }
    }

    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn func(&self) -> &'static str {
        self.func
    }

    comparisons!(Aggregate);
}

pub fn count(column: impl Into<Column>) -> Aggregate {
    Aggregate::new("COUNT", column)
}

pub fn sum(column: impl Into<Column>) -> Aggregate {
    Aggregate::new("SUM", column)
}

pub fn avg(column: impl Into<Column>) -> Aggregate {
    Aggregate::new("AVG", column)
}

pub fn max(column: impl Into<Column>) -> Aggregate {
    Aggregate::new("MAX", column)
}

pub fn min(column: impl Into<Column>) -> Aggregate {
    Aggregate::new("MIN", column)
}

/// An ORDER BY item.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub(crate) column: Column,
    pub(crate) descending: bool,
}

pub fn asc(column: impl Into<Column>) -> OrderBy {
    OrderBy {
        column: column.into(),
        descending: false,
    }
}

pub fn desc(column: impl Into<Column>) -> OrderBy {
    OrderBy {
        column: column.into(),
        descending: true,
    }
}
