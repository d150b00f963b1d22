use super::{Column, Expr, IntoExpr};

/// `field = value` in an UPDATE SET list or an upsert.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub(crate) field: String,
    pub(crate) value: Expr,
}

pub fn assign(field: impl Into<String>, value: impl IntoExpr) -> Assignment {
    Assignment {
        field: field.into(),
        value: value.into_expr(),
    }
}

impl Assignment {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &Expr {
        &self.value
    }
}

/// An item of a SET list.
///
/// A bare column takes its value from the entity being updated, or, in an
/// upsert, from the incoming row.
#[derive(Debug, Clone)]
pub enum Assignable {
    Assign(Assignment),
    Column(Column),
}

impl From<Assignment> for Assignable {
    fn from(a: Assignment) -> Self {
        Assignable::Assign(a)
    }
}

impl From<Column> for Assignable {
    fn from(c: Column) -> Self {
        Assignable::Column(c)
    }
}
