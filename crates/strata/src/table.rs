//! Table references: the FROM side of a statement.

use crate::error::OrmResult;
use crate::expr::{Column, Predicate, SubQuery};
use crate::model::{Model, Registry};
use crate::reflect::Reflect;
use std::any::type_name;
use std::fmt;
use std::sync::Arc;

/// Something a statement can read from.
#[derive(Debug, Clone)]
pub enum TableRef {
    Table(Table),
    Join(Arc<Join>),
    SubQuery(SubQuery),
}

impl From<Table> for TableRef {
    fn from(t: Table) -> Self {
        TableRef::Table(t)
    }
}

impl From<Join> for TableRef {
    fn from(j: Join) -> Self {
        TableRef::Join(Arc::new(j))
    }
}

impl From<SubQuery> for TableRef {
    fn from(s: SubQuery) -> Self {
        TableRef::SubQuery(s)
    }
}

type ModelLookup = fn(&Registry) -> OrmResult<Arc<Model>>;

/// The table mapped to an entity type, optionally aliased.
#[derive(Clone)]
pub struct Table {
    entity: &'static str,
    lookup: ModelLookup,
    alias: Option<String>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("entity", &self.entity)
            .field("alias", &self.alias)
            .finish()
    }
}

impl Table {
    /// The table of entity `T`.
    pub fn of<T: Reflect>() -> Self {
        Self {
            entity: type_name::<T>(),
            lookup: Registry::get::<T>,
            alias: None,
        }
    }

    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Resolve the model through `registry`.
    pub fn model(&self, registry: &Registry) -> OrmResult<Arc<Model>> {
        (self.lookup)(registry)
    }

    /// Reference a field of this table.
    pub fn col(&self, field: impl Into<String>) -> Column {
        Column::qualified(TableRef::Table(self.clone()), field)
    }

    pub fn inner_join(self, right: impl Into<TableRef>) -> JoinBuilder {
        JoinBuilder::new(JoinKind::Inner, self.into(), right.into())
    }

    pub fn left_join(self, right: impl Into<TableRef>) -> JoinBuilder {
        JoinBuilder::new(JoinKind::Left, self.into(), right.into())
    }

    pub fn right_join(self, right: impl Into<TableRef>) -> JoinBuilder {
        JoinBuilder::new(JoinKind::Right, self.into(), right.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// Join condition: either `ON` predicates or `USING` columns.
#[derive(Debug, Clone)]
pub enum JoinCondition {
    On(Vec<Predicate>),
    Using(Vec<Column>),
}

/// `left <KIND> right ON ... | USING (...)`; nests left-deep.
#[derive(Debug, Clone)]
pub struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) left: TableRef,
    pub(crate) right: TableRef,
    pub(crate) condition: JoinCondition,
}

impl Join {
    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn inner_join(self, right: impl Into<TableRef>) -> JoinBuilder {
        JoinBuilder::new(JoinKind::Inner, self.into(), right.into())
    }

    pub fn left_join(self, right: impl Into<TableRef>) -> JoinBuilder {
        JoinBuilder::new(JoinKind::Left, self.into(), right.into())
    }

    pub fn right_join(self, right: impl Into<TableRef>) -> JoinBuilder {
        JoinBuilder::new(JoinKind::Right, self.into(), right.into())
    }
}

/// A join waiting for its condition.
#[derive(Debug, Clone)]
pub struct JoinBuilder {
    kind: JoinKind,
    left: TableRef,
    right: TableRef,
}

impl JoinBuilder {
    pub(crate) fn new(kind: JoinKind, left: TableRef, right: TableRef) -> Self {
        Self { kind, left, right }
    }

    /// Finish with `ON p1 AND p2 ...`.
    pub fn on(self, predicates: impl IntoIterator<Item = Predicate>) -> Join {
        self.finish(JoinCondition::On(predicates.into_iter().collect()))
    }

    /// Finish with `USING (c1, c2, ...)`.
    pub fn using<I>(self, columns: I) -> Join
    where
        I: IntoIterator,
        I::Item: Into<Column>,
    {
        self.finish(JoinCondition::Using(
            columns.into_iter().map(Into::into).collect(),
        ))
    }

    fn finish(self, condition: JoinCondition) -> Join {
        Join {
            kind: self.kind,
            left: self.left,
            right: self.right,
            condition,
        }
    }
}
