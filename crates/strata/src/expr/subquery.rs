use super::Column;
use crate::query::SelectQuery;
use crate::table::{JoinBuilder, JoinKind, TableRef};
use std::sync::Arc;

/// A SELECT used inside another statement: as an operand, a select-list
/// item or a table source.
///
/// Compiled inline with the outer statement so all placeholders share one
/// argument list.
#[derive(Debug, Clone)]
pub struct SubQuery {
    pub(crate) query: Arc<SelectQuery>,
    pub(crate) alias: Option<String>,
}

impl SubQuery {
    pub(crate) fn new(query: SelectQuery) -> Self {
        Self {
            query: Arc::new(query),
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

    /// Reference a column exposed by this subquery.
    pub fn col(&self, field: impl Into<String>) -> Column {
        Column::qualified(TableRef::SubQuery(self.clone()), field)
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
