use crate::builder::Builder;
use crate::db::Orm;
use crate::error::{OrmError, OrmResult};
use crate::expr::{Column, Expr, OrderBy, Predicate, Selectable, SubQuery};
use crate::reflect::Entity;
use crate::statement::{Statement, StatementKind};
use crate::table::{Table, TableRef};
use std::marker::PhantomData;

/// The clauses of a SELECT, independent of the result type.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    pub(crate) from: TableRef,
    pub(crate) columns: Vec<Selectable>,
    pub(crate) distinct: bool,
    pub(crate) where_: Vec<Predicate>,
    pub(crate) group_by: Vec<Column>,
    pub(crate) having: Vec<Predicate>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl SelectQuery {
    pub fn new(from: impl Into<TableRef>) -> Self {
        Self {
            from: from.into(),
            columns: Vec::new(),
            distinct: false,
            where_: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

/// SELECT executor returning `T`.
///
/// # Example
///
/// ```ignore
/// use strata::expr::{col, desc};
///
/// let users: Vec<User> = Selector::<User>::new(&db)
///     .where_([col("Age").ge(18)])
///     .order_by([desc("Age")])
///     .limit(10)
///     .find_many()
///     .await?;
/// ```
pub struct Selector<'a, T> {
    orm: &'a dyn Orm,
    query: SelectQuery,
    /// First invalid select-list item, reported by `build()`
    build_error: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Entity> Selector<'a, T> {
    /// SELECT from the table of `T`.
    pub fn new(orm: &'a dyn Orm) -> Self {
        Self {
            orm,
            query: SelectQuery::new(Table::of::<T>()),
            build_error: None,
            _marker: PhantomData,
        }
    }

    /// Replace the FROM source (aliased table, join or subquery).
    pub fn from(mut self, table: impl Into<TableRef>) -> Self {
        self.query.from = table.into();
        self
    }

    /// Select specific items instead of `*`.
    pub fn select<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Selectable>,
    {
        self.query.columns.extend(items.into_iter().map(Into::into));
        self
    }

    /// Select arbitrary expressions; non-selectable ones fail at `build()`.
    pub fn select_expr(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        for expr in exprs {
            match Selectable::try_from(expr) {
                Ok(item) => self.query.columns.push(item),
                Err(err) => {
                    if self.build_error.is_none() {
                        self.build_error = Some(err.to_string());
                    }
                }
            }
        }
        self
    }

    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    /// Add WHERE predicates; all predicates are AND-ed.
    pub fn where_(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.query.where_.extend(predicates);
        self
    }

    pub fn group_by<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Column>,
    {
        self.query
            .group_by
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add HAVING predicates; requires `group_by`.
    pub fn having(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.query.having.extend(predicates);
        self
    }

    pub fn order_by(mut self, items: impl IntoIterator<Item = OrderBy>) -> Self {
        self.query.order_by.extend(items);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Use this query as a subquery of another statement.
    pub fn as_subquery(self) -> SubQuery {
        SubQuery::new(self.query)
    }

    pub fn build(&self) -> OrmResult<Statement> {
        if let Some(message) = &self.build_error {
            return Err(OrmError::UnsupportedExpression(message.clone()));
        }
        let core = self.orm.core();
        let mut b = Builder::new(core.registry(), core.dialect());
        b.compile_select(&self.query)?;
        Ok(b.finish())
    }

    /// Fetch the first row; [`OrmError::NoEligibleRow`] if there is none.
    pub async fn find_one(self) -> OrmResult<T> {
        let statement = self.build()?;
        super::find_one(self.orm, StatementKind::Select, statement).await
    }

    pub async fn find_many(self) -> OrmResult<Vec<T>> {
        let statement = self.build()?;
        super::find_many(self.orm, StatementKind::Select, statement).await
    }
}
