use crate::db::Orm;
use crate::error::OrmResult;
use crate::reflect::Entity;
use crate::session::ExecResult;
use crate::statement::{Statement, StatementKind};
use crate::value::Value;

/// Hand-written SQL with bound arguments.
///
/// The SQL is sent verbatim; placeholders must match the dialect.
///
/// # Example
///
/// ```ignore
/// let user: User = Raw::new(&db, "SELECT * FROM `user` WHERE `id` = ?")
///     .bind(42_i64)
///     .find_one()
///     .await?;
/// ```
pub struct Raw<'a> {
    orm: &'a dyn Orm,
    sql: String,
    args: Vec<Value>,
}

impl<'a> Raw<'a> {
    pub fn new(orm: &'a dyn Orm, sql: impl Into<String>) -> Self {
        Self {
            orm,
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Bind the next argument.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Bind several arguments in order.
    pub fn bind_all<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn build(&self) -> OrmResult<Statement> {
        Ok(Statement::new(self.sql.clone(), self.args.clone()))
    }

    pub async fn exec(self) -> OrmResult<ExecResult> {
        let statement = self.build()?;
        super::exec(self.orm, StatementKind::Raw, statement, None).await
    }

    /// Fetch the first row; [`OrmError::NoEligibleRow`](crate::OrmError::NoEligibleRow)
    /// if there is none.
    pub async fn find_one<T: Entity>(self) -> OrmResult<T> {
        let statement = self.build()?;
        super::find_one(self.orm, StatementKind::Raw, statement).await
    }

    pub async fn find_many<T: Entity>(self) -> OrmResult<Vec<T>> {
        let statement = self.build()?;
        super::find_many(self.orm, StatementKind::Raw, statement).await
    }
}
