use crate::builder::Builder;
use crate::db::Orm;
use crate::error::OrmResult;
use crate::expr::Predicate;
use crate::reflect::Entity;
use crate::session::ExecResult;
use crate::statement::{Statement, StatementKind};
use crate::table::Table;
use std::marker::PhantomData;

/// DELETE executor for the table of `T`.
pub struct Deleter<'a, T> {
    orm: &'a dyn Orm,
    where_: Vec<Predicate>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Entity> Deleter<'a, T> {
    pub fn new(orm: &'a dyn Orm) -> Self {
        Self {
            orm,
            where_: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn where_(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.where_.extend(predicates);
        self
    }

    pub fn build(&self) -> OrmResult<Statement> {
        let core = self.orm.core();
        let model = core.registry().get::<T>()?;

        let mut b = Builder::new(core.registry(), core.dialect());
        b.set_scope(Table::of::<T>().into());
        b.write_str("DELETE FROM ");
        b.quote_ident(model.table_name());
        b.compile_condition("WHERE", &self.where_)?;
        Ok(b.finish())
    }

    pub async fn exec(self) -> OrmResult<ExecResult> {
        let statement = self.build()?;
        let table = super::table_of::<T>(self.orm)?;
        super::exec(self.orm, StatementKind::Delete, statement, Some(table)).await
    }
}
