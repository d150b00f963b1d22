//! Statement executors: fluent builders that compile, run and decode.
//!
//! Each executor borrows an [`Orm`] handle ([`Db`](crate::Db) or
//! [`Tx`](crate::Tx)), accumulates clauses, and on `build()` compiles them
//! into a [`Statement`]. The `find_*` / `exec` methods send that statement
//! through the interceptor chain to the session.

mod delete;
mod insert;
mod raw;
mod select;
mod update;

pub use delete::Deleter;
pub use insert::{Inserter, OnConflict, OnConflictBuilder};
pub use raw::Raw;
pub use select::{SelectQuery, Selector};
pub use update::Updater;

use crate::db::{Orm, dispatch};
use crate::error::{OrmError, OrmResult};
use crate::interceptor::{ExecMode, StatementContext};
use crate::reflect::{Entity, Reflect};
use crate::resolver::{ValueResolver, decode_rows};
use crate::session::ExecResult;
use crate::statement::{Statement, StatementKind};

/// Table label for statements built from `T`.
fn table_of<T: Reflect>(orm: &dyn Orm) -> OrmResult<String> {
    Ok(orm.core().registry().get::<T>()?.table_name().to_string())
}

async fn exec(
    orm: &dyn Orm,
    kind: StatementKind,
    statement: Statement,
    table: Option<String>,
) -> OrmResult<ExecResult> {
    let mut ctx = StatementContext::new(kind, ExecMode::Execute, statement);
    ctx.table = table;
    dispatch(orm, ctx).await?.into_exec()
}

async fn find_many<T: Entity>(
    orm: &dyn Orm,
    kind: StatementKind,
    statement: Statement,
) -> OrmResult<Vec<T>> {
    let core = orm.core();
    let model = core.registry().get::<T>()?;
    let ctx = StatementContext::new(kind, ExecMode::Query, statement).with_table(model.table_name());
    let rows = dispatch(orm, ctx).await?.into_rows()?;
    decode_rows(&core.resolver(), &model, rows)
}

async fn find_one<T: Entity>(
    orm: &dyn Orm,
    kind: StatementKind,
    statement: Statement,
) -> OrmResult<T> {
    let core = orm.core();
    let model = core.registry().get::<T>()?;
    let ctx = StatementContext::new(kind, ExecMode::Query, statement).with_table(model.table_name());
    let rows = dispatch(orm, ctx).await?.into_rows()?;
    let Some(row) = rows.into_iter().next() else {
        return Err(OrmError::NoEligibleRow);
    };
    let mut entity = T::default();
    core.resolver().write_row(&model, &mut entity, &row)?;
    Ok(entity)
}
