//! # strata
//!
//! A small ORM core: entity metadata, an expression tree, a dialect-aware
//! SQL compiler and an interceptor chain around statement execution.
//!
//! ## Features
//!
//! - **Entity metadata**: `#[derive(Entity)]` plus a per-type model registry
//! - **Expression tree**: columns, predicates, aggregates, raw fragments, subqueries
//! - **Dialects**: standard SQL, MySQL and Postgres, including upserts
//! - **Two resolvers**: reflection or raw field offsets, same results
//! - **Interceptors**: wrap every statement for logging, timing or vetoes
//! - **Transactions**: [`Tx`], [`Db::do_tx`] and [`transaction!`]
//!
//! ## Example
//!
//! ```ignore
//! use strata::prelude::*;
//!
//! #[derive(Debug, Default, Entity)]
//! #[orm(table = "users")]
//! struct User {
//!     id: i64,
//!     #[orm(column = "nick")]
//!     nick_name: String,
//!     age: i32,
//! }
//!
//! let db = Db::open(driver, DbConfig::new().with_dialect(MySql));
//!
//! let adults: Vec<User> = Selector::<User>::new(&db)
//!     .where_([col("age").ge(18)])
//!     .order_by([desc("age")])
//!     .limit(10)
//!     .find_many()
//!     .await?;
//!
//! Inserter::new(&db)
//!     .values([&user])
//!     .on_conflict(["id"])
//!     .update([col("nick_name")])
//!     .exec()
//!     .await?;
//! ```

pub mod builder;
pub mod db;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod interceptor;
pub mod model;
pub mod naming;
pub mod prelude;
pub mod query;
pub mod reflect;
pub mod resolver;
pub mod session;
pub mod statement;
pub mod table;
pub mod transaction;
pub mod value;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use db::{Db, DbConfig, Orm};
pub use dialect::{Dialect, MySql, Postgres, StandardSql};
pub use error::{OrmError, OrmResult};
pub use interceptor::{Interceptor, Next, StatementContext};
pub use model::{Model, ModelOption, Registry};
pub use query::{Deleter, Inserter, Raw, Selector, Updater};
pub use reflect::{Entity, Reflect};
pub use resolver::ResolverKind;
pub use session::{Driver, DriverTx, ExecResult, Row, Rows, Session};
pub use statement::{Statement, StatementKind};
pub use table::Table;
pub use transaction::Tx;
pub use value::Value;

#[cfg(feature = "derive")]
pub use strata_derive::Entity;
