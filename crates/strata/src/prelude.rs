//! Convenient imports for typical `strata` usage.
//!
//! ```ignore
//! use strata::prelude::*;
//! ```

pub use crate::expr::{
    all, any, asc, assign, avg, col, count, desc, exists, max, min, not, not_exists, raw, some,
    sum,
};
pub use crate::{
    Db, DbConfig, Deleter, Entity, Inserter, MySql, OrmError, OrmResult, Postgres, Raw,
    ResolverKind, Selector, StandardSql, Table, Tx, Updater, Value,
};
