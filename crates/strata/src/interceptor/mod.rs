//! Interceptor chain wrapping statement execution.
//!
//! Every executed statement passes through the interceptors configured on
//! the [`Db`](crate::Db), outermost first, before it reaches the session.
//! An interceptor may inspect the statement, short-circuit with an error, or
//! call [`Next::run`] and observe the outcome.
//!
//! # Example
//!
//! ```ignore
//! use strata::interceptor::{Interceptor, Next, Outcome, StatementContext};
//! use strata::OrmResult;
//!
//! struct CountStatements(std::sync::atomic::AtomicUsize);
//!
//! #[async_trait::async_trait]
//! impl Interceptor for CountStatements {
//!     async fn intercept(&self, ctx: &StatementContext, next: Next<'_>) -> OrmResult<Outcome> {
//!         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         next.run(ctx).await
//!     }
//! }
//! ```

mod safe_delete;
mod slow_query;
mod span;
mod statement_log;
mod stats;

pub use safe_delete::SafeDeleteInterceptor;
pub use slow_query::SlowQueryInterceptor;
pub use span::SpanInterceptor;
pub use statement_log::StatementLogInterceptor;
pub use stats::{StatementStats, StatsInterceptor, StatsKey};

use crate::error::{OrmError, OrmResult};
use crate::session::{ExecResult, Rows, Session};
use crate::statement::{Statement, StatementKind};
use async_trait::async_trait;
use std::sync::Arc;

/// How the session should run the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Query,
    Execute,
}

/// The statement travelling through the chain.
#[derive(Debug, Clone)]
pub struct StatementContext {
    pub kind: StatementKind,
    pub mode: ExecMode,
    pub statement: Statement,
    /// Table of the entity the statement was built for; `None` for raw
    /// statements that decode nothing.
    pub table: Option<String>,
}

impl StatementContext {
    pub fn new(kind: StatementKind, mode: ExecMode, statement: Statement) -> Self {
        Self {
            kind,
            mode,
            statement,
            table: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.statement.sql
    }
}

/// Result of running a statement.
#[derive(Debug)]
pub enum Outcome {
    Rows(Rows),
    Exec(ExecResult),
}

impl Outcome {
    pub fn into_rows(self) -> OrmResult<Rows> {
        match self {
            Outcome::Rows(rows) => Ok(rows),
            Outcome::Exec(_) => Err(OrmError::Other(
                "interceptor returned an exec result for a query".to_string(),
            )),
        }
    }

    pub fn into_exec(self) -> OrmResult<ExecResult> {
        match self {
            Outcome::Exec(result) => Ok(result),
            Outcome::Rows(_) => Err(OrmError::Other(
                "interceptor returned rows for an exec statement".to_string(),
            )),
        }
    }
}

/// A link in the execution chain.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, ctx: &StatementContext, next: Next<'_>) -> OrmResult<Outcome>;
}

/// The rest of the chain after the current interceptor.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Interceptor>],
    session: &'a dyn Session,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Interceptor>], session: &'a dyn Session) -> Self {
        Self { chain, session }
    }

    /// Pass the statement to the next interceptor, or to the session at the
    /// end of the chain.
    pub async fn run(self, ctx: &StatementContext) -> OrmResult<Outcome> {
        match self.chain.split_first() {
            Some((head, rest)) => head.intercept(ctx, Next::new(rest, self.session)).await,
            None => {
                let Statement { sql, args } = &ctx.statement;
                match ctx.mode {
                    ExecMode::Query => self.session.query(sql, args).await.map(Outcome::Rows),
                    ExecMode::Execute => self.session.execute(sql, args).await.map(Outcome::Exec),
                }
            }
        }
    }
}

pub(crate) fn truncate_sql(sql: &str, max_bytes: Option<usize>) -> String {
    match max_bytes {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while end > 0 && !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end])
        }
        _ => sql.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql("SELECT 1", Some(100)), "SELECT 1");
        assert_eq!(truncate_sql("SELECT 1", Some(6)), "SELECT...");
        assert_eq!(truncate_sql("é", Some(1)), "...");
        assert_eq!(truncate_sql("SELECT 1", None), "SELECT 1");
    }
}
