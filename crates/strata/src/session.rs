//! Driver contract: the database side of statement execution.
//!
//! strata compiles statements; a [`Driver`] runs them. Implement these traits
//! to plug in a database client. The `postgres` feature ships one for
//! tokio-postgres.

use crate::error::OrmResult;
use crate::value::Value;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Something that can run compiled SQL: a connection or a transaction.
#[async_trait]
pub trait Session: Send + Sync {
    /// Run a statement that returns rows.
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows>;

    /// Run a statement that returns no rows.
    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult>;
}

/// A database connection that can open transactions.
#[async_trait]
pub trait Driver: Session {
    async fn begin(&self) -> OrmResult<Box<dyn DriverTx>>;
}

/// An open driver transaction; consumed by commit or rollback.
#[async_trait]
pub trait DriverTx: Session {
    async fn commit(self: Box<Self>) -> OrmResult<()>;

    async fn rollback(self: Box<Self>) -> OrmResult<()>;
}

/// Result rows with shared column names.
#[derive(Debug, Clone, Default)]
pub struct Rows {
    columns: Arc<[String]>,
    undecodable: Arc<[Option<String>]>,
    rows: Vec<Row>,
}

impl Rows {
    /// Build from column names and per-row values.
    ///
    /// Every row must have one value per column.
    pub fn new<I, S>(columns: I, values: Vec<Vec<Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_undecodable(columns, Vec::new(), values)
    }

    /// Like [`Rows::new`], plus the reason for every column the driver could
    /// not decode (`None` for decoded columns; an empty list means all were).
    ///
    /// Undecodable columns hold `Value::Null`. Resolvers skip them unless
    /// they map to a field, which fails with `Decode`.
    pub fn with_undecodable<I, S>(
        columns: I,
        undecodable: Vec<Option<String>>,
        values: Vec<Vec<Value>>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Arc<[String]> = columns.into_iter().map(Into::into).collect();
        let undecodable: Arc<[Option<String>]> = undecodable.into();
        let rows = values
            .into_iter()
            .map(|values| Row {
                columns: Arc::clone(&columns),
                undecodable: Arc::clone(&undecodable),
                values,
            })
            .collect();
        Self {
            columns,
            undecodable,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Why column `idx` could not be decoded, if it could not.
    pub fn undecodable(&self, idx: usize) -> Option<&str> {
        self.undecodable.get(idx)?.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// One result row.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    undecodable: Arc<[Option<String>]>,
    values: Vec<Value>,
}

impl Row {
    /// Value of a column by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// `(column, value)` pairs in result order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Why column `idx` could not be decoded, if it could not.
    pub fn undecodable(&self, idx: usize) -> Option<&str> {
        self.undecodable.get(idx)?.as_deref()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Driver-specific outcome of a non-query statement.
pub trait DriverResult: Send + Sync {
    fn rows_affected(&self) -> OrmResult<u64>;

    fn last_insert_id(&self) -> OrmResult<i64>;
}

/// Outcome of an executed statement.
///
/// Both accessors are evaluated on demand and fail independently.
#[derive(Clone)]
pub struct ExecResult {
    inner: Arc<dyn DriverResult>,
}

impl ExecResult {
    pub fn new(result: impl DriverResult + 'static) -> Self {
        Self {
            inner: Arc::new(result),
        }
    }

    /// Plain counts, for drivers that report both eagerly.
    pub fn from_counts(rows_affected: u64, last_insert_id: Option<i64>) -> Self {
        Self::new(Counts {
            rows_affected,
            last_insert_id,
        })
    }

    pub fn rows_affected(&self) -> OrmResult<u64> {
        self.inner.rows_affected()
    }

    pub fn last_insert_id(&self) -> OrmResult<i64> {
        self.inner.last_insert_id()
    }
}

impl fmt::Debug for ExecResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecResult").finish_non_exhaustive()
    }
}

struct Counts {
    rows_affected: u64,
    last_insert_id: Option<i64>,
}

impl DriverResult for Counts {
    fn rows_affected(&self) -> OrmResult<u64> {
        Ok(self.rows_affected)
    }

    fn last_insert_id(&self) -> OrmResult<i64> {
        self.last_insert_id
            .ok_or_else(|| crate::OrmError::driver("driver did not report a last insert id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_lookup_by_column() {
        let rows = Rows::new(["id", "name"], vec![vec![Value::Int(1), Value::from("a")]]);
        let row = rows.iter().next().unwrap();
        assert_eq!(row.get("name"), Some(&Value::from("a")));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.iter().count(), 2);
    }

    #[test]
    fn exec_result_accessors_fail_independently() {
        let result = ExecResult::from_counts(3, None);
        assert_eq!(result.rows_affected().unwrap(), 3);
        assert!(result.last_insert_id().is_err());
    }
}
