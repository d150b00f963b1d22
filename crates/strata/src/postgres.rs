//! tokio-postgres driver adapter (feature `postgres`).
//!
//! ```ignore
//! use strata::{Db, dialect::Postgres, postgres::PgDriver};
//! use tokio_postgres::NoTls;
//!
//! let (client, connection) = tokio_postgres::connect("postgres://...", NoTls).await?;
//! tokio::spawn(async move { let _ = connection.await; });
//!
//! let db = Db::with_dialect(PgDriver::new(client), Postgres);
//! ```
//!
//! A transaction holds the connection exclusively from `BEGIN` until
//! `COMMIT`/`ROLLBACK`: statements issued through the [`Db`](crate::Db) in
//! the meantime wait for it, so inside a transaction use the `Tx` handle. A
//! `Tx` dropped unfinished is rolled back before the connection's next
//! statement.

use crate::error::{OrmError, OrmResult};
use crate::session::{Driver, DriverResult, DriverTx, ExecResult, Rows, Session};
use crate::value::Value;
use async_trait::async_trait;
use bytes::BytesMut;
use std::error::Error;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_postgres::Client;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int(v) => int_to_sql(*v, ty, out),
            Value::UInt(v) => int_to_sql(i64::try_from(*v)?, ty, out),
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    // narrows like a `::float4` cast
                    (*v as f32).to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => {
                if *ty == Type::TIMESTAMP {
                    v.naive_utc().to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Encode an integer in the width the server expects.
fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::CHAR => i8::try_from(v)?.to_sql(ty, out),
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 => (exact_float(v, F32_EXACT, ty)? as f32).to_sql(ty, out),
        Type::FLOAT8 => (exact_float(v, F64_EXACT, ty)? as f64).to_sql(ty, out),
        _ => v.to_sql(ty, out),
    }
}

// Largest magnitudes below which every integer has an exact float encoding.
const F32_EXACT: u64 = 1 << f32::MANTISSA_DIGITS;
const F64_EXACT: u64 = 1 << f64::MANTISSA_DIGITS;

fn exact_float(v: i64, limit: u64, ty: &Type) -> Result<i64, BoxError> {
    if v.unsigned_abs() > limit {
        return Err(format!("integer {v} has no exact {ty} representation").into());
    }
    Ok(v)
}

fn is_supported(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::BOOL
            | Type::CHAR
            | Type::INT2
            | Type::INT4
            | Type::INT8
            | Type::OID
            | Type::FLOAT4
            | Type::FLOAT8
            | Type::TEXT
            | Type::VARCHAR
            | Type::BPCHAR
            | Type::NAME
            | Type::UNKNOWN
            | Type::BYTEA
            | Type::TIMESTAMPTZ
            | Type::TIMESTAMP
            | Type::UUID
            | Type::JSON
            | Type::JSONB
    )
}

/// Reason a column of type `ty` cannot become a [`Value`], if it cannot.
fn undecodable_reason(ty: &Type) -> Option<String> {
    (!is_supported(ty)).then(|| format!("unsupported postgres type {ty}"))
}

fn decode_column(row: &tokio_postgres::Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();
    let err = |e: tokio_postgres::Error| OrmError::decode(column.name(), e.to_string());

    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map_err(err)?.into(),
        Type::CHAR => row.try_get::<_, Option<i8>>(idx).map_err(err)?.into(),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx).map_err(err)?.into(),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx).map_err(err)?.into(),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map_err(err)?.into(),
        Type::OID => row.try_get::<_, Option<u32>>(idx).map_err(err)?.into(),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx).map_err(err)?.into(),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map_err(err)?.into(),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            row.try_get::<_, Option<String>>(idx).map_err(err)?.into()
        }
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx).map_err(err)?.into(),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .map_err(err)?
            .into(),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .map_err(err)?
            .map(|t| t.and_utc())
            .into(),
        Type::UUID => row.try_get::<_, Option<uuid::Uuid>>(idx).map_err(err)?.into(),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .map_err(err)?
            .into(),
        // reported through `Rows::undecodable`
        _ => Value::Null,
    };
    Ok(value)
}

fn convert_rows(rows: Vec<tokio_postgres::Row>) -> OrmResult<Rows> {
    let Some(first) = rows.first() else {
        return Ok(Rows::default());
    };
    let columns: Vec<String> = first.columns().iter().map(|c| c.name().to_string()).collect();
    let undecodable: Vec<Option<String>> = first
        .columns()
        .iter()
        .map(|c| undecodable_reason(c.type_()))
        .collect();
    let values = rows
        .iter()
        .map(|row| (0..row.len()).map(|idx| decode_column(row, idx)).collect())
        .collect::<OrmResult<Vec<Vec<Value>>>>()?;
    Ok(Rows::with_undecodable(columns, undecodable, values))
}

async fn query(client: &Client, sql: &str, args: &[Value]) -> OrmResult<Rows> {
    let params: Vec<&(dyn ToSql + Sync)> = args.iter().map(|v| v as _).collect();
    let rows = client.query(sql, &params).await?;
    convert_rows(rows)
}

async fn execute(
    client: &Client,
    sql: &str,
    args: &[Value],
) -> OrmResult<ExecResult> {
    let params: Vec<&(dyn ToSql + Sync)> = args.iter().map(|v| v as _).collect();
    let rows_affected = client.execute(sql, &params).await?;
    Ok(ExecResult::new(PgExecResult { rows_affected }))
}

struct PgExecResult {
    rows_affected: u64,
}

impl DriverResult for PgExecResult {
    fn rows_affected(&self) -> OrmResult<u64> {
        Ok(self.rows_affected)
    }

    fn last_insert_id(&self) -> OrmResult<i64> {
        Err(OrmError::driver(
            "postgres does not report a last insert id; use RETURNING",
        ))
    }
}

/// A connection handed to one holder at a time.
///
/// Remembers when a holder gave it up inside a transaction, so the next
/// holder can roll that transaction back first.
struct Exclusive<C> {
    conn: Arc<Mutex<C>>,
    abandoned: Arc<AtomicBool>,
}

impl<C> Clone for Exclusive<C> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            abandoned: Arc::clone(&self.abandoned),
        }
    }
}

impl<C> Exclusive<C> {
    fn new(conn: C) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            abandoned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Wait for the connection. The flag is `true` if the previous holder
    /// left a transaction open.
    async fn acquire(&self) -> (Lease<C>, bool) {
        let conn = Arc::clone(&self.conn).lock_owned().await;
        let abandoned = self.abandoned.swap(false, Ordering::AcqRel);
        let lease = Lease {
            conn,
            abandoned: Arc::clone(&self.abandoned),
            in_tx: false,
        };
        (lease, abandoned)
    }
}

struct Lease<C> {
    conn: OwnedMutexGuard<C>,
    abandoned: Arc<AtomicBool>,
    in_tx: bool,
}

impl<C> Deref for Lease<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.conn
    }
}

impl<C> Drop for Lease<C> {
    fn drop(&mut self) {
        if self.in_tx {
            self.abandoned.store(true, Ordering::Release);
        }
    }
}

/// [`Driver`] over a `tokio_postgres::Client`.
///
/// Clones share the connection.
#[derive(Clone)]
pub struct PgDriver {
    conn: Exclusive<Client>,
}

impl PgDriver {
    pub fn new(client: Client) -> Self {
        Self {
            conn: Exclusive::new(client),
        }
    }

    async fn lease(&self) -> OrmResult<Lease<Client>> {
        let (mut lease, abandoned) = self.conn.acquire().await;
        if abandoned {
            tracing::warn!(
                target: "strata.sql",
                "rolling back transaction dropped without commit or rollback"
            );
            // stays flagged until the rollback succeeds
            lease.in_tx = true;
            lease.batch_execute("ROLLBACK").await?;
            lease.in_tx = false;
        }
        Ok(lease)
    }
}

#[async_trait]
impl Session for PgDriver {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows> {
        let client = self.lease().await?;
        query(&client, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let client = self.lease().await?;
        execute(&client, sql, args).await
    }
}

#[async_trait]
impl Driver for PgDriver {
    async fn begin(&self) -> OrmResult<Box<dyn DriverTx>> {
        let mut lease = self.lease().await?;
        lease.batch_execute("BEGIN").await?;
        lease.in_tx = true;
        Ok(Box::new(PgTx { lease }))
    }
}

struct PgTx {
    lease: Lease<Client>,
}

impl PgTx {
    async fn finish(self, sql: &str) -> OrmResult<()> {
        let mut lease = self.lease;
        lease.batch_execute(sql).await?;
        lease.in_tx = false;
        Ok(())
    }
}

#[async_trait]
impl Session for PgTx {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows> {
        query(&self.lease, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        execute(&self.lease, sql, args).await
    }
}

#[async_trait]
impl DriverTx for PgTx {
    async fn commit(self: Box<Self>) -> OrmResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(self: Box<Self>) -> OrmResult<()> {
        self.finish("ROLLBACK").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: Value, ty: &Type) -> Result<IsNull, BoxError> {
        value.to_sql_checked(ty, &mut BytesMut::new())
    }

    #[test]
    fn integers_are_range_checked() {
        assert!(encode(Value::Int(12), &Type::INT2).is_ok());
        assert!(encode(Value::Int(1 << 40), &Type::INT4).is_err());
        assert!(encode(Value::UInt(u64::MAX), &Type::INT8).is_err());
        assert!(matches!(encode(Value::Null, &Type::INT8), Ok(IsNull::Yes)));
    }

    #[test]
    fn integers_to_floats_must_be_exact() {
        assert!(encode(Value::Int(1 << 53), &Type::FLOAT8).is_ok());
        assert!(encode(Value::Int(-(1 << 53)), &Type::FLOAT8).is_ok());
        assert!(encode(Value::Int((1 << 53) + 1), &Type::FLOAT8).is_err());
        assert!(encode(Value::Int(i64::MAX), &Type::FLOAT8).is_err());

        assert!(encode(Value::Int(1 << 24), &Type::FLOAT4).is_ok());
        assert!(encode(Value::Int((1 << 24) + 1), &Type::FLOAT4).is_err());
    }

    #[test]
    fn unsupported_types_are_reported_not_fatal() {
        assert_eq!(undecodable_reason(&Type::INT8), None);
        assert_eq!(undecodable_reason(&Type::JSONB), None);
        assert_eq!(
            undecodable_reason(&Type::NUMERIC).as_deref(),
            Some("unsupported postgres type numeric")
        );
        assert!(undecodable_reason(&Type::INET).is_some());
        assert!(undecodable_reason(&Type::INT4_ARRAY).is_some());
    }

    #[tokio::test]
    async fn lease_is_exclusive() {
        let conn = Exclusive::new(0_u32);
        let (lease, _) = conn.acquire().await;
        assert!(conn.conn.try_lock().is_err());
        drop(lease);
        assert!(conn.conn.try_lock().is_ok());
    }

    #[tokio::test]
    async fn dropped_transaction_is_flagged_once() {
        let conn = Exclusive::new(0_u32);

        let (mut lease, abandoned) = conn.acquire().await;
        assert!(!abandoned);
        lease.in_tx = true;
        drop(lease);

        let (lease, abandoned) = conn.acquire().await;
        assert!(abandoned);
        drop(lease);

        let (_lease, abandoned) = conn.acquire().await;
        assert!(!abandoned);
    }
}
