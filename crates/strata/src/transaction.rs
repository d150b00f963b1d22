//! Transactions: [`Tx`], [`Db::do_tx`] and the [`transaction!`] macro.
//!
//! A [`Tx`] implements [`Orm`], so every executor accepts it in place of a
//! [`Db`]. Dropping a `Tx` without commit or rollback leaves the outcome to
//! the driver.
//!
//! # Example
//!
//! ```ignore
//! use strata::{Db, OrmResult, Selector, Updater, expr::{assign, col}};
//!
//! # async fn demo(db: &Db) -> OrmResult<()> {
//! strata::transaction!(db, tx, {
//!     let user = Selector::<User>::new(&tx).where_([col("Id").eq(1)]).find_one().await?;
//!     Updater::<User>::new(&tx)
//!         .set([assign("Balance", user.balance - 100)])
//!         .where_([col("Id").eq(1)])
//!         .exec()
//!         .await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

use crate::db::{Core, Db, Orm};
use crate::error::{OrmError, OrmResult};
use crate::session::{DriverTx, Session};
use futures_core::future::BoxFuture;

/// Runs the given block inside a transaction begun on `$db`.
///
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`; if the rollback fails too, the result is
///   [`OrmError::Rollback`] carrying both errors.
///
/// The block must evaluate to `strata::OrmResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($db:expr, $tx:ident, $body:block) => {{
        let $tx = ($db).begin().await?;

        let __strata_tx_body_result: $crate::OrmResult<_> = async { $body }.await;
        match __strata_tx_body_result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::OrmError::rollback(error, rollback_err)),
            },
        }
    }};
}

/// An open transaction.
pub struct Tx {
    core: Core,
    inner: Box<dyn DriverTx>,
}

impl std::fmt::Debug for Tx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx")
            .field("dialect", &self.core.dialect().name())
            .finish_non_exhaustive()
    }
}

impl Tx {
    pub(crate) fn new(core: Core, inner: Box<dyn DriverTx>) -> Self {
        Self { core, inner }
    }

    pub async fn commit(self) -> OrmResult<()> {
        self.inner.commit().await
    }

    pub async fn rollback(self) -> OrmResult<()> {
        self.inner.rollback().await
    }
}

impl Orm for Tx {
    fn core(&self) -> &Core {
        &self.core
    }

    fn session(&self) -> &dyn Session {
        &*self.inner
    }
}

impl Db {
    /// Run `f` in a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// ```ignore
    /// let id = db
    ///     .do_tx(|tx| Box::pin(async move {
    ///         Inserter::new(tx).values([&user]).exec().await?;
    ///         Ok(user.id)
    ///     }))
    ///     .await?;
    /// ```
    pub async fn do_tx<R, F>(&self, f: F) -> OrmResult<R>
    where
        F: for<'t> FnOnce(&'t Tx) -> BoxFuture<'t, OrmResult<R>>,
    {
        let tx = self.begin().await?;
        let result = f(&tx).await;
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(error) => match tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => {
                    tracing::error!(
                        target: "strata.sql",
                        error = %error,
                        rollback_error = %rollback_err,
                        "transaction rollback failed"
                    );
                    Err(OrmError::rollback(error, rollback_err))
                }
            },
        }
    }
}
