mod common;

use common::{Call, MockDriver, TestModel};
use strata::expr::col;
use strata::{Db, Deleter, MySql, OrmError, OrmResult, Selector, Value};

fn setup() -> (MockDriver, Db) {
    let driver = MockDriver::new();
    let db = Db::with_dialect(driver.clone(), MySql);
    (driver, db)
}

fn delete_call() -> Call {
    Call::Execute(
        "DELETE FROM `test_model` WHERE `id` = ?;".to_string(),
        vec![Value::Int(1)],
    )
}

#[tokio::test]
async fn do_tx_commits_on_success() {
    let (driver, db) = setup();

    let affected = db
        .do_tx(|tx| {
            Box::pin(async move {
                let res = Deleter::<TestModel>::new(tx)
                    .where_([col("id").eq(1)])
                    .exec()
                    .await?;
                res.rows_affected()
            })
        })
        .await
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(driver.calls(), vec![Call::Begin, delete_call(), Call::Commit]);
}

#[tokio::test]
async fn do_tx_rolls_back_on_error() {
    let (driver, db) = setup();

    let err = db
        .do_tx(|tx| {
            Box::pin(async move {
                Selector::<TestModel>::new(tx).find_one().await?;
                Ok(())
            })
        })
        .await
        .unwrap_err();

    assert!(err.is_no_eligible_row());
    assert_eq!(driver.calls().first(), Some(&Call::Begin));
    assert_eq!(driver.calls().last(), Some(&Call::Rollback));
}

#[tokio::test]
async fn failed_rollback_reports_both_errors() {
    let (driver, db) = setup();
    driver.fail_rollback();

    let err = db
        .do_tx(|_tx| Box::pin(async move { Err::<(), _>(OrmError::Other("boom".to_string())) }))
        .await
        .unwrap_err();

    assert!(err.is_rollback());
    let message = err.to_string();
    assert!(message.contains("boom"), "{message}");
    assert!(message.contains("connection lost"), "{message}");
}

async fn macro_commit(db: &Db) -> OrmResult<u64> {
    strata::transaction!(db, tx, {
        let res = Deleter::<TestModel>::new(&tx)
            .where_([col("id").eq(1)])
            .exec()
            .await?;
        res.rows_affected()
    })
}

async fn macro_rollback(db: &Db) -> OrmResult<()> {
    strata::transaction!(db, tx, {
        Deleter::<TestModel>::new(&tx)
            .where_([col("id").eq(1)])
            .exec()
            .await?;
        Err(OrmError::Other("abort".to_string()))
    })
}

#[tokio::test]
async fn transaction_macro_commits_and_rolls_back() {
    let (driver, db) = setup();
    assert_eq!(macro_commit(&db).await.unwrap(), 1);
    assert_eq!(driver.calls(), vec![Call::Begin, delete_call(), Call::Commit]);

    let (driver, db) = setup();
    let err = macro_rollback(&db).await.unwrap_err();
    assert!(matches!(err, OrmError::Other(m) if m == "abort"));
    assert_eq!(
        driver.calls(),
        vec![Call::Begin, delete_call(), Call::Rollback]
    );
}

#[tokio::test]
async fn explicit_tx_handle() {
    let (driver, db) = setup();
    let tx = db.begin().await.unwrap();
    Deleter::<TestModel>::new(&tx)
        .where_([col("id").eq(1)])
        .exec()
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert_eq!(driver.calls(), vec![Call::Begin, delete_call(), Call::Commit]);
}
