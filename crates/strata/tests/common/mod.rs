//! Shared fixtures: a scripted in-memory driver and test entities.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use strata::session::{Driver, DriverTx, ExecResult, Rows, Session};
use strata::{Entity, OrmError, OrmResult, Value};

#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct TestModel {
    pub id: i64,
    pub first_name: String,
    pub age: i8,
    pub last_name: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct OrderItem {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
}

/// A call observed by [`MockDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query(String, Vec<Value>),
    Execute(String, Vec<Value>),
    Begin,
    Commit,
    Rollback,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    rows: VecDeque<Rows>,
    last_insert_id: Option<i64>,
    fail_execute: bool,
    fail_rollback: bool,
}

/// Records every statement and answers queries from a queue of canned rows.
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<State>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next query.
    pub fn push_rows(&self, rows: Rows) {
        self.state.lock().unwrap().rows.push_back(rows);
    }

    pub fn set_last_insert_id(&self, id: i64) {
        self.state.lock().unwrap().last_insert_id = Some(id);
    }

    pub fn fail_execute(&self) {
        self.state.lock().unwrap().fail_execute = true;
    }

    pub fn fail_rollback(&self) {
        self.state.lock().unwrap().fail_rollback = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// SQL of every query or execute call, in order.
    pub fn statements(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Query(sql, _) | Call::Execute(sql, _) => Some(sql),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn run_query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows> {
        self.record(Call::Query(sql.to_string(), args.to_vec()));
        Ok(self
            .state
            .lock()
            .unwrap()
            .rows
            .pop_front()
            .unwrap_or_default())
    }

    fn run_execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.record(Call::Execute(sql.to_string(), args.to_vec()));
        let state = self.state.lock().unwrap();
        if state.fail_execute {
            return Err(OrmError::driver("execute failed"));
        }
        Ok(ExecResult::from_counts(1, state.last_insert_id))
    }
}

#[async_trait]
impl Session for MockDriver {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows> {
        self.run_query(sql, args)
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.run_execute(sql, args)
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn begin(&self) -> OrmResult<Box<dyn DriverTx>> {
        self.record(Call::Begin);
        Ok(Box::new(MockTx {
            driver: self.clone(),
        }))
    }
}

struct MockTx {
    driver: MockDriver,
}

#[async_trait]
impl Session for MockTx {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows> {
        self.driver.run_query(sql, args)
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.driver.run_execute(sql, args)
    }
}

#[async_trait]
impl DriverTx for MockTx {
    async fn commit(self: Box<Self>) -> OrmResult<()> {
        self.driver.record(Call::Commit);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> OrmResult<()> {
        self.driver.record(Call::Rollback);
        if self.driver.state.lock().unwrap().fail_rollback {
            return Err(OrmError::driver("connection lost"));
        }
        Ok(())
    }
}

/// Rows for [`TestModel`] in column order `id, first_name, age, last_name`.
pub fn test_model_rows(models: &[TestModel]) -> Rows {
    Rows::new(
        ["id", "first_name", "age", "last_name"],
        models
            .iter()
            .map(|m| {
                vec![
                    Value::Int(m.id),
                    Value::Text(m.first_name.clone()),
                    Value::Int(m.age.into()),
                    m.last_name.clone().into(),
                ]
            })
            .collect(),
    )
}
