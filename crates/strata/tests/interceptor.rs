mod common;

use async_trait::async_trait;
use common::{MockDriver, TestModel};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strata::expr::col;
use strata::interceptor::{
    ExecMode, Interceptor, Next, Outcome, SafeDeleteInterceptor, SlowQueryInterceptor,
    SpanInterceptor, StatementContext, StatementLogInterceptor, StatsInterceptor,
};
use strata::session::Rows;
use strata::{Db, DbConfig, Deleter, MySql, OrmError, OrmResult, Raw, Selector, StatementKind};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record as SpanValues};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

struct Record {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Interceptor for Record {
    async fn intercept(&self, ctx: &StatementContext, next: Next<'_>) -> OrmResult<Outcome> {
        self.log.lock().unwrap().push(format!("{} before", self.name));
        let outcome = next.run(ctx).await;
        self.log.lock().unwrap().push(format!("{} after", self.name));
        outcome
    }
}

struct ShortCircuit;

#[async_trait]
impl Interceptor for ShortCircuit {
    async fn intercept(&self, ctx: &StatementContext, _next: Next<'_>) -> OrmResult<Outcome> {
        assert_eq!(ctx.mode, ExecMode::Query);
        Ok(Outcome::Rows(Rows::default()))
    }
}

#[tokio::test]
async fn interceptors_wrap_in_configuration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let driver = MockDriver::new();
    let db = Db::open(
        driver.clone(),
        DbConfig::new()
            .with_dialect(MySql)
            .with_interceptor(Record {
                name: "outer",
                log: log.clone(),
            })
            .with_interceptor(Record {
                name: "inner",
                log: log.clone(),
            }),
    );

    Selector::<TestModel>::new(&db).find_many().await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["outer before", "inner before", "inner after", "outer after"]
    );
    assert_eq!(driver.statements().len(), 1);
}

#[tokio::test]
async fn interceptor_can_skip_the_driver() {
    let driver = MockDriver::new();
    let db = Db::open(
        driver.clone(),
        DbConfig::new().with_dialect(MySql).with_interceptor(ShortCircuit),
    );

    let rows = Selector::<TestModel>::new(&db).find_many().await.unwrap();
    assert!(rows.is_empty());
    assert!(driver.calls().is_empty());
}

#[tokio::test]
async fn safe_delete_rejects_missing_where() {
    let driver = MockDriver::new();
    let db = Db::open(
        driver.clone(),
        DbConfig::new()
            .with_dialect(MySql)
            .with_interceptor(SafeDeleteInterceptor::new()),
    );

    let err = Deleter::<TestModel>::new(&db).exec().await.unwrap_err();
    assert!(err.is_unsafe_delete());
    assert!(driver.calls().is_empty());

    Deleter::<TestModel>::new(&db)
        .where_([col("id").eq(1)])
        .exec()
        .await
        .unwrap();
    assert_eq!(driver.statements(), vec!["DELETE FROM `test_model` WHERE `id` = ?;"]);
}

#[tokio::test]
async fn slow_query_reports_to_callback() {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = hits.clone();
    let slow = SlowQueryInterceptor::new(Duration::ZERO).on_slow_query(move |ctx, _elapsed| {
        assert_eq!(ctx.kind, StatementKind::Select);
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let db = Db::open(
        MockDriver::new(),
        DbConfig::new()
            .with_dialect(MySql)
            .with_interceptor(StatementLogInterceptor::new().max_sql_length(16))
            .with_interceptor(slow),
    );

    Selector::<TestModel>::new(&db).find_many().await.unwrap();
    Selector::<TestModel>::new(&db).find_many().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn driver_errors_propagate_through_the_chain() {
    let driver = MockDriver::new();
    driver.fail_execute();
    let log = Arc::new(Mutex::new(Vec::new()));
    let db = Db::open(
        driver,
        DbConfig::new().with_dialect(MySql).with_interceptor(Record {
            name: "only",
            log: log.clone(),
        }),
    );

    let err = Deleter::<TestModel>::new(&db)
        .where_([col("id").eq(1)])
        .exec()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Driver(_)));
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn stats_are_grouped_by_kind_and_table() {
    let driver = MockDriver::new();
    let stats = StatsInterceptor::new();
    let db = Db::open(
        driver.clone(),
        DbConfig::new()
            .with_dialect(MySql)
            .with_interceptor(stats.clone()),
    );

    Selector::<TestModel>::new(&db).find_many().await.unwrap();
    Selector::<TestModel>::new(&db).find_many().await.unwrap();
    Raw::new(&db, "DELETE FROM `test_model`").exec().await.unwrap();
    driver.fail_execute();
    Deleter::<TestModel>::new(&db)
        .where_([col("id").eq(1)])
        .exec()
        .await
        .unwrap_err();

    let select = stats
        .get(StatementKind::Select, Some("test_model"))
        .unwrap();
    assert_eq!((select.count, select.failed), (2, 0));
    assert!(select.max_duration <= select.total_duration);

    let raw = stats.get(StatementKind::Raw, None).unwrap();
    assert_eq!((raw.count, raw.failed), (1, 0));

    let delete = stats
        .get(StatementKind::Delete, Some("test_model"))
        .unwrap();
    assert_eq!((delete.count, delete.failed), (1, 1));

    assert_eq!(stats.totals().count, 4);
    assert_eq!(stats.snapshot().len(), 3);
}

/// Fields of every span created, in creation order.
#[derive(Clone, Default)]
struct SpanLog(Arc<Mutex<Vec<(Id, HashMap<String, String>)>>>);

struct FieldMap<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldMap<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S: tracing::Subscriber> Layer<S> for SpanLog {
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), attrs.metadata().name().to_string());
        attrs.record(&mut FieldMap(&mut fields));
        self.0.lock().unwrap().push((id.clone(), fields));
    }

    fn on_record(&self, id: &Id, values: &SpanValues<'_>, _ctx: Context<'_, S>) {
        let mut spans = self.0.lock().unwrap();
        if let Some((_, fields)) = spans.iter_mut().find(|(span, _)| span == id) {
            values.record(&mut FieldMap(fields));
        }
    }
}

struct CurrentSpan(Arc<Mutex<Vec<Option<&'static str>>>>);

#[async_trait]
impl Interceptor for CurrentSpan {
    async fn intercept(&self, ctx: &StatementContext, next: Next<'_>) -> OrmResult<Outcome> {
        let name = tracing::Span::current().metadata().map(|m| m.name());
        self.0.lock().unwrap().push(name);
        next.run(ctx).await
    }
}

#[tokio::test]
async fn span_wraps_each_statement() {
    let log = SpanLog::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(log.clone()));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let driver = MockDriver::new();
    let db = Db::open(
        driver.clone(),
        DbConfig::new()
            .with_dialect(MySql)
            .with_interceptor(SpanInterceptor::new())
            .with_interceptor(CurrentSpan(seen.clone())),
    );

    Selector::<TestModel>::new(&db)
        .where_([col("id").eq(1)])
        .find_many()
        .await
        .unwrap();
    driver.fail_execute();
    Deleter::<TestModel>::new(&db)
        .where_([col("id").eq(1)])
        .exec()
        .await
        .unwrap_err();

    assert_eq!(*seen.lock().unwrap(), vec![Some("statement"), Some("statement")]);

    let spans: Vec<HashMap<String, String>> = log
        .0
        .lock()
        .unwrap()
        .iter()
        .map(|(_, fields)| fields.clone())
        .filter(|fields| fields["name"] == "statement")
        .collect();
    assert_eq!(spans.len(), 2);

    assert_eq!(spans[0]["kind"], "select");
    assert_eq!(spans[0]["table"], "test_model");
    assert_eq!(spans[0]["sql"], "SELECT * FROM `test_model` WHERE `id` = ?;");
    assert_eq!(spans[0]["otel.kind"], "client");
    assert!(!spans[0].contains_key("error"));

    assert_eq!(spans[1]["kind"], "delete");
    assert!(spans[1].contains_key("error"), "{:?}", spans[1]);
}
