use super::{Interceptor, Next, Outcome, StatementContext};
use crate::error::OrmResult;
use crate::statement::StatementKind;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Counters for one `(kind, table)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementStats {
    /// Statements that went through the chain.
    pub count: u64,
    /// Statements that returned an error.
    pub failed: u64,
    /// Total execution time.
    pub total_duration: Duration,
    /// Slowest single execution.
    pub max_duration: Duration,
}

impl StatementStats {
    fn observe(&mut self, elapsed: Duration, failed: bool) {
        self.count += 1;
        if failed {
            self.failed += 1;
        }
        self.total_duration = self.total_duration.saturating_add(elapsed);
        self.max_duration = self.max_duration.max(elapsed);
    }

    fn merge(&mut self, other: &StatementStats) {
        self.count += other.count;
        self.failed += other.failed;
        self.total_duration = self.total_duration.saturating_add(other.total_duration);
        self.max_duration = self.max_duration.max(other.max_duration);
    }

    /// Mean execution time; zero before the first statement.
    pub fn mean_duration(&self) -> Duration {
        u32::try_from(self.count)
            .ok()
            .filter(|&n| n > 0)
            .map_or(Duration::ZERO, |n| self.total_duration / n)
    }
}

/// Key of a [`StatsInterceptor`] entry.
pub type StatsKey = (StatementKind, Option<String>);

/// Collects execution counts and durations per statement kind and table.
///
/// Clones share their counters, so keep one to read the numbers after
/// handing another to [`DbConfig::with_interceptor`](crate::DbConfig::with_interceptor).
#[derive(Debug, Clone, Default)]
pub struct StatsInterceptor {
    entries: Arc<Mutex<HashMap<StatsKey, StatementStats>>>,
}

impl StatsInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for one kind and table.
    pub fn get(&self, kind: StatementKind, table: Option<&str>) -> Option<StatementStats> {
        let key = (kind, table.map(str::to_string));
        self.lock().get(&key).copied()
    }

    /// All counters collected so far.
    pub fn snapshot(&self) -> HashMap<StatsKey, StatementStats> {
        self.lock().clone()
    }

    /// Sum over every kind and table.
    pub fn totals(&self) -> StatementStats {
        let mut total = StatementStats::default();
        for stats in self.lock().values() {
            total.merge(stats);
        }
        total
    }

    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<StatsKey, StatementStats>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Interceptor for StatsInterceptor {
    async fn intercept(&self, ctx: &StatementContext, next: Next<'_>) -> OrmResult<Outcome> {
        let start = Instant::now();
        let outcome = next.run(ctx).await;
        let elapsed = start.elapsed();

        self.lock()
            .entry((ctx.kind, ctx.table.clone()))
            .or_default()
            .observe(elapsed, outcome.is_err());
        outcome
    }
}
