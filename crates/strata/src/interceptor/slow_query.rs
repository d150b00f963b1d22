use super::{Interceptor, Next, Outcome, StatementContext, truncate_sql};
use crate::error::OrmResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

type SlowQueryCallback = Arc<dyn Fn(&StatementContext, Duration) + Send + Sync>;

/// Reports statements whose execution reaches a duration threshold.
///
/// Emits a `warn` event and invokes the optional callback; the outcome is
/// passed through unchanged.
#[derive(Clone)]
pub struct SlowQueryInterceptor {
    threshold: Duration,
    callback: Option<SlowQueryCallback>,
}

impl fmt::Debug for SlowQueryInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlowQueryInterceptor")
            .field("threshold", &self.threshold)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl SlowQueryInterceptor {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            callback: None,
        }
    }

    /// Also call `callback` for every slow statement.
    pub fn on_slow_query<F>(mut self, callback: F) -> Self
    where
        F: Fn(&StatementContext, Duration) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

#[async_trait]
impl Interceptor for SlowQueryInterceptor {
    async fn intercept(&self, ctx: &StatementContext, next: Next<'_>) -> OrmResult<Outcome> {
        let start = Instant::now();
        let outcome = next.run(ctx).await;
        let elapsed = start.elapsed();

        if elapsed >= self.threshold {
            tracing::warn!(
                target: "strata.sql",
                kind = %ctx.kind,
                elapsed_ms = elapsed.as_millis() as u64,
                sql = %truncate_sql(ctx.sql(), Some(200)),
                "slow statement"
            );
            if let Some(callback) = &self.callback {
                callback(ctx, elapsed);
            }
        }
        outcome
    }
}
