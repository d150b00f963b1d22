use super::{Interceptor, Next, Outcome, StatementContext, truncate_sql};
use crate::error::OrmResult;
use async_trait::async_trait;
use tracing::Instrument;
use tracing::field::{Empty, display};

/// Runs every statement inside an `info` span named `statement`
/// (target: `strata.sql`).
///
/// Span fields: `kind`, `table`, `sql`, `otel.kind = "client"`, and `error`
/// once the statement fails. Downstream interceptors and the driver run
/// inside the span, so their events nest under it.
#[derive(Debug, Clone)]
pub struct SpanInterceptor {
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SpanInterceptor {
    fn default() -> Self {
        Self {
            max_sql_length: Some(200),
        }
    }
}

impl SpanInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum SQL length recorded on the span.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }
}

#[async_trait]
impl Interceptor for SpanInterceptor {
    async fn intercept(&self, ctx: &StatementContext, next: Next<'_>) -> OrmResult<Outcome> {
        let span = tracing::info_span!(
            target: "strata.sql",
            "statement",
            kind = %ctx.kind,
            table = ctx.table.as_deref().unwrap_or(""),
            sql = %truncate_sql(ctx.sql(), self.max_sql_length),
            otel.kind = "client",
            error = Empty,
        );

        let outcome = next.run(ctx).instrument(span.clone()).await;
        if let Err(e) = &outcome {
            span.record("error", display(e));
        }
        outcome
    }
}
