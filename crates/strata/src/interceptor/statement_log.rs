use super::{Interceptor, Next, Outcome, StatementContext, truncate_sql};
use crate::error::OrmResult;
use async_trait::async_trait;
use tracing::Level;

/// Emits every statement as a `tracing` event (target: `strata.sql`).
#[derive(Debug, Clone)]
pub struct StatementLogInterceptor {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for StatementLogInterceptor {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl StatementLogInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn emit(&self, ctx: &StatementContext) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = truncate_sql(ctx.sql(), self.max_sql_length);
        emit_at_level!(
            self.level,
            target: "strata.sql",
            kind = %ctx.kind,
            arg_count = ctx.statement.args.len(),
            sql = %sql,
            "statement"
        );
    }
}

#[async_trait]
impl Interceptor for StatementLogInterceptor {
    async fn intercept(&self, ctx: &StatementContext, next: Next<'_>) -> OrmResult<Outcome> {
        self.emit(ctx);
        next.run(ctx).await
    }
}
