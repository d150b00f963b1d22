use super::{Interceptor, Next, Outcome, StatementContext};
use crate::error::{OrmError, OrmResult};
use crate::statement::StatementKind;
use async_trait::async_trait;

/// Rejects DELETE statements that carry no WHERE clause.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeDeleteInterceptor;

impl SafeDeleteInterceptor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Interceptor for SafeDeleteInterceptor {
    async fn intercept(&self, ctx: &StatementContext, next: Next<'_>) -> OrmResult<Outcome> {
        if ctx.kind == StatementKind::Delete && !ctx.sql().contains(" WHERE ") {
            tracing::warn!(target: "strata.sql", sql = %ctx.sql(), "rejected DELETE without WHERE");
            return Err(OrmError::UnsafeDelete);
        }
        next.run(ctx).await
    }
}
