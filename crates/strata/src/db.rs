//! Database handle and its configuration.

use crate::dialect::{Dialect, StandardSql};
use crate::error::OrmResult;
use crate::interceptor::{Interceptor, Next, Outcome, StatementContext};
use crate::model::Registry;
use crate::resolver::ResolverKind;
use crate::session::{Driver, Session};
use crate::transaction::Tx;
use std::fmt;
use std::sync::Arc;

/// Configuration for a [`Db`].
///
/// Defaults: standard SQL dialect, pointer resolver, a private registry and
/// no interceptors.
#[derive(Clone)]
pub struct DbConfig {
    /// SQL dialect used to compile statements.
    pub dialect: Arc<dyn Dialect>,
    /// Strategy used to move values between rows and entities.
    pub resolver: ResolverKind,
    /// Shared model registry. `None` creates a fresh one.
    pub registry: Option<Arc<Registry>>,
    /// Interceptors, outermost first.
    pub interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            dialect: Arc::new(StandardSql),
            resolver: ResolverKind::default(),
            registry: None,
            interceptors: Vec::new(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("dialect", &self.dialect.name())
            .field("resolver", &self.resolver)
            .field("shared_registry", &self.registry.is_some())
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl DbConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SQL dialect.
    pub fn with_dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Arc::new(dialect);
        self
    }

    /// Set the value resolver.
    pub fn with_resolver(mut self, resolver: ResolverKind) -> Self {
        self.resolver = resolver;
        self
    }

    /// Share a model registry with other handles.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Append an interceptor; earlier interceptors wrap later ones.
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }
}

/// State shared by a [`Db`] and its transactions.
#[derive(Clone)]
pub struct Core {
    pub(crate) dialect: Arc<dyn Dialect>,
    pub(crate) registry: Arc<Registry>,
    pub(crate) resolver: ResolverKind,
    pub(crate) chain: Arc<[Arc<dyn Interceptor>]>,
}

impl Core {
    fn from_config(config: DbConfig) -> Self {
        Self {
            dialect: config.dialect,
            registry: config.registry.unwrap_or_default(),
            resolver: config.resolver,
            chain: config.interceptors.into(),
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn resolver(&self) -> ResolverKind {
        self.resolver
    }
}

/// A handle statements can run against: [`Db`] or [`Tx`].
pub trait Orm: Send + Sync {
    fn core(&self) -> &Core;

    fn session(&self) -> &dyn Session;
}

/// Run a compiled statement through the interceptor chain.
pub(crate) async fn dispatch<O: Orm + ?Sized>(
    orm: &O,
    ctx: StatementContext,
) -> OrmResult<Outcome> {
    Next::new(&orm.core().chain, orm.session()).run(&ctx).await
}

/// Entry point: a driver plus compile configuration.
pub struct Db {
    core: Core,
    driver: Arc<dyn Driver>,
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("dialect", &self.core.dialect.name())
            .field("resolver", &self.core.resolver)
            .field("interceptors", &self.core.chain.len())
            .finish_non_exhaustive()
    }
}

impl Db {
    /// Wrap a driver with the given configuration.
    pub fn open(driver: impl Driver + 'static, config: DbConfig) -> Self {
        Self::from_shared(Arc::new(driver), config)
    }

    /// Like [`Db::open`] for a driver that is already shared.
    pub fn from_shared(driver: Arc<dyn Driver>, config: DbConfig) -> Self {
        tracing::debug!(
            target: "strata.sql",
            dialect = config.dialect.name(),
            interceptors = config.interceptors.len(),
            "opening db"
        );
        Self {
            core: Core::from_config(config),
            driver,
        }
    }

    /// Shorthand for a default configuration with `dialect`.
    pub fn with_dialect(driver: impl Driver + 'static, dialect: impl Dialect + 'static) -> Self {
        Self::open(driver, DbConfig::new().with_dialect(dialect))
    }

    /// Begin a transaction sharing this handle's configuration.
    pub async fn begin(&self) -> OrmResult<Tx> {
        let inner = self.driver.begin().await?;
        Ok(Tx::new(self.core.clone(), inner))
    }
}

impl Orm for Db {
    fn core(&self) -> &Core {
        &self.core
    }

    fn session(&self) -> &dyn Session {
        &*self.driver
    }
}
