use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;

use crate::error::DbFacadeError;
use crate::escape::SqlEscape;
use crate::results::ResultSet;
use crate::select::Select;
use crate::types::{BackendKind, ConnectParams, DbValue};

/// The capability contract every backend adapter satisfies.
///
/// An adapter is a thin pass-through to one native driver. Construction is
/// per-backend (`MysqlAdapter::connect`, ...); the facade owns the adapter
/// behind this trait for its whole lifetime.
#[async_trait]
pub trait DbAdapter: Send {
    /// Which backend this adapter drives.
    fn backend(&self) -> BackendKind;

    /// A shared handle to this adapter's escaping rules, cloned into every
    /// [`Select`] the adapter hands out.
    fn escaper(&self) -> Arc<dyn SqlEscape + Send + Sync>;

    /// Execute a non-SELECT statement. `bind` values are interpolated into
    /// `sql` through the adapter's escaping rules before the driver sees
    /// the statement. Returns the affected-row count.
    async fn query(&mut self, sql: &str, bind: &[DbValue]) -> Result<u64, DbFacadeError>;

    /// Execute a SELECT with the same interpolation. Rows and columns come
    /// back in driver-native order.
    async fn fetch_all(&mut self, sql: &str, bind: &[DbValue])
    -> Result<ResultSet, DbFacadeError>;

    /// Run a multi-statement script with no binding.
    async fn execute_batch(&mut self, sql: &str) -> Result<(), DbFacadeError>;

    /// Release the native connection. Idempotent: closing an already-closed
    /// adapter is a no-op.
    async fn close(&mut self) -> Result<(), DbFacadeError>;

    /// The most recent auto-generated primary key observed by this adapter
    /// instance, or None if it has seen none.
    fn last_insert_id(&self) -> Option<i64>;

    /// SQL-literal-safe rendering of a value.
    fn escape(&self, value: &DbValue) -> String {
        self.escaper().escape_value(value)
    }

    /// Identifier-quoted table name.
    fn escape_table(&self, name: &str) -> String {
        self.escaper().escape_table(name)
    }

    /// Identifier-quoted column name.
    fn escape_field(&self, name: &str) -> String {
        self.escaper().escape_field(name)
    }

    /// A new [`Select`] bound to this adapter's escaper.
    fn select(&self) -> Select {
        Select::new(self.escaper())
    }
}

/// Name registry, built at first use. Lookup fails closed: names outside
/// this map are configuration errors.
static REGISTRY: LazyLock<HashMap<&'static str, BackendKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    #[cfg(feature = "mysql")]
    {
        map.insert("mysql", BackendKind::Mysql);
        map.insert("mariadb", BackendKind::Mysql);
    }
    #[cfg(feature = "postgres")]
    {
        map.insert("postgres", BackendKind::Postgres);
        map.insert("postgresql", BackendKind::Postgres);
        map.insert("pgsql", BackendKind::Postgres);
    }
    #[cfg(feature = "sqlite")]
    {
        map.insert("sqlite", BackendKind::Sqlite);
        map.insert("sqlite3", BackendKind::Sqlite);
    }
    map
});

/// Resolve an adapter name (or alias) to its backend.
///
/// # Errors
///
/// Returns `DbFacadeError::ConfigError` for names outside the supported set.
pub fn lookup_backend(name: &str) -> Result<BackendKind, DbFacadeError> {
    REGISTRY
        .get(name.to_ascii_lowercase().as_str())
        .copied()
        .ok_or_else(|| DbFacadeError::ConfigError(format!("unknown adapter name: {name}")))
}

/// Connect the adapter for `kind` with `params`. One attempt, resolving
/// success-with-adapter or failure-with-error exactly once.
pub(crate) async fn connect_adapter(
    kind: BackendKind,
    params: &ConnectParams,
) -> Result<Box<dyn DbAdapter>, DbFacadeError> {
    match kind {
        #[cfg(feature = "mysql")]
        BackendKind::Mysql => Ok(Box::new(crate::mysql::MysqlAdapter::connect(params).await?)),
        #[cfg(feature = "postgres")]
        BackendKind::Postgres => Ok(Box::new(
            crate::postgres::PostgresAdapter::connect(params).await?,
        )),
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite => Ok(Box::new(
            crate::sqlite::SqliteAdapter::connect(params).await?,
        )),
        #[allow(unreachable_patterns)]
        _ => Err(DbFacadeError::ConfigError(
            "this backend is not enabled in the current build".to_string(),
        )),
    }
}
