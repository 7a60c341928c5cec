use tracing::warn;

use crate::adapter::{DbAdapter, connect_adapter, lookup_backend};
use crate::error::DbFacadeError;
use crate::results::{ResultSet, Row};
use crate::select::{Select, Where};
use crate::types::{BackendKind, ConnectParams, DbValue};

/// A statement argument: raw SQL, or a [`Select`] assembled before dispatch.
///
/// Fetch and query operations accept `impl Into<Statement>`, so a string or
/// a builder can be passed interchangeably.
#[derive(Debug, Clone)]
pub enum Statement {
    Raw(String),
    Select(Select),
}

impl Statement {
    fn render(&self) -> Result<String, DbFacadeError> {
        match self {
            Statement::Raw(sql) => Ok(sql.clone()),
            Statement::Select(select) => select.assemble(),
        }
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::Raw(sql.to_string())
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::Raw(sql)
    }
}

impl From<Select> for Statement {
    fn from(select: Select) -> Self {
        Statement::Select(select)
    }
}

/// The facade: one API over every supported backend.
///
/// Holds at most one live adapter. The adapter is created lazily on first
/// connect and dropped on close or on a failed reconnect; `is_connected`
/// reports whether the slot is occupied. Every operation that can touch the
/// slot takes `&mut self`, so the slot has single-writer discipline by
/// construction.
///
/// ```rust,no_run
/// # use db_facade::prelude::*;
/// # async fn demo() -> Result<(), DbFacadeError> {
/// let params = ConnectParams::new().database("app.db");
/// let mut db = DbFacade::new("sqlite", params)?;
/// db.connect().await?;
/// let row = db.fetch_row("SELECT id, name FROM player WHERE id = ?", &[DbValue::Int(1)]).await?;
/// # let _ = row;
/// # Ok(())
/// # }
/// ```
pub struct DbFacade {
    backend: BackendKind,
    params: ConnectParams,
    adapter: Option<Box<dyn DbAdapter>>,
}

impl std::fmt::Debug for DbFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbFacade")
            .field("backend", &self.backend)
            .field("params", &self.params)
            .field("connected", &self.adapter.is_some())
            .finish()
    }
}

impl DbFacade {
    /// Build a facade from an adapter name and connection parameters.
    ///
    /// # Errors
    ///
    /// Returns `DbFacadeError::ConfigError` when the name is not in the
    /// supported set. This is programmer misuse, so it fails here rather
    /// than at connect time.
    pub fn new(adapter_name: &str, params: ConnectParams) -> Result<Self, DbFacadeError> {
        let backend = lookup_backend(adapter_name)?;
        Ok(Self::for_backend(backend, params))
    }

    /// Typed constructor; cannot fail.
    #[must_use]
    pub fn for_backend(backend: BackendKind, params: ConnectParams) -> Self {
        Self {
            backend,
            params,
            adapter: None,
        }
    }

    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// True iff an adapter is currently held.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.adapter.is_some()
    }

    /// Connect the backend adapter. On success the adapter slot is set; on
    /// failure it is cleared and the error returned.
    ///
    /// # Errors
    ///
    /// Returns `DbFacadeError::ConnectionError` (or a driver error) when the
    /// native connect attempt fails.
    pub async fn connect(&mut self) -> Result<(), DbFacadeError> {
        match connect_adapter(self.backend, &self.params).await {
            Ok(adapter) => {
                self.adapter = Some(adapter);
                Ok(())
            }
            Err(e) => {
                self.adapter = None;
                Err(e)
            }
        }
    }

    /// Release the adapter. Logical disconnection is immediate: the slot is
    /// cleared before physical teardown completes, and a facade that was
    /// never connected closes as a no-op.
    ///
    /// # Errors
    ///
    /// Returns teardown errors from the driver; callers may ignore them for
    /// fire-and-forget semantics.
    pub async fn close(&mut self) -> Result<(), DbFacadeError> {
        match self.adapter.take() {
            Some(mut adapter) => adapter.close().await,
            None => Ok(()),
        }
    }

    /// Connect only if no adapter is held.
    ///
    /// # Errors
    ///
    /// Propagates `connect` errors.
    pub async fn connect_if_not_connected(&mut self) -> Result<(), DbFacadeError> {
        if self.adapter.is_some() {
            return Ok(());
        }
        self.connect().await
    }

    fn adapter_mut(&mut self) -> Result<&mut Box<dyn DbAdapter>, DbFacadeError> {
        self.adapter
            .as_mut()
            .ok_or_else(|| DbFacadeError::ConnectionError("not connected".to_string()))
    }

    /// Execute a non-SELECT statement, returning the affected-row count.
    ///
    /// # Errors
    ///
    /// Surfaces driver errors unmodified; a rejected statement is never
    /// retried, since it would fail identically.
    pub async fn query(
        &mut self,
        sql: impl Into<Statement>,
        bind: &[DbValue],
    ) -> Result<u64, DbFacadeError> {
        let sql = sql.into().render()?;
        self.connect_if_not_connected().await?;
        self.adapter_mut()?.query(&sql, bind).await
    }

    /// Execute a SELECT and return the full result set.
    ///
    /// Recovery protocol: if the fetch fails, the adapter is dropped, one
    /// reconnect is attempted, and the same fetch is reissued exactly once.
    /// Whatever the second attempt returns is surfaced — a single stale
    /// connection is tolerated transparently without masking persistent
    /// failures or looping.
    ///
    /// # Errors
    ///
    /// The reconnect error if reconnecting fails, otherwise the second
    /// attempt's error.
    pub async fn fetch_all(
        &mut self,
        sql: impl Into<Statement>,
        bind: &[DbValue],
    ) -> Result<ResultSet, DbFacadeError> {
        let sql = sql.into().render()?;
        self.connect_if_not_connected().await?;
        match self.adapter_mut()?.fetch_all(&sql, bind).await {
            Ok(result) => Ok(result),
            Err(first) => {
                warn!(error = %first, "fetch failed; reconnecting once and retrying");
                self.adapter = None;
                self.connect().await?;
                self.adapter_mut()?.fetch_all(&sql, bind).await
            }
        }
    }

    /// First row of the result, or None if the result is empty.
    ///
    /// # Errors
    ///
    /// Propagates `fetch_all` errors.
    pub async fn fetch_row(
        &mut self,
        sql: impl Into<Statement>,
        bind: &[DbValue],
    ) -> Result<Option<Row>, DbFacadeError> {
        let result = self.fetch_all(sql, bind).await?;
        Ok(result.rows.into_iter().next())
    }

    /// Values of the first column across all rows, in row order.
    ///
    /// # Errors
    ///
    /// Propagates `fetch_all` errors.
    pub async fn fetch_col(
        &mut self,
        sql: impl Into<Statement>,
        bind: &[DbValue],
    ) -> Result<Vec<DbValue>, DbFacadeError> {
        let result = self.fetch_all(sql, bind).await?;
        Ok(result.first_column())
    }

    /// Value of the first column of the first row. `None` is the explicit
    /// no-result marker — a row whose first column is NULL comes back as
    /// `Some(DbValue::Null)`.
    ///
    /// # Errors
    ///
    /// Propagates `fetch_all` errors.
    pub async fn fetch_one(
        &mut self,
        sql: impl Into<Statement>,
        bind: &[DbValue],
    ) -> Result<Option<DbValue>, DbFacadeError> {
        let row = self.fetch_row(sql, bind).await?;
        Ok(row.and_then(|row| row.get_by_index(0).cloned()))
    }

    /// Insert one row. Field order follows `data`; values travel the bind
    /// list to the adapter.
    ///
    /// # Errors
    ///
    /// `DbFacadeError::ValidationError` if `data` is empty (no statement is
    /// issued); otherwise driver errors from execution.
    pub async fn insert(
        &mut self,
        table: &str,
        data: &[(&str, DbValue)],
    ) -> Result<u64, DbFacadeError> {
        if data.is_empty() {
            return Err(DbFacadeError::ValidationError(
                "insert data must not be empty".to_string(),
            ));
        }
        self.connect_if_not_connected().await?;
        let adapter = self.adapter_mut()?;
        let escaper = adapter.escaper();
        let fields = data
            .iter()
            .map(|(field, _)| escaper.escape_field(field))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; data.len()].join(", ");
        let sql = format!(
            "INSERT INTO {}({}) VALUES({})",
            escaper.escape_table(table),
            fields,
            placeholders
        );
        let bind: Vec<DbValue> = data.iter().map(|(_, value)| value.clone()).collect();
        adapter.query(&sql, &bind).await
    }

    /// Update rows matching `where_clause`. Data values travel the bind
    /// list; WHERE-term values are inlined via escaping.
    ///
    /// # Errors
    ///
    /// `DbFacadeError::ValidationError` if `data` is empty or the clause is
    /// blank; otherwise driver errors from execution.
    pub async fn update(
        &mut self,
        table: &str,
        data: &[(&str, DbValue)],
        where_clause: impl Into<Where>,
    ) -> Result<u64, DbFacadeError> {
        let where_clause = where_clause.into();
        if data.is_empty() {
            return Err(DbFacadeError::ValidationError(
                "update data must not be empty".to_string(),
            ));
        }
        if where_clause.is_blank() {
            return Err(DbFacadeError::ValidationError(
                "update requires a non-blank where clause".to_string(),
            ));
        }
        self.connect_if_not_connected().await?;
        let adapter = self.adapter_mut()?;
        let escaper = adapter.escaper();
        let assignments = data
            .iter()
            .map(|(field, _)| format!("{} = ?", escaper.escape_field(field)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            escaper.escape_table(table),
            assignments,
            where_clause.render(escaper.as_ref())?
        );
        let bind: Vec<DbValue> = data.iter().map(|(_, value)| value.clone()).collect();
        adapter.query(&sql, &bind).await
    }

    /// Delete rows matching `where_clause`.
    ///
    /// # Errors
    ///
    /// `DbFacadeError::ValidationError` if the clause is blank; otherwise
    /// driver errors from execution.
    pub async fn remove(
        &mut self,
        table: &str,
        where_clause: impl Into<Where>,
    ) -> Result<u64, DbFacadeError> {
        let where_clause = where_clause.into();
        if where_clause.is_blank() {
            return Err(DbFacadeError::ValidationError(
                "remove requires a non-blank where clause".to_string(),
            ));
        }
        self.connect_if_not_connected().await?;
        let adapter = self.adapter_mut()?;
        let escaper = adapter.escaper();
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            escaper.escape_table(table),
            where_clause.render(escaper.as_ref())?
        );
        adapter.query(&sql, &[]).await
    }

    /// Run a multi-statement script (DDL, seed data) with no binding.
    ///
    /// # Errors
    ///
    /// Surfaces driver errors unmodified.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), DbFacadeError> {
        self.connect_if_not_connected().await?;
        self.adapter_mut()?.execute_batch(sql).await
    }

    /// SQL-literal-safe rendering of a value through the held adapter.
    /// Arrays flatten into a comma-joined list of escaped elements.
    ///
    /// # Errors
    ///
    /// `DbFacadeError::ConnectionError` when no adapter is held.
    pub fn escape(&self, value: &DbValue) -> Result<String, DbFacadeError> {
        self.adapter
            .as_ref()
            .map(|adapter| adapter.escape(value))
            .ok_or_else(|| DbFacadeError::ConnectionError("not connected".to_string()))
    }

    /// Most recent auto-generated primary key observed by the held adapter,
    /// or None when none has been observed or no adapter is held.
    #[must_use]
    pub fn last_insert_id(&self) -> Option<i64> {
        self.adapter.as_ref().and_then(|adapter| adapter.last_insert_id())
    }

    /// A new [`Select`] bound to the held adapter's escaper.
    ///
    /// # Errors
    ///
    /// `DbFacadeError::ConnectionError` when no adapter is held.
    pub fn select(&self) -> Result<Select, DbFacadeError> {
        self.adapter
            .as_ref()
            .map(|adapter| adapter.select())
            .ok_or_else(|| DbFacadeError::ConnectionError("not connected".to_string()))
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::escape::SqlEscape;
    use crate::sqlite::SqliteEscaper;

    /// An adapter whose statements always fail, standing in for a dropped
    /// native connection.
    struct FlakyAdapter;

    #[async_trait]
    impl DbAdapter for FlakyAdapter {
        fn backend(&self) -> BackendKind {
            BackendKind::Sqlite
        }

        fn escaper(&self) -> Arc<dyn SqlEscape + Send + Sync> {
            Arc::new(SqliteEscaper)
        }

        async fn query(&mut self, _sql: &str, _bind: &[DbValue]) -> Result<u64, DbFacadeError> {
            Err(DbFacadeError::ExecutionError("stale connection".to_string()))
        }

        async fn fetch_all(
            &mut self,
            _sql: &str,
            _bind: &[DbValue],
        ) -> Result<ResultSet, DbFacadeError> {
            Err(DbFacadeError::ExecutionError("stale connection".to_string()))
        }

        async fn execute_batch(&mut self, _sql: &str) -> Result<(), DbFacadeError> {
            Err(DbFacadeError::ExecutionError("stale connection".to_string()))
        }

        async fn close(&mut self) -> Result<(), DbFacadeError> {
            Ok(())
        }

        fn last_insert_id(&self) -> Option<i64> {
            None
        }
    }

    fn facade_with_flaky_adapter(params: ConnectParams) -> DbFacade {
        let mut facade = DbFacade::for_backend(BackendKind::Sqlite, params);
        facade.adapter = Some(Box::new(FlakyAdapter));
        facade
    }

    #[tokio::test]
    async fn fetch_retries_once_after_reconnect() {
        let mut facade = facade_with_flaky_adapter(ConnectParams::new());
        let result = facade.fetch_all("SELECT 1 AS one", &[]).await.unwrap();
        assert_eq!(result.rows[0].get("one"), Some(&DbValue::Int(1)));
        assert!(facade.is_connected());
    }

    #[tokio::test]
    async fn failed_reconnect_clears_adapter_and_surfaces_error() {
        let params = ConnectParams::new().database("/nonexistent-dir/facade-test.db");
        let mut facade = facade_with_flaky_adapter(params);
        let err = facade.fetch_all("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, DbFacadeError::ConnectionError(_)));
        assert!(!facade.is_connected());
    }

    #[tokio::test]
    async fn second_attempt_error_is_surfaced_not_the_first() {
        let mut facade = facade_with_flaky_adapter(ConnectParams::new());
        let err = facade
            .fetch_all("SELECT * FROM no_such_table", &[])
            .await
            .unwrap_err();
        // The retry ran against a fresh in-memory database, so the caller
        // sees the driver's error for the retried statement, not the
        // synthetic first failure.
        assert!(matches!(err, DbFacadeError::SqliteError(_)));
        assert!(facade.is_connected());
    }

    #[tokio::test]
    async fn query_is_never_retried() {
        let mut facade = facade_with_flaky_adapter(ConnectParams::new());
        let err = facade.query("DELETE FROM t WHERE id = 1", &[]).await.unwrap_err();
        assert!(matches!(err, DbFacadeError::ExecutionError(_)));
    }
}
