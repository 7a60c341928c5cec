// SQLite adapter: a thin pass-through to rusqlite.

mod query;

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::adapter::DbAdapter;
use crate::error::DbFacadeError;
use crate::escape::SqlEscape;
use crate::interpolate::bind_placeholders;
use crate::results::ResultSet;
use crate::types::{BackendKind, ConnectParams, DbValue};

/// `SQLite` escaping: double-quoted identifiers, `''`-doubled strings, and
/// 1/0 booleans for compatibility with library versions that predate the
/// TRUE/FALSE keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteEscaper;

impl SqlEscape for SqliteEscaper {
    fn escape_bool(&self, b: bool) -> String {
        let literal = if b { "1" } else { "0" };
        literal.to_string()
    }
}

pub struct SqliteAdapter {
    // rusqlite's connection is not Sync; the lock is never held across an
    // await, it only makes the adapter's futures Send.
    conn: Option<Mutex<rusqlite::Connection>>,
    last_insert_id: Option<i64>,
}

impl SqliteAdapter {
    /// Open the database at `params.database`, defaulting to `:memory:`.
    ///
    /// # Errors
    ///
    /// Returns `DbFacadeError::ConnectionError` if the database cannot be
    /// opened.
    pub async fn connect(params: &ConnectParams) -> Result<Self, DbFacadeError> {
        let path = params
            .database
            .clone()
            .unwrap_or_else(|| ":memory:".to_string());
        let conn = rusqlite::Connection::open(&path).map_err(|e| {
            DbFacadeError::ConnectionError(format!("failed to open SQLite database {path}: {e}"))
        })?;
        debug!(%path, "sqlite connected");
        Ok(Self {
            conn: Some(Mutex::new(conn)),
            last_insert_id: None,
        })
    }
}

fn closed() -> DbFacadeError {
    DbFacadeError::ConnectionError("sqlite connection is closed".to_string())
}

#[async_trait]
impl DbAdapter for SqliteAdapter {
    fn backend(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn escaper(&self) -> Arc<dyn SqlEscape + Send + Sync> {
        Arc::new(SqliteEscaper)
    }

    async fn query(&mut self, sql: &str, bind: &[DbValue]) -> Result<u64, DbFacadeError> {
        let sql = bind_placeholders(sql, bind, &SqliteEscaper)?;
        debug!(%sql, "sqlite query");
        let conn = self.conn.as_ref().ok_or_else(closed)?;
        let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
        let affected = conn.execute(&sql, [])?;
        let rowid = conn.last_insert_rowid();
        drop(conn);
        if rowid != 0 {
            self.last_insert_id = Some(rowid);
        }
        Ok(affected as u64)
    }

    async fn fetch_all(
        &mut self,
        sql: &str,
        bind: &[DbValue],
    ) -> Result<ResultSet, DbFacadeError> {
        let sql = bind_placeholders(sql, bind, &SqliteEscaper)?;
        debug!(%sql, "sqlite fetch");
        let conn = self.conn.as_ref().ok_or_else(closed)?;
        let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(&sql)?;
        query::build_result_set(&mut stmt)
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), DbFacadeError> {
        let conn = self.conn.as_ref().ok_or_else(closed)?;
        let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute_batch(sql)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbFacadeError> {
        if let Some(conn) = self.conn.take() {
            let conn = conn.into_inner().unwrap_or_else(PoisonError::into_inner);
            conn.close().map_err(|(_, e)| DbFacadeError::SqliteError(e))?;
        }
        Ok(())
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}
