// MySQL / MariaDB adapter: a thin pass-through to mysql_async.

mod query;

use std::sync::Arc;

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder};
use tracing::debug;

use crate::adapter::DbAdapter;
use crate::error::DbFacadeError;
use crate::escape::SqlEscape;
use crate::interpolate::bind_placeholders;
use crate::results::ResultSet;
use crate::types::{BackendKind, ConnectParams, DbValue};

/// MySQL escaping: backtick identifiers and backslash-escaped strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlEscaper;

impl SqlEscape for MysqlEscaper {
    fn escape_field(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn escape_text(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        for c in s.chars() {
            match c {
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\0' => out.push_str("\\0"),
                '\u{1a}' => out.push_str("\\Z"),
                _ => out.push(c),
            }
        }
        out.push('\'');
        out
    }
}

pub struct MysqlAdapter {
    conn: Option<Conn>,
    last_insert_id: Option<i64>,
}

impl MysqlAdapter {
    /// Connect with the MySQL defaults (localhost:3306) merged in.
    ///
    /// # Errors
    ///
    /// Returns `DbFacadeError::ConnectionError` if the native connect
    /// attempt fails.
    pub async fn connect(params: &ConnectParams) -> Result<Self, DbFacadeError> {
        let host = params.host.clone().unwrap_or_else(|| "localhost".to_string());
        let port = params.port.unwrap_or(3306);
        let opts = OptsBuilder::default()
            .ip_or_hostname(host.clone())
            .tcp_port(port)
            .user(params.user.clone())
            .pass(params.password.clone())
            .db_name(params.database.clone());
        let conn = Conn::new(opts).await.map_err(|e| {
            DbFacadeError::ConnectionError(format!("failed to connect to mysql at {host}:{port}: {e}"))
        })?;
        debug!(%host, port, "mysql connected");
        Ok(Self {
            conn: Some(conn),
            last_insert_id: None,
        })
    }
}

fn closed() -> DbFacadeError {
    DbFacadeError::ConnectionError("mysql connection is closed".to_string())
}

#[async_trait]
impl DbAdapter for MysqlAdapter {
    fn backend(&self) -> BackendKind {
        BackendKind::Mysql
    }

    fn escaper(&self) -> Arc<dyn SqlEscape + Send + Sync> {
        Arc::new(MysqlEscaper)
    }

    async fn query(&mut self, sql: &str, bind: &[DbValue]) -> Result<u64, DbFacadeError> {
        let sql = bind_placeholders(sql, bind, &MysqlEscaper)?;
        debug!(%sql, "mysql query");
        let conn = self.conn.as_mut().ok_or_else(closed)?;
        conn.query_drop(sql.as_str()).await?;
        let affected = conn.affected_rows();
        if let Some(id) = conn.last_insert_id()
            && id != 0
        {
            self.last_insert_id = i64::try_from(id).ok();
        }
        Ok(affected)
    }

    async fn fetch_all(
        &mut self,
        sql: &str,
        bind: &[DbValue],
    ) -> Result<ResultSet, DbFacadeError> {
        let sql = bind_placeholders(sql, bind, &MysqlEscaper)?;
        debug!(%sql, "mysql fetch");
        let conn = self.conn.as_mut().ok_or_else(closed)?;
        let rows: Vec<mysql_async::Row> = conn.query(sql.as_str()).await?;
        Ok(query::build_result_set(rows))
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), DbFacadeError> {
        let conn = self.conn.as_mut().ok_or_else(closed)?;
        conn.query_drop(sql).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbFacadeError> {
        if let Some(conn) = self.conn.take() {
            conn.disconnect().await?;
        }
        Ok(())
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}
