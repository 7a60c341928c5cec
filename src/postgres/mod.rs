// PostgreSQL adapter: a thin pass-through to tokio-postgres.

mod query;

use std::fmt::Write;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

use crate::adapter::DbAdapter;
use crate::error::DbFacadeError;
use crate::escape::SqlEscape;
use crate::interpolate::bind_placeholders;
use crate::results::ResultSet;
use crate::types::{BackendKind, ConnectParams, DbValue};

/// Postgres escaping: standard-conforming everything, except blobs, which
/// use the `'\x…'` bytea hex form.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresEscaper;

impl SqlEscape for PostgresEscaper {
    fn escape_blob(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(4 + bytes.len() * 2);
        out.push_str("'\\x");
        for b in bytes {
            let _ = write!(out, "{b:02x}");
        }
        out.push('\'');
        out
    }
}

static RETURNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\breturning\b").expect("hardcoded regex"));

pub struct PostgresAdapter {
    client: Option<Client>,
    last_insert_id: Option<i64>,
}

impl PostgresAdapter {
    /// Connect with the Postgres defaults (localhost:5432) merged in. The
    /// driver's background connection task is spawned on the runtime; its
    /// terminal error, if any, is logged.
    ///
    /// # Errors
    ///
    /// Returns `DbFacadeError::ConnectionError` if the native connect
    /// attempt fails.
    pub async fn connect(params: &ConnectParams) -> Result<Self, DbFacadeError> {
        let host = params.host.clone().unwrap_or_else(|| "localhost".to_string());
        let port = params.port.unwrap_or(5432);

        let mut config = tokio_postgres::Config::new();
        config.host(&host);
        config.port(port);
        if let Some(user) = &params.user {
            config.user(user);
        }
        if let Some(password) = &params.password {
            config.password(password);
        }
        if let Some(database) = &params.database {
            config.dbname(database);
        }

        let (client, connection) = config.connect(NoTls).await.map_err(|e| {
            DbFacadeError::ConnectionError(format!(
                "failed to connect to postgres at {host}:{port}: {e}"
            ))
        })?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "postgres connection task ended with error");
            }
        });
        debug!(%host, port, "postgres connected");
        Ok(Self {
            client: Some(client),
            last_insert_id: None,
        })
    }
}

fn closed() -> DbFacadeError {
    DbFacadeError::ConnectionError("postgres connection is closed".to_string())
}

#[async_trait]
impl DbAdapter for PostgresAdapter {
    fn backend(&self) -> BackendKind {
        BackendKind::Postgres
    }

    fn escaper(&self) -> Arc<dyn SqlEscape + Send + Sync> {
        Arc::new(PostgresEscaper)
    }

    async fn query(&mut self, sql: &str, bind: &[DbValue]) -> Result<u64, DbFacadeError> {
        let sql = bind_placeholders(sql, bind, &PostgresEscaper)?;
        debug!(%sql, "postgres query");
        let client = self.client.as_ref().ok_or_else(closed)?;
        if RETURNING.is_match(&sql) {
            // Postgres has no session last-insert-id; a RETURNING clause is
            // the one place a generated key can be observed.
            let rows = client.query(sql.as_str(), &[]).await?;
            if let Some(row) = rows.first() {
                if let Ok(id) = row.try_get::<_, i64>(0) {
                    self.last_insert_id = Some(id);
                } else if let Ok(id) = row.try_get::<_, i32>(0) {
                    self.last_insert_id = Some(i64::from(id));
                }
            }
            Ok(rows.len() as u64)
        } else {
            Ok(client.execute(sql.as_str(), &[]).await?)
        }
    }

    async fn fetch_all(
        &mut self,
        sql: &str,
        bind: &[DbValue],
    ) -> Result<ResultSet, DbFacadeError> {
        let sql = bind_placeholders(sql, bind, &PostgresEscaper)?;
        debug!(%sql, "postgres fetch");
        let client = self.client.as_ref().ok_or_else(closed)?;
        let rows = client.query(sql.as_str(), &[]).await?;
        query::build_result_set_from_rows(&rows)
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), DbFacadeError> {
        let client = self.client.as_ref().ok_or_else(closed)?;
        client.batch_execute(sql).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbFacadeError> {
        // Dropping the client ends the spawned connection task.
        self.client.take();
        Ok(())
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}
