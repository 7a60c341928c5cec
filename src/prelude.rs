//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types so callers can get
//! started with one `use`.

pub use crate::adapter::DbAdapter;
pub use crate::error::DbFacadeError;
pub use crate::escape::SqlEscape;
pub use crate::expr::DbExpr;
pub use crate::facade::{DbFacade, Statement};
pub use crate::results::{ResultSet, Row};
pub use crate::select::{Select, Where, WhereTerm};
pub use crate::types::{BackendKind, ConnectParams, DbValue};

#[cfg(feature = "mysql")]
pub use crate::mysql::MysqlEscaper;
#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresEscaper;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteEscaper;
