//! A uniform asynchronous database-access facade.
//!
//! One API — connect, fetch, insert, update, remove, query — over several
//! relational backends, with a pluggable adapter per backend translating
//! generic calls into driver-specific calls.
//!
//! ```rust,no_run
//! use db_facade::prelude::*;
//!
//! # async fn demo() -> Result<(), DbFacadeError> {
//! let mut db = DbFacade::new("sqlite", ConnectParams::new().database("app.db"))?;
//! db.connect().await?;
//! db.insert("player", &[("name", DbValue::from("alice")), ("score", DbValue::Int(41))])
//!     .await?;
//! let names = db
//!     .fetch_col("SELECT name FROM player WHERE score > ?", &[DbValue::Int(40)])
//!     .await?;
//! # let _ = names;
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod error;
pub mod escape;
pub mod expr;
pub mod facade;
mod interpolate;
pub mod results;
pub mod select;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod prelude;

pub use adapter::{DbAdapter, lookup_backend};
pub use error::DbFacadeError;
pub use escape::SqlEscape;
pub use expr::DbExpr;
pub use facade::{DbFacade, Statement};
pub use interpolate::bind_placeholders;
pub use results::{ResultSet, Row};
pub use select::{Select, Where, WhereTerm};
pub use types::{BackendKind, ConnectParams, DbValue};
