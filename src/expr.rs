use std::fmt;

/// A raw SQL fragment that must never be escaped.
///
/// Wherever a value is rendered into SQL, a `DbExpr` is emitted verbatim
/// instead of being quoted, so database functions and expressions can be
/// used where a plain value would otherwise be escaped:
/// ```rust
/// use db_facade::prelude::*;
///
/// let updated = ("updated_at < ?", DbValue::from(DbExpr::new("NOW()")));
/// # let _ = updated;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbExpr(String);

impl DbExpr {
    #[must_use]
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// The wrapped fragment, exactly as supplied.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DbExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DbExpr {
    fn from(expr: &str) -> Self {
        Self::new(expr)
    }
}

impl From<String> for DbExpr {
    fn from(expr: String) -> Self {
        Self(expr)
    }
}
