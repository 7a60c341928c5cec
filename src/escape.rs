use std::fmt::Write;

use crate::types::DbValue;

/// The escaping surface of an adapter, split out so a [`Select`](crate::Select)
/// can escape values without owning the adapter that created it.
///
/// Default methods carry the rules shared by every backend; implementations
/// override only their divergences (identifier quoting, string escaping,
/// blob and boolean literals).
pub trait SqlEscape {
    /// Quote a column identifier. Default is the double-quote form with
    /// embedded quotes doubled.
    fn escape_field(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Quote a table identifier. Same quoting as fields unless the backend
    /// says otherwise.
    fn escape_table(&self, name: &str) -> String {
        self.escape_field(name)
    }

    /// Render a string as a SQL literal. Default doubles embedded single
    /// quotes, which is the standard-conforming form.
    fn escape_text(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// Render a boolean literal.
    fn escape_bool(&self, b: bool) -> String {
        if b { "TRUE".to_string() } else { "FALSE".to_string() }
    }

    /// Render a blob literal. Default is the `X'..'` hex form understood by
    /// MySQL and `SQLite`.
    fn escape_blob(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(3 + bytes.len() * 2);
        out.push_str("X'");
        for b in bytes {
            // infallible on String
            let _ = write!(out, "{b:02X}");
        }
        out.push('\'');
        out
    }

    /// Render any [`DbValue`] as a SQL literal.
    ///
    /// `DbExpr` passes through verbatim, timestamps become quoted datetime
    /// literals, numerics stay unquoted, and arrays flatten into a
    /// comma-joined list of individually escaped elements.
    fn escape_value(&self, value: &DbValue) -> String {
        match value {
            DbValue::Null => "NULL".to_string(),
            DbValue::Int(i) => i.to_string(),
            DbValue::Float(f) => f.to_string(),
            DbValue::Text(s) => self.escape_text(s),
            DbValue::Bool(b) => self.escape_bool(*b),
            DbValue::Timestamp(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
            DbValue::Json(j) => self.escape_text(&j.to_string()),
            DbValue::Blob(bytes) => self.escape_blob(bytes),
            DbValue::Array(values) => values
                .iter()
                .map(|v| self.escape_value(v))
                .collect::<Vec<_>>()
                .join(", "),
            DbValue::Expr(expr) => expr.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::DbExpr;

    struct AnsiEscaper;
    impl SqlEscape for AnsiEscaper {}

    #[test]
    fn scalars_follow_shared_rules() {
        let esc = AnsiEscaper;
        assert_eq!(esc.escape_value(&DbValue::Int(42)), "42");
        assert_eq!(esc.escape_value(&DbValue::Float(1.5)), "1.5");
        assert_eq!(esc.escape_value(&DbValue::Null), "NULL");
        assert_eq!(esc.escape_value(&DbValue::Text("bob".into())), "'bob'");
        assert_eq!(esc.escape_value(&DbValue::Text("o'brien".into())), "'o''brien'");
    }

    #[test]
    fn expr_passes_through_unescaped() {
        let esc = AnsiEscaper;
        let v = DbValue::Expr(DbExpr::new("NOW()"));
        assert_eq!(esc.escape_value(&v), "NOW()");
    }

    #[test]
    fn arrays_flatten_comma_joined() {
        let esc = AnsiEscaper;
        let v = DbValue::Array(vec![DbValue::Int(1), DbValue::Text("a".into())]);
        assert_eq!(esc.escape_value(&v), "1, 'a'");
    }

    #[test]
    fn blob_renders_as_hex() {
        let esc = AnsiEscaper;
        assert_eq!(esc.escape_value(&DbValue::Blob(vec![0xDE, 0xAD])), "X'DEAD'");
    }

    #[test]
    fn identifiers_double_embedded_quotes() {
        let esc = AnsiEscaper;
        assert_eq!(esc.escape_field("name"), "\"name\"");
        assert_eq!(esc.escape_field("we\"ird"), "\"we\"\"ird\"");
    }
}
