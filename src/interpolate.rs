//! Placeholder substitution for statements headed to the driver.
//!
//! Many native drivers disagree on parameter binding, so the adapters
//! standardize on interpolation: each `?` outside string literals, quoted
//! identifiers, and comments is replaced with the escaped rendering of the
//! next bind value before the driver ever sees the statement.

use crate::error::DbFacadeError;
use crate::escape::SqlEscape;
use crate::types::DbValue;

#[derive(Clone, Copy)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
}

fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Walk `sql` and replace every bare `?` via `substitute`, which receives the
/// zero-based placeholder index. Quoting and comments are tracked with a
/// lightweight state machine so `?` inside literals survives untouched.
/// Copies whole slices between placeholders, so multibyte text is preserved.
fn substitute_placeholders<F>(sql: &str, mut substitute: F) -> Result<(String, usize), DbFacadeError>
where
    F: FnMut(usize) -> Result<String, DbFacadeError>,
{
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut state = State::Normal;
    let mut seen = 0usize;
    let mut copied = 0usize;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' | b'`' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'?' => {
                    out.push_str(&sql[copied..idx]);
                    out.push_str(&substitute(seen)?);
                    seen += 1;
                    copied = idx + 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // doubled quote stays inside the literal
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' || b == b'`' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    out.push_str(&sql[copied..]);
    Ok((out, seen))
}

/// Interpolate `bind` values into `sql`.
///
/// An empty bind slice returns the statement unchanged, so raw SQL carrying a
/// literal `?` can still be issued without binding.
///
/// # Errors
///
/// Returns `DbFacadeError::ParameterError` if the number of placeholders does
/// not match the number of bind values.
pub fn bind_placeholders(
    sql: &str,
    bind: &[DbValue],
    escaper: &dyn SqlEscape,
) -> Result<String, DbFacadeError> {
    if bind.is_empty() {
        return Ok(sql.to_string());
    }

    let (out, seen) = substitute_placeholders(sql, |idx| {
        bind.get(idx)
            .map(|v| escaper.escape_value(v))
            .ok_or_else(|| {
                DbFacadeError::ParameterError(format!(
                    "statement has more placeholders than the {} bind value(s) supplied",
                    bind.len()
                ))
            })
    })?;

    if seen != bind.len() {
        return Err(DbFacadeError::ParameterError(format!(
            "statement has {seen} placeholder(s) but {} bind value(s) were supplied",
            bind.len()
        )));
    }

    Ok(out)
}

/// Replace every `?` in a WHERE-term template with the escaped rendering of
/// one value. The value is inlined, not parameter-bound.
pub(crate) fn fill_template(
    template: &str,
    value: &DbValue,
    escaper: &dyn SqlEscape,
) -> Result<String, DbFacadeError> {
    let rendered = escaper.escape_value(value);
    let (out, _) = substitute_placeholders(template, |_| Ok(rendered.clone()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AnsiEscaper;
    impl SqlEscape for AnsiEscaper {}

    #[test]
    fn interpolates_in_order() {
        let bind = vec![DbValue::Int(5), DbValue::Text("bob".into())];
        let out = bind_placeholders("select * from t where a = ? and b = ?", &bind, &AnsiEscaper)
            .unwrap();
        assert_eq!(out, "select * from t where a = 5 and b = 'bob'");
    }

    #[test]
    fn empty_bind_passes_through() {
        let out = bind_placeholders("select '?' from t", &[], &AnsiEscaper).unwrap();
        assert_eq!(out, "select '?' from t");
    }

    #[test]
    fn skips_literals_and_comments() {
        let bind = vec![DbValue::Int(1)];
        let out = bind_placeholders(
            "select '?', \"co?l\" -- ?\n/* ? */ from t where a = ?",
            &bind,
            &AnsiEscaper,
        )
        .unwrap();
        assert_eq!(out, "select '?', \"co?l\" -- ?\n/* ? */ from t where a = 1");
    }

    #[test]
    fn too_few_binds_is_an_error() {
        let bind = vec![DbValue::Int(1)];
        let err = bind_placeholders("a = ? and b = ?", &bind, &AnsiEscaper).unwrap_err();
        assert!(matches!(err, DbFacadeError::ParameterError(_)));
    }

    #[test]
    fn too_many_binds_is_an_error() {
        let bind = vec![DbValue::Int(1), DbValue::Int(2)];
        let err = bind_placeholders("a = ?", &bind, &AnsiEscaper).unwrap_err();
        assert!(matches!(err, DbFacadeError::ParameterError(_)));
    }

    #[test]
    fn template_fill_repeats_one_value() {
        let out = fill_template("a = ? or b = ?", &DbValue::Int(3), &AnsiEscaper).unwrap();
        assert_eq!(out, "a = 3 or b = 3");
    }

    #[test]
    fn doubled_quote_inside_literal_stays_literal() {
        let bind = vec![DbValue::Int(1)];
        let out = bind_placeholders("select 'it''s ?' where a = ?", &bind, &AnsiEscaper).unwrap();
        assert_eq!(out, "select 'it''s ?' where a = 1");
    }
}
