#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use db_facade::prelude::*;

#[test]
fn raw_terms_parenthesize_and_join_with_and() {
    let clause = Where::from(vec![WhereTerm::raw("a=1"), WhereTerm::raw("b=2")]);
    assert_eq!(clause.render(&SqliteEscaper).unwrap(), "(a=1) AND (b=2)");
}

#[test]
fn pair_terms_inline_escaped_values() {
    let clause = Where::from(("id=?", 5));
    assert_eq!(clause.render(&SqliteEscaper).unwrap(), "(id=5)");

    let clause = Where::from(("name=?", "bob"));
    assert_eq!(clause.render(&SqliteEscaper).unwrap(), "(name='bob')");
}

#[test]
fn pair_templates_replace_every_placeholder() {
    let clause = Where::from(("a = ? OR b = ?", 7));
    assert_eq!(clause.render(&SqliteEscaper).unwrap(), "(a = 7 OR b = 7)");
}

#[test]
fn placeholders_inside_literals_survive() {
    let clause = Where::from(("note = '?' AND id = ?", 9));
    assert_eq!(
        clause.render(&SqliteEscaper).unwrap(),
        "(note = '?' AND id = 9)"
    );
}

#[test]
fn nested_groups_join_recursively() {
    let clause = Where::from(vec![
        WhereTerm::Group(vec![WhereTerm::raw("a=1"), WhereTerm::raw("b=2")]),
        WhereTerm::raw("c=3"),
    ]);
    assert_eq!(
        clause.render(&SqliteEscaper).unwrap(),
        "((a=1) AND (b=2)) AND (c=3)"
    );
}

#[test]
fn blank_detection() {
    assert!(Where::new().is_blank());
    assert!(Where::from("").is_blank());
    assert!(Where::from("   ").is_blank());
    assert!(!Where::from("id = 1").is_blank());
    assert!(!Where::from(("id = ?", 1)).is_blank());
}

#[test]
fn timestamps_render_as_quoted_datetime_literals() {
    let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(17, 30, 0)
        .unwrap();
    assert_eq!(
        SqliteEscaper.escape_value(&DbValue::Timestamp(dt)),
        "'2024-03-09 17:30:00'"
    );
}

#[test]
fn sqlite_booleans_render_as_integers() {
    assert_eq!(SqliteEscaper.escape_value(&DbValue::Bool(true)), "1");
    assert_eq!(SqliteEscaper.escape_value(&DbValue::Bool(false)), "0");
}

#[cfg(feature = "mysql")]
#[test]
fn mysql_strings_escape_backslash_style() {
    assert_eq!(
        MysqlEscaper.escape_value(&DbValue::Text("a'b\\c\nd".to_string())),
        "'a\\'b\\\\c\\nd'"
    );
    assert_eq!(MysqlEscaper.escape_field("we`ird"), "`we``ird`");
}

#[cfg(feature = "postgres")]
#[test]
fn postgres_blobs_use_bytea_hex() {
    assert_eq!(
        PostgresEscaper.escape_value(&DbValue::Blob(vec![0xDE, 0xAD, 0xBE, 0xEF])),
        "'\\xdeadbeef'"
    );
    assert_eq!(
        PostgresEscaper.escape_value(&DbValue::Bool(true)),
        "TRUE"
    );
}

#[test]
fn json_values_escape_as_text() {
    let json = serde_json::json!({"k": "v'"});
    assert_eq!(
        SqliteEscaper.escape_value(&DbValue::Json(json)),
        "'{\"k\":\"v''\"}'"
    );
}
