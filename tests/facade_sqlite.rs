#![cfg(feature = "sqlite")]

use db_facade::prelude::*;

const DDL: &str = "
CREATE TABLE player (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    score INTEGER NOT NULL,
    team TEXT
);
";

async fn connected_memory_db() -> DbFacade {
    let mut db = DbFacade::new("sqlite", ConnectParams::new()).unwrap();
    db.connect().await.unwrap();
    db.execute_batch(DDL).await.unwrap();
    db
}

async fn seed(db: &mut DbFacade) {
    db.insert(
        "player",
        &[
            ("name", DbValue::from("alice")),
            ("score", DbValue::Int(41)),
            ("team", DbValue::from("red")),
        ],
    )
    .await
    .unwrap();
    db.insert(
        "player",
        &[
            ("name", DbValue::from("bob")),
            ("score", DbValue::Int(27)),
            ("team", DbValue::Null),
        ],
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn connection_lifecycle() {
    let mut db = DbFacade::new("sqlite", ConnectParams::new()).unwrap();
    assert!(!db.is_connected());
    db.connect().await.unwrap();
    assert!(db.is_connected());
    db.close().await.unwrap();
    assert!(!db.is_connected());
    // closing again is fire-and-forget
    db.close().await.unwrap();
}

#[tokio::test]
async fn insert_then_fetch_roundtrip() {
    let mut db = connected_memory_db().await;
    seed(&mut db).await;

    assert_eq!(db.last_insert_id(), Some(2));

    let row = db
        .fetch_row("SELECT name, score FROM player WHERE name = ?", &[DbValue::from("alice")])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get("name"), Some(&DbValue::Text("alice".to_string())));
    assert_eq!(row.get("score"), Some(&DbValue::Int(41)));

    let all = db
        .fetch_all("SELECT name FROM player ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.rows[0].get_by_index(0), Some(&DbValue::Text("alice".to_string())));
    assert_eq!(all.rows[1].get_by_index(0), Some(&DbValue::Text("bob".to_string())));
}

#[tokio::test]
async fn empty_insert_data_is_rejected_without_a_statement() {
    let mut db = connected_memory_db().await;
    let err = db.insert("player", &[]).await.unwrap_err();
    assert!(matches!(err, DbFacadeError::ValidationError(_)));

    let count = db.fetch_one("SELECT COUNT(*) FROM player", &[]).await.unwrap();
    assert_eq!(count, Some(DbValue::Int(0)));
}

#[tokio::test]
async fn update_validates_where_clause() {
    let mut db = connected_memory_db().await;
    seed(&mut db).await;

    let data = [("score", DbValue::Int(50))];

    let err = db.update("player", &data, "").await.unwrap_err();
    assert!(matches!(err, DbFacadeError::ValidationError(_)));

    let err = db
        .update("player", &data, Vec::<WhereTerm>::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DbFacadeError::ValidationError(_)));

    let err = db.update("player", &[], "id = 1").await.unwrap_err();
    assert!(matches!(err, DbFacadeError::ValidationError(_)));

    let affected = db
        .update("player", &data, ("name = ?", "alice"))
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let score = db
        .fetch_one("SELECT score FROM player WHERE name = ?", &[DbValue::from("alice")])
        .await
        .unwrap();
    assert_eq!(score, Some(DbValue::Int(50)));
}

#[tokio::test]
async fn remove_validates_where_clause() {
    let mut db = connected_memory_db().await;
    seed(&mut db).await;

    let err = db.remove("player", "  ").await.unwrap_err();
    assert!(matches!(err, DbFacadeError::ValidationError(_)));

    let affected = db.remove("player", ("score < ?", 30)).await.unwrap();
    assert_eq!(affected, 1);

    let names = db.fetch_col("SELECT name FROM player", &[]).await.unwrap();
    assert_eq!(names, vec![DbValue::Text("alice".to_string())]);
}

#[tokio::test]
async fn fetch_col_returns_first_column_in_row_order() {
    let mut db = connected_memory_db().await;
    seed(&mut db).await;

    let scores = db
        .fetch_col("SELECT score, name FROM player ORDER BY id", &[])
        .await
        .unwrap();
    assert_eq!(scores, vec![DbValue::Int(41), DbValue::Int(27)]);

    let none = db
        .fetch_col("SELECT score FROM player WHERE score > 100", &[])
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn fetch_one_distinguishes_no_row_from_null() {
    let mut db = connected_memory_db().await;
    seed(&mut db).await;

    let missing = db
        .fetch_one("SELECT team FROM player WHERE name = ?", &[DbValue::from("carol")])
        .await
        .unwrap();
    assert_eq!(missing, None);

    let null_team = db
        .fetch_one("SELECT team FROM player WHERE name = ?", &[DbValue::from("bob")])
        .await
        .unwrap();
    assert_eq!(null_team, Some(DbValue::Null));
}

#[tokio::test]
async fn select_builder_runs_end_to_end() {
    let mut db = connected_memory_db().await;
    seed(&mut db).await;

    let select = db
        .select()
        .unwrap()
        .columns(["name", "score"])
        .from("player")
        .and_where(("score > ?", 10))
        .order_by("score DESC")
        .limit(1);
    let result = db.fetch_all(select, &[]).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(
        result.rows[0].get("name"),
        Some(&DbValue::Text("alice".to_string()))
    );
}

#[tokio::test]
async fn facade_escape_flattens_arrays() {
    let mut db = DbFacade::new("sqlite", ConnectParams::new()).unwrap();

    let err = db.escape(&DbValue::Int(1)).unwrap_err();
    assert!(matches!(err, DbFacadeError::ConnectionError(_)));

    db.connect().await.unwrap();
    let list = DbValue::Array(vec![DbValue::Int(1), DbValue::from("a")]);
    assert_eq!(db.escape(&list).unwrap(), "1, 'a'");
    assert_eq!(db.escape(&DbValue::from(DbExpr::new("COUNT(*)"))).unwrap(), "COUNT(*)");
}

#[tokio::test]
async fn on_disk_database_persists_across_facades() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("players.db");
    let params = ConnectParams::new().database(path.to_string_lossy());

    let mut db = DbFacade::new("sqlite", params.clone()).unwrap();
    db.connect().await.unwrap();
    db.execute_batch(DDL).await.unwrap();
    seed(&mut db).await;
    db.close().await.unwrap();

    let mut reopened = DbFacade::new("sqlite", params).unwrap();
    let count = reopened
        .fetch_one("SELECT COUNT(*) FROM player", &[])
        .await
        .unwrap();
    assert_eq!(count, Some(DbValue::Int(2)));
    // fetch_one connected lazily
    assert!(reopened.is_connected());
}

#[tokio::test]
async fn query_interpolates_bind_values() {
    let mut db = connected_memory_db().await;
    seed(&mut db).await;

    let affected = db
        .query("DELETE FROM player WHERE name = ?", &[DbValue::from("bob")])
        .await
        .unwrap();
    assert_eq!(affected, 1);

    // no bind values: the statement passes through untouched, so the
    // driver sees the bare ? and rejects the unbound parameter
    let err = db
        .query("DELETE FROM player WHERE name = ?", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbFacadeError::SqliteError(_)));
}
