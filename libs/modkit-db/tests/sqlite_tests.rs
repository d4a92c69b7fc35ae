#![cfg(feature = "sqlite")]

use modkit_db::{ConnectOpts, DbEngine, DbHandle};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

#[tokio::test]
async fn memory_database_survives_across_queries() -> anyhow::Result<()> {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
    assert_eq!(db.engine(), DbEngine::Sqlite);

    let conn = db.sea();
    conn.execute_unprepared("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT NOT NULL)")
        .await?;
    conn.execute_unprepared("INSERT INTO t (v) VALUES ('a'), ('b')")
        .await?;

    // A second handle clone must see the same in-memory database.
    let row = db
        .sea()
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) AS n FROM t",
        ))
        .await?
        .expect("count row");
    let n: i64 = row.try_get("", "n")?;
    assert_eq!(n, 2);

    let pool = db.sqlx_sqlite().expect("sqlite pool");
    assert_eq!(pool.size(), 1);

    db.close().await;
    Ok(())
}

#[tokio::test]
async fn file_database_creates_parent_dirs_and_strips_pragmas() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("holo.db");
    let dsn = format!("sqlite://{}?busy_timeout=250&wal=true", path.display());

    let db = DbHandle::connect(&dsn, ConnectOpts::default()).await?;
    assert!(path.exists());
    assert!(!db.dsn().contains("busy_timeout"));
    assert!(!db.dsn().contains("wal="));

    db.seaorm()
        .execute_unprepared("CREATE TABLE t (id INTEGER PRIMARY KEY)")
        .await?;
    db.close().await;
    Ok(())
}

#[tokio::test]
async fn unknown_scheme_is_rejected() {
    let err = DbHandle::connect("mssql://sa:pw@localhost/holo", ConnectOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, modkit_db::DbError::UnknownDsn(_)));
}
