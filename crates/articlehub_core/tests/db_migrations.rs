use articlehub_core::db::migrations::latest_version;
use articlehub_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

fn user_version(conn: &Connection) -> u32 {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap()
}

fn article_columns(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('articles');").unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn insert_row(conn: &Connection, id: &str, published: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO articles (id, user_id, title, content, author, published, created_at, updated_at)
         VALUES (?1, 'ada', 'Hello', '<p>World</p>', 'Ada', ?2, '2024-01-05T09:00:00.000000Z', '2024-01-05T09:00:00.000000Z');",
        rusqlite::params![id, published],
    )
}

#[test]
fn fresh_store_has_the_article_table_at_the_latest_version() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(user_version(&conn), latest_version());
    assert_eq!(
        article_columns(&conn),
        [
            "id",
            "user_id",
            "title",
            "content",
            "excerpt",
            "cover_image",
            "author",
            "published",
            "tags",
            "created_at",
            "updated_at",
        ]
    );

    insert_row(&conn, "a1", 1).unwrap();
    let (excerpt, tags): (String, String) = conn
        .query_row(
            "SELECT excerpt, tags FROM articles WHERE id = 'a1';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(excerpt, "");
    assert_eq!(tags, "[]");
}

#[test]
fn reopening_a_demo_file_keeps_its_articles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo").join("articles.db");

    let conn = open_db(&path).unwrap();
    insert_row(&conn, "kept", 0).unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(user_version(&conn), latest_version());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM articles WHERE user_id = 'ada';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn store_from_a_newer_build_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.db");
    let future = latest_version() + 1;
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", future)
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::SchemaTooNew { found, supported } if found == future && supported == latest_version()
    ));
    assert!(err.to_string().contains(&format!("v{future}")));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(user_version(&conn), future);
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'articles';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);
}

#[test]
fn published_flag_is_restricted_to_booleans() {
    let conn = open_db_in_memory().unwrap();
    assert!(insert_row(&conn, "bad", 2).is_err());
    assert!(insert_row(&conn, "good", 1).is_ok());
}
