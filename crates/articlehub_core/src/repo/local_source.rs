//! SQLite-backed article source used in demo mode.
//!
//! # Responsibility
//! - Keep demo articles in a local SQLite store (in-memory by default).
//! - Seed the welcome article exactly once per fresh store.
//!
//! # Invariants
//! - All statements filter by `user_id`; mutations also filter by `id`.
//! - `created_at`/`updated_at` are stored as fixed-width RFC 3339 strings so
//!   lexical order equals time order.
//! - Read paths reject rows that violate `updated_at >= created_at`.

use crate::db::{open_db, open_db_in_memory};
use crate::model::article::{Article, ArticleId, ArticlePatch, NewArticle};
use crate::model::session::{Session, DEMO_USER_ID, DEMO_USER_NAME};
use crate::repo::{ArticleSource, RepoError, RepoResult, SourceKind};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const ARTICLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    excerpt,
    cover_image,
    author,
    published,
    tags,
    created_at,
    updated_at
FROM articles";

const DEMO_SEEDED_KEY: &str = "demo_seeded";

/// Timestamps are stored as RFC 3339 with microseconds.
const STORED_SUBSEC_DIGITS: u16 = 6;
const WELCOME_TITLE: &str = "Welcome to ArticleHub";
const WELCOME_CONTENT: &str = "<p>This is a demo article showing the rich text editor capabilities. \
You can use <strong>bold</strong> and <em>italic</em> formatting, add images, and create beautiful content.</p>\
<p>To get started with the full version, configure a backend endpoint and access key.</p>";
const WELCOME_COVER: &str =
    "https://images.pexels.com/photos/261909/pexels-photo-261909.jpeg?auto=compress&cs=tinysrgb&w=800";

/// Local article source over one SQLite connection.
pub struct LocalArticleSource {
    conn: Mutex<Connection>,
}

impl LocalArticleSource {
    /// Wraps a migrated connection.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Inserts the welcome article for the demo identity on a fresh store.
    ///
    /// Returns `true` when the seed was written by this call.
    pub fn seed_demo(&self) -> RepoResult<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let already_seeded: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM store_meta WHERE key = ?1);",
                [DEMO_SEEDED_KEY],
                |row| row.get(0),
            )?;
        if already_seeded {
            return Ok(false);
        }

        let mut welcome = NewArticle::new(WELCOME_TITLE, WELCOME_CONTENT, DEMO_USER_NAME);
        welcome.cover_image = Some(WELCOME_COVER.to_string());
        welcome.published = true;
        welcome.tags = vec!["demo".to_string(), "welcome".to_string()];
        let article = welcome.into_article(ArticleId::generate(), stored_now());
        insert_row(&tx, DEMO_USER_ID, &article)?;

        tx.execute(
            "INSERT INTO store_meta (key, value) VALUES (?1, ?2);",
            params![DEMO_SEEDED_KEY, format_timestamp(article.created_at)],
        )?;
        tx.commit()?;

        info!(
            "event=demo_seed module=repo status=ok article_id={}",
            article.id
        );
        Ok(true)
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RepoError::BackendUnavailable("local store lock poisoned".to_string()))
    }

    fn fetch_sync(&self, owner: &str) -> RepoResult<Vec<Article>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{ARTICLE_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([owner])?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }
        Ok(articles)
    }

    fn insert_sync(&self, owner: &str, article: NewArticle) -> RepoResult<Article> {
        let id = article.id.clone().unwrap_or_else(ArticleId::generate);
        let created_at = article
            .created_at
            .unwrap_or_else(Utc::now)
            .trunc_subsecs(STORED_SUBSEC_DIGITS);
        let stored = article.into_article(id, created_at);

        let conn = self.lock()?;
        insert_row(&conn, owner, &stored)?;
        Ok(stored)
    }

    fn update_sync(
        &self,
        owner: &str,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> RepoResult<Article> {
        let conn = self.lock()?;
        let mut article =
            load_owned(&conn, owner, id)?.ok_or_else(|| RepoError::NotFound(id.clone()))?;
        patch.apply_to(&mut article, stored_now());
        article.validate_timestamps()?;

        let changed = conn.execute(
            "UPDATE articles
             SET
                title = ?3,
                content = ?4,
                excerpt = ?5,
                cover_image = ?6,
                author = ?7,
                published = ?8,
                tags = ?9,
                updated_at = ?10
             WHERE id = ?1
               AND user_id = ?2;",
            params![
                article.id.as_str(),
                owner,
                article.title.as_str(),
                article.content.as_str(),
                article.excerpt.as_str(),
                article.cover_image.as_deref(),
                article.author.as_str(),
                article.published,
                encode_tags(&article.tags)?,
                format_timestamp(article.updated_at),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(article)
    }

    fn delete_sync(&self, owner: &str, id: &ArticleId) -> RepoResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM articles WHERE id = ?1 AND user_id = ?2;",
            params![id.as_str(), owner],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl ArticleSource for LocalArticleSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Demo
    }

    async fn fetch_articles(&self, session: &Session) -> RepoResult<Vec<Article>> {
        self.fetch_sync(session.user_id())
    }

    async fn insert_article(&self, session: &Session, article: NewArticle) -> RepoResult<Article> {
        self.insert_sync(session.user_id(), article)
    }

    async fn update_article(
        &self,
        session: &Session,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> RepoResult<Article> {
        self.update_sync(session.user_id(), id, patch)
    }

    async fn delete_article(&self, session: &Session, id: &ArticleId) -> RepoResult<()> {
        self.delete_sync(session.user_id(), id)
    }
}

fn insert_row(conn: &Connection, owner: &str, article: &Article) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO articles (
            id,
            user_id,
            title,
            content,
            excerpt,
            cover_image,
            author,
            published,
            tags,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
        params![
            article.id.as_str(),
            owner,
            article.title.as_str(),
            article.content.as_str(),
            article.excerpt.as_str(),
            article.cover_image.as_deref(),
            article.author.as_str(),
            article.published,
            encode_tags(&article.tags)?,
            format_timestamp(article.created_at),
            format_timestamp(article.updated_at),
        ],
    )?;
    Ok(())
}

fn load_owned(conn: &Connection, owner: &str, id: &ArticleId) -> RepoResult<Option<Article>> {
    let mut stmt = conn.prepare(&format!(
        "{ARTICLE_SELECT_SQL}
         WHERE id = ?1
           AND user_id = ?2;"
    ))?;
    stmt.query_row(params![id.as_str(), owner], |row| {
        Ok(parse_article_row(row))
    })
    .optional()?
        .transpose()
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let tags_text: String = row.get("tags")?;
    let tags = serde_json::from_str::<Vec<String>>(&tags_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid tags value `{tags_text}` in articles.tags: {err}"))
    })?;

    let article = Article {
        id: ArticleId::new(row.get::<_, String>("id")?),
        title: row.get("title")?,
        content: row.get("content")?,
        excerpt: row.get("excerpt")?,
        cover_image: row.get("cover_image")?,
        author: row.get("author")?,
        published: row.get("published")?,
        tags,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    };
    article.validate_timestamps()?;
    Ok(article)
}

fn parse_timestamp(row: &Row<'_>, column: &'static str) -> RepoResult<DateTime<Utc>> {
    let text: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| RepoError::InvalidData(format!("invalid timestamp `{text}` in articles.{column}")))
}

/// Current time at the precision timestamps are stored with.
fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(STORED_SUBSEC_DIGITS)
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn encode_tags(tags: &[String]) -> RepoResult<String> {
    serde_json::to_string(tags)
        .map_err(|err| RepoError::InvalidData(format!("tags could not be encoded: {err}")))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["articles", "store_meta"] {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(RepoError::BackendUnavailable(format!(
                "local store is missing table `{table}`"
            )));
        }
    }
    Ok(())
}
