use articlehub_core::model::session::Identity;
use articlehub_core::{
    ArticleId, ArticlePatch, ArticleSource, LocalArticleSource, NewArticle, RepoError, Session,
    SourceKind,
};
use chrono::{Duration, TimeZone, Utc};

fn session_for(id: &str) -> Session {
    Session::without_tokens(Identity {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        display_name: id.to_string(),
    })
}

fn draft(title: &str) -> NewArticle {
    NewArticle::new(title, format!("<p>{title} body</p>"), "Ada")
}

#[tokio::test]
async fn insert_assigns_id_timestamps_and_excerpt() {
    let source = LocalArticleSource::in_memory().unwrap();
    let ada = session_for("ada");
    assert_eq!(source.kind(), SourceKind::Demo);

    let mut new = draft("Hello");
    new.tags = vec!["rust".into(), "rust".into(), " rust ".into(), "web".into()];
    let stored = source.insert_article(&ada, new).await.unwrap();

    assert!(!stored.id.as_str().is_empty());
    assert_eq!(stored.excerpt, "Hello body...");
    assert_eq!(stored.created_at, stored.updated_at);
    assert_eq!(stored.tags, vec!["rust", " rust ", "web"]);

    let listed = source.fetch_articles(&ada).await.unwrap();
    assert_eq!(listed, vec![stored]);
}

#[tokio::test]
async fn insert_keeps_caller_supplied_id_and_created_at() {
    let source = LocalArticleSource::in_memory().unwrap();
    let created_at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
    let mut new = draft("Pinned");
    new.id = Some(ArticleId::new("client-id"));
    new.created_at = Some(created_at);

    let stored = source
        .insert_article(&session_for("ada"), new)
        .await
        .unwrap();
    assert_eq!(stored.id.as_str(), "client-id");
    assert_eq!(stored.created_at, created_at);
}

#[tokio::test]
async fn fetch_orders_newest_first_and_scopes_by_owner() {
    let source = LocalArticleSource::in_memory().unwrap();
    let ada = session_for("ada");
    let bob = session_for("bob");
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    for (title, days) in [("oldest", 0), ("newest", 2), ("middle", 1)] {
        let mut new = draft(title);
        new.created_at = Some(base + Duration::days(days));
        source.insert_article(&ada, new).await.unwrap();
    }
    source.insert_article(&bob, draft("bob's")).await.unwrap();

    let titles: Vec<String> = source
        .fetch_articles(&ada)
        .await
        .unwrap()
        .into_iter()
        .map(|article| article.title)
        .collect();
    assert_eq!(titles, vec!["newest", "middle", "oldest"]);
    assert_eq!(source.fetch_articles(&bob).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_applies_patch_and_refreshes_updated_at() {
    let source = LocalArticleSource::in_memory().unwrap();
    let ada = session_for("ada");
    let mut new = draft("Before");
    new.created_at = Some(Utc::now() - Duration::hours(1));
    let stored = source.insert_article(&ada, new).await.unwrap();

    let patch = ArticlePatch {
        content: Some("<h1>After</h1>".to_string()),
        cover_image: Some(None),
        ..ArticlePatch::title("After")
    };
    let updated = source
        .update_article(&ada, &stored.id, &patch)
        .await
        .unwrap();

    assert_eq!(updated.title, "After");
    assert_eq!(updated.excerpt, "After...");
    assert_eq!(updated.cover_image, None);
    assert_eq!(updated.created_at, stored.created_at);
    assert!(updated.updated_at > stored.updated_at);
    assert_eq!(source.fetch_articles(&ada).await.unwrap(), vec![updated]);
}

#[tokio::test]
async fn writes_to_another_owners_article_are_not_found() {
    let source = LocalArticleSource::in_memory().unwrap();
    let ada = session_for("ada");
    let mallory = session_for("mallory");
    let stored = source.insert_article(&ada, draft("Mine")).await.unwrap();

    let err = source
        .update_article(&mallory, &stored.id, &ArticlePatch::title("Stolen"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == stored.id));

    let err = source
        .delete_article(&mallory, &stored.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));

    assert_eq!(source.fetch_articles(&ada).await.unwrap(), vec![stored]);
}

#[tokio::test]
async fn delete_of_missing_article_is_not_found() {
    let source = LocalArticleSource::in_memory().unwrap();
    let err = source
        .delete_article(&session_for("ada"), &ArticleId::new("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[tokio::test]
async fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.db");
    let ada = session_for("ada");

    let stored = {
        let source = LocalArticleSource::open(&path).unwrap();
        assert!(source.seed_demo().unwrap());
        source.insert_article(&ada, draft("Kept")).await.unwrap()
    };

    let reopened = LocalArticleSource::open(&path).unwrap();
    assert!(!reopened.seed_demo().unwrap());
    assert_eq!(reopened.fetch_articles(&ada).await.unwrap(), vec![stored]);
    assert_eq!(
        reopened
            .fetch_articles(&Session::demo())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn corrupt_tags_surface_as_invalid_data() {
    let conn = articlehub_core::db::open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO articles (
            id, user_id, title, content, excerpt, author, published, tags, created_at, updated_at
         ) VALUES (
            'a', 'ada', 't', 'c', 'c...', 'Ada', 0, 'not-json',
            '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z'
         );",
        [],
    )
    .unwrap();
    let source = LocalArticleSource::try_new(conn).unwrap();

    let err = source
        .fetch_articles(&session_for("ada"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
