use articlehub_core::model::session::Identity;
use articlehub_core::{
    Article, ArticleId, ArticlePatch, ArticleSource, ArticleStore, LocalArticleSource, NewArticle,
    RepoError, RepoResult, Session, SourceKind,
};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::watch;

fn session_for(id: &str) -> Session {
    Session::without_tokens(Identity {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        display_name: id.to_string(),
    })
}

fn store_with(
    source: Arc<dyn ArticleSource>,
    session: Option<Session>,
) -> (ArticleStore, watch::Sender<Option<Session>>) {
    let (sender, receiver) = watch::channel(session);
    (ArticleStore::new(source, receiver), sender)
}

fn local_store(session: Option<Session>) -> (ArticleStore, watch::Sender<Option<Session>>) {
    store_with(Arc::new(LocalArticleSource::in_memory().unwrap()), session)
}

fn dated(title: &str, day: u32) -> NewArticle {
    let mut draft = NewArticle::new(title, format!("<p>{title}</p>"), "Ada");
    draft.created_at = Some(Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap());
    draft
}

fn ids(articles: &[Article]) -> Vec<String> {
    articles.iter().map(|article| article.id.to_string()).collect()
}

#[tokio::test]
async fn created_article_is_listed_with_derived_excerpt() {
    let (mut store, _session) = local_store(Some(session_for("ada")));

    let created = store
        .create(NewArticle::new("Hello", "<p>World</p>", "Ada"))
        .await
        .unwrap();

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], created);
    assert_eq!(listed[0].excerpt, "World...");
    assert_eq!(store.source_kind(), SourceKind::Demo);
}

#[tokio::test]
async fn create_prepends_to_the_loaded_collection() {
    let (mut store, _session) = local_store(Some(session_for("ada")));
    store.create(dated("first", 1)).await.unwrap();
    let second = store.create(dated("second", 2)).await.unwrap();

    assert_eq!(store.articles()[0], second);
    assert_eq!(store.articles().len(), 2);
}

#[tokio::test]
async fn delete_removes_only_the_target_and_keeps_order() {
    let (mut store, _session) = local_store(Some(session_for("ada")));
    let a = store.create(dated("a", 1)).await.unwrap();
    let b = store.create(dated("b", 2)).await.unwrap();
    let c = store.create(dated("c", 3)).await.unwrap();
    assert_eq!(
        ids(store.list().await.unwrap()),
        ids(&[c.clone(), b.clone(), a.clone()])
    );

    store.delete(&b.id).await.unwrap();
    assert_eq!(ids(store.articles()), ids(&[c.clone(), a.clone()]));

    store.refresh().await.unwrap();
    assert_eq!(ids(store.articles()), ids(&[c, a]));
    assert!(store.get(&b.id).is_none());
}

#[tokio::test]
async fn title_update_changes_only_title_and_updated_at() {
    let (mut store, _session) = local_store(Some(session_for("ada")));
    let mut draft = NewArticle::new("Before", "<p>Body</p>", "Ada");
    draft.tags = vec!["rust".into()];
    draft.cover_image = Some("https://img.example/c.png".into());
    draft.created_at = Some(Utc::now() - Duration::minutes(5));
    let before = store.create(draft).await.unwrap();

    let after = store
        .update(&before.id, ArticlePatch::title("X"))
        .await
        .unwrap();

    assert!(after.updated_at > before.updated_at);
    assert_eq!(
        after,
        Article {
            title: "X".to_string(),
            updated_at: after.updated_at,
            ..before
        }
    );
    assert_eq!(store.list().await.unwrap(), [after]);
}

#[tokio::test]
async fn writes_without_identity_fail_and_change_nothing() {
    let (mut store, _session) = local_store(None);
    assert!(store.list().await.unwrap().is_empty());
    assert!(store.is_loaded());

    let err = store
        .create(NewArticle::new("Hello", "<p>World</p>", "Ada"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::AuthenticationRequired));

    let id = ArticleId::new("any");
    assert!(matches!(
        store.update(&id, ArticlePatch::title("X")).await,
        Err(RepoError::AuthenticationRequired)
    ));
    assert!(matches!(
        store.delete(&id).await,
        Err(RepoError::AuthenticationRequired)
    ));
    assert!(store.articles().is_empty());
    assert_eq!(store.last_error(), Some("user not authenticated"));
}

#[tokio::test]
async fn sign_out_resets_the_collection() {
    let (mut store, session) = local_store(Some(session_for("ada")));
    store.create(dated("one", 1)).await.unwrap();
    store.create(dated("two", 2)).await.unwrap();
    assert_eq!(store.list().await.unwrap().len(), 2);

    session.send_replace(None);
    assert!(store.list().await.unwrap().is_empty());

    let err = store.create(dated("three", 3)).await.unwrap_err();
    assert!(matches!(err, RepoError::AuthenticationRequired));
}

#[tokio::test]
async fn identity_change_reloads_for_the_new_owner() {
    let source: Arc<dyn ArticleSource> = Arc::new(LocalArticleSource::in_memory().unwrap());
    let (mut store, session) = store_with(source.clone(), Some(session_for("ada")));
    store.create(dated("ada's", 1)).await.unwrap();
    source
        .insert_article(&session_for("bob"), dated("bob's", 2))
        .await
        .unwrap();

    session.send_replace(Some(session_for("bob")));
    let titles: Vec<&str> = store
        .list()
        .await
        .unwrap()
        .iter()
        .map(|article| article.title.as_str())
        .collect();
    assert_eq!(titles, ["bob's"]);
}

#[tokio::test]
async fn update_of_unknown_article_is_not_found_and_leaves_state() {
    let (mut store, _session) = local_store(Some(session_for("ada")));
    let kept = store.create(dated("kept", 1)).await.unwrap();

    let err = store
        .update(&ArticleId::new("ghost"), ArticlePatch::title("X"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
    assert_eq!(store.articles(), [kept]);
    assert!(store.last_error().is_some());
}

/// Serves reads from a local store and rejects every write.
struct RejectingSource {
    inner: LocalArticleSource,
}

#[async_trait]
impl ArticleSource for RejectingSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    async fn fetch_articles(&self, session: &Session) -> RepoResult<Vec<Article>> {
        self.inner.fetch_articles(session).await
    }

    async fn insert_article(&self, _session: &Session, _article: NewArticle) -> RepoResult<Article> {
        Err(rejected())
    }

    async fn update_article(
        &self,
        _session: &Session,
        _id: &ArticleId,
        _patch: &ArticlePatch,
    ) -> RepoResult<Article> {
        Err(rejected())
    }

    async fn delete_article(&self, _session: &Session, _id: &ArticleId) -> RepoResult<()> {
        Err(rejected())
    }
}

fn rejected() -> RepoError {
    RepoError::RemoteOperationFailed {
        status: Some(403),
        message: "permission denied for table articles".to_string(),
    }
}

#[tokio::test]
async fn rejected_writes_surface_the_error_and_keep_the_collection() {
    let ada = session_for("ada");
    let inner = LocalArticleSource::in_memory().unwrap();
    let existing = inner.insert_article(&ada, dated("existing", 1)).await.unwrap();
    let (mut store, _session) = store_with(Arc::new(RejectingSource { inner }), Some(ada));
    assert_eq!(store.list().await.unwrap(), [existing.clone()]);

    let err = store.create(dated("new", 2)).await.unwrap_err();
    assert!(matches!(
        err,
        RepoError::RemoteOperationFailed {
            status: Some(403),
            ..
        }
    ));
    assert!(store
        .update(&existing.id, ArticlePatch::title("X"))
        .await
        .is_err());
    assert!(store.delete(&existing.id).await.is_err());

    assert_eq!(store.articles(), [existing]);
    assert_eq!(
        store.last_error(),
        Some("backend rejected request (403): permission denied for table articles")
    );
}

#[tokio::test]
async fn expired_session_reads_empty_and_refuses_writes() {
    let (mut store, session) = local_store(Some(session_for("ada")));
    store.create(dated("one", 1)).await.unwrap();
    assert_eq!(store.list().await.unwrap().len(), 1);

    let mut expired = session_for("ada");
    expired.expires_at = Some(Utc::now() - Duration::minutes(1));
    session.send_replace(Some(expired));

    assert!(store.list().await.unwrap().is_empty());
    let err = store.create(dated("two", 2)).await.unwrap_err();
    assert!(matches!(err, RepoError::AuthenticationRequired));

    session.send_replace(Some(session_for("ada")));
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn stored_tags_keep_caller_spelling() {
    let (mut store, _session) = local_store(Some(session_for("ada")));
    let mut draft = dated("tagged", 1);
    draft.tags = vec!["rust".into(), " rust ".into(), "rust".into()];
    let created = store.create(draft).await.unwrap();
    assert_eq!(created.tags, ["rust", " rust "]);

    let patch = ArticlePatch {
        tags: Some(vec!["Web".into(), "web".into(), "Web".into()]),
        ..ArticlePatch::default()
    };
    let updated = store.update(&created.id, patch).await.unwrap();
    assert_eq!(updated.tags, ["Web", "web"]);
}
