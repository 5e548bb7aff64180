use articlehub_core::{ArticlePatch, ArticleValidationError, NewArticle};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

#[test]
fn article_serializes_with_camel_case_keys() {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();
    let mut draft = NewArticle::new("Hello", "<p>World</p>", "Ada");
    draft.cover_image = Some("https://img.example/c.png".to_string());
    let article = draft.into_article("a-1".into(), created_at);

    let value = serde_json::to_value(&article).unwrap();
    assert_eq!(
        value,
        json!({
            "id": "a-1",
            "title": "Hello",
            "content": "<p>World</p>",
            "excerpt": "World...",
            "coverImage": "https://img.example/c.png",
            "author": "Ada",
            "createdAt": "2024-01-05T09:30:00Z",
            "updatedAt": "2024-01-05T09:30:00Z",
            "published": false,
            "tags": [],
        })
    );
    assert!(article.is_draft());
}

#[test]
fn validate_rejects_blank_required_fields() {
    let created_at = Utc::now();
    let blank_title = NewArticle::new("  ", "<p>x</p>", "Ada").into_article("a".into(), created_at);
    assert_eq!(blank_title.validate(), Err(ArticleValidationError::EmptyTitle));

    let blank_author = NewArticle::new("t", "<p>x</p>", "").into_article("b".into(), created_at);
    assert_eq!(blank_author.validate(), Err(ArticleValidationError::EmptyAuthor));

    let mut reversed = NewArticle::new("t", "<p>x</p>", "Ada").into_article("c".into(), created_at);
    reversed.updated_at = created_at - Duration::seconds(1);
    assert!(matches!(
        reversed.validate(),
        Err(ArticleValidationError::TimestampOrder { .. })
    ));
}

#[test]
fn content_patch_rederives_excerpt_and_keeps_other_fields() {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();
    let mut draft = NewArticle::new("Hello", "<p>World</p>", "Ada");
    draft.tags = vec!["rust".to_string()];
    let original = draft.into_article("a-1".into(), created_at);

    let mut patched = original.clone();
    let patch = ArticlePatch {
        content: Some("<h2>New</h2><p>text</p>".to_string()),
        ..ArticlePatch::default()
    };
    assert!(!patch.is_empty());
    let now = created_at + Duration::hours(1);
    patch.apply_to(&mut patched, now);

    assert_eq!(patched.excerpt, "Newtext...");
    assert_eq!(patched.updated_at, now);
    assert_eq!(patched.title, original.title);
    assert_eq!(patched.tags, original.tags);
    assert_eq!(patched.created_at, original.created_at);
    assert!(ArticlePatch::default().is_empty());
}
