use chrono::{Duration, Utc};
use link_shortener::domain::entities::{LinkPatch, NewLink};
use link_shortener::domain::errors::StoreError;
use link_shortener::domain::repositories::LinkRepository;
use link_shortener::infrastructure::persistence::PgLinkRepository;
use sqlx::PgPool;
use std::sync::Arc;

fn new_link(code: &str) -> NewLink {
    NewLink {
        original_url: "https://example.com".to_string(),
        short_code: code.to_string(),
        expires_at: None,
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_find_link(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo.create(new_link("test123")).await.unwrap();
    assert_eq!(link.short_code, "test123");
    assert_eq!(link.original_url, "https://example.com");
    assert!(link.deleted_at.is_none());

    let found = repo.find_by_code("test123").await.unwrap().unwrap();
    assert_eq!(found.id, link.id);
    assert!(repo.exists_by_code("test123").await.unwrap());
    assert!(repo.find_by_code("missing1").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_code_is_reported(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    repo.create(new_link("dupe001")).await.unwrap();
    let err = repo.create(new_link("dupe001")).await.unwrap_err();

    assert_eq!(err, StoreError::DuplicateCode("dupe001".to_string()));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_soft_deleted_code_is_free_again(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo.create(new_link("reuse01")).await.unwrap();
    let deleted = repo
        .update(&link, LinkPatch::soft_delete(Utc::now()))
        .await
        .unwrap();
    assert!(deleted.is_deleted());

    assert!(repo.find_by_code("reuse01").await.unwrap().is_none());
    assert!(!repo.exists_by_code("reuse01").await.unwrap());
    assert!(repo.create(new_link("reuse01")).await.is_ok());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_active_lookup_skips_expired(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    repo.create(NewLink {
        expires_at: Some(Utc::now() - Duration::minutes(1)),
        ..new_link("expired1")
    })
    .await
    .unwrap();

    assert!(repo.find_active_by_code("expired1").await.unwrap().is_none());
    assert!(repo.find_by_code("expired1").await.unwrap().unwrap().is_expired());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_expired_and_delete(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let older = repo
        .create(NewLink {
            expires_at: Some(Utc::now() - Duration::hours(2)),
            ..new_link("older01")
        })
        .await
        .unwrap();
    repo.create(NewLink {
        expires_at: Some(Utc::now() - Duration::hours(1)),
        ..new_link("newer01")
    })
    .await
    .unwrap();
    repo.create(NewLink {
        expires_at: Some(Utc::now() + Duration::hours(1)),
        ..new_link("future1")
    })
    .await
    .unwrap();

    let expired = repo.list_expired().await.unwrap();
    let codes: Vec<_> = expired.iter().map(|l| l.short_code.as_str()).collect();
    assert_eq!(codes, vec!["older01", "newer01"]);

    assert!(repo.delete(&older).await.unwrap());
    assert!(!repo.delete(&older).await.unwrap());
    assert_eq!(repo.list_expired().await.unwrap().len(), 1);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_ping(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    assert!(repo.ping().await.is_ok());
}
