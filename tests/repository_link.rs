mod common;

use linkpulse::domain::repositories::LinkRepository;
use linkpulse::infrastructure::persistence::PgLinkRepository;
use sqlx::PgPool;
use std::sync::Arc;

#[sqlx::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_find_in_default_scope(pool: PgPool) {
    let id = common::create_test_link(&pool, "abc123", "https://example.com", None).await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo
        .find_by_scope_and_code(None, "abc123")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(link.id, id);
    assert_eq!(link.long_url, "https://example.com");
    assert!(link.domain_id.is_none());
    assert!(link.is_active);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_find_not_found(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let result = repo.find_by_scope_and_code(None, "notfound").await.unwrap();

    assert!(result.is_none());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_same_code_in_different_scopes(pool: PgPool) {
    let domain_id = common::create_test_domain(&pool, "go.brand.example").await;
    common::create_test_link(&pool, "promo", "https://default.example", None).await;
    common::create_test_link(&pool, "promo", "https://brand.example", Some(domain_id)).await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let default = repo
        .find_by_scope_and_code(None, "promo")
        .await
        .unwrap()
        .unwrap();
    let custom = repo
        .find_by_scope_and_code(Some(domain_id), "promo")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(default.long_url, "https://default.example");
    assert_eq!(custom.long_url, "https://brand.example");
    assert_eq!(custom.domain_id, Some(domain_id));
}

#[sqlx::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_custom_scope_does_not_see_default_links(pool: PgPool) {
    let domain_id = common::create_test_domain(&pool, "go.brand.example").await;
    common::create_test_link(&pool, "abc123", "https://example.com", None).await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let result = repo
        .find_by_scope_and_code(Some(domain_id), "abc123")
        .await
        .unwrap();

    assert!(result.is_none());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_code_in_default_scope_rejected(pool: PgPool) {
    common::create_test_link(&pool, "dup", "https://one.example", None).await;

    let result = sqlx::query(
        "INSERT INTO links (user_id, code, long_url) VALUES (1, 'dup', 'https://two.example')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_expired_link_is_still_returned(pool: PgPool) {
    common::create_expired_link(&pool, "old", "https://example.com/old").await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo
        .find_by_scope_and_code(None, "old")
        .await
        .unwrap()
        .unwrap();

    assert!(link.is_expired());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_ping(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert!(repo.ping().await.is_ok());
}
