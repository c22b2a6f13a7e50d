mod common;

use linkpulse::domain::repositories::DomainRepository;
use linkpulse::infrastructure::persistence::PgDomainRepository;
use sqlx::PgPool;
use std::sync::Arc;

#[sqlx::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_find_by_name(pool: PgPool) {
    let id = common::create_test_domain(&pool, "find-me.com").await;
    let repo = PgDomainRepository::new(Arc::new(pool));

    let domain = repo.find_by_name("find-me.com").await.unwrap().unwrap();

    assert_eq!(domain.id, id);
    assert_eq!(domain.domain, "find-me.com");
}

#[sqlx::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_find_by_name_not_found(pool: PgPool) {
    let repo = PgDomainRepository::new(Arc::new(pool));

    let result = repo.find_by_name("nonexistent.com").await.unwrap();

    assert!(result.is_none());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_find_by_name_is_exact(pool: PgPool) {
    common::create_test_domain(&pool, "brand.example").await;
    let repo = PgDomainRepository::new(Arc::new(pool));

    assert!(repo.find_by_name("brand.example:8080").await.unwrap().is_none());
    assert!(repo.find_by_name("go.brand.example").await.unwrap().is_none());
}
