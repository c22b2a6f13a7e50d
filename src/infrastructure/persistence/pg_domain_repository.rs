//! PostgreSQL implementation of domain repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::Domain;
use crate::domain::repositories::{DomainRepository, RepositoryError};

/// PostgreSQL repository for custom domain lookups.
pub struct PgDomainRepository {
    pool: Arc<PgPool>,
}

impl PgDomainRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DomainRow {
    id: i64,
    user_id: i64,
    domain: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl DomainRepository for PgDomainRepository {
    async fn find_by_name(&self, domain: &str) -> Result<Option<Domain>, RepositoryError> {
        let row = sqlx::query_as::<_, DomainRow>(
            r#"
            SELECT id, user_id, domain, created_at
            FROM domains
            WHERE domain = $1
            "#,
        )
        .bind(domain)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|r| Domain {
            id: r.id,
            user_id: r.user_id,
            domain: r.domain,
            created_at: r.created_at,
        }))
    }
}
