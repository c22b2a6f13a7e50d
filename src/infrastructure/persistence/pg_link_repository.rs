//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::Link;
use crate::domain::repositories::{LinkRepository, RepositoryError};

/// PostgreSQL repository for link lookups.
///
/// Uses bound parameters for SQL injection protection.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    user_id: i64,
    code: String,
    domain_id: Option<i64>,
    long_url: String,
    title: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LinkRow> for Link {
    fn from(r: LinkRow) -> Self {
        Link {
            id: r.id,
            user_id: r.user_id,
            code: r.code,
            domain_id: r.domain_id,
            long_url: r.long_url,
            title: r.title,
            expires_at: r.expires_at,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn find_by_scope_and_code(
        &self,
        domain_id: Option<i64>,
        code: &str,
    ) -> Result<Option<Link>, RepositoryError> {
        // IS NOT DISTINCT FROM matches NULL = NULL for the default scope.
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, user_id, code, domain_id, long_url, title,
                   expires_at, is_active, created_at, updated_at
            FROM links
            WHERE code = $1 AND domain_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(code)
        .bind(domain_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
