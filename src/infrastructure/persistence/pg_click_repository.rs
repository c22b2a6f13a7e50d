//! PostgreSQL implementation of click repository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::NewClick;
use crate::domain::repositories::{ClickRepository, RepositoryError};

/// Bind parameters per inserted row; Postgres allows at most 65535 per statement.
pub const CLICK_COLUMNS: usize = 12;

/// PostgreSQL repository for append-only click storage.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn batch_insert(&self, clicks: Vec<NewClick>) -> Result<u64, RepositoryError> {
        if clicks.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO clicks (link_id, clicked_at, ip_hash, user_agent, referrer, \
             country, city, device_type, browser, utm_source, utm_medium, utm_campaign) ",
        );
        builder.push_values(clicks.iter(), |mut row, click| {
            row.push_bind(click.link_id)
                .push_bind(click.clicked_at)
                .push_bind(click.ip_hash.as_str())
                .push_bind(click.user_agent.as_str())
                .push_bind(click.referrer.as_str())
                .push_bind(click.country.as_str())
                .push_bind(click.city.as_str())
                .push_bind(click.device_type.as_str())
                .push_bind(click.browser.as_str())
                .push_bind(click.utm_source.as_deref())
                .push_bind(click.utm_medium.as_deref())
                .push_bind(click.utm_campaign.as_deref());
        });

        // A single multi-row INSERT is atomic: all rows or none.
        let result = builder.build().execute(self.pool.as_ref()).await?;
        Ok(result.rows_affected())
    }
}
