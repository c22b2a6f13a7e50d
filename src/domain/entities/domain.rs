//! Domain entity representing a custom short-link domain.

use chrono::{DateTime, Utc};

/// A custom domain that scopes short codes.
///
/// Each domain acts as a namespace for short links. Hosts without a matching
/// record resolve in the default scope.
#[derive(Debug, Clone)]
pub struct Domain {
    pub id: i64,
    pub user_id: i64,
    pub domain: String,
    pub created_at: DateTime<Utc>,
}
