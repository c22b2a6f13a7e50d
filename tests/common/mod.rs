#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkpulse::application::services::{ClickService, ResolveOptions, ResolveService};
use linkpulse::domain::click_event::ClickEvent;
use linkpulse::domain::entities::{Domain, Link, NewClick};
use linkpulse::domain::repositories::{
    ClickRepository, DomainRepository, LinkRepository, RepositoryError,
};
use linkpulse::infrastructure::buffer::MemoryEventBuffer;
use linkpulse::infrastructure::cache::MemoryCache;
use linkpulse::state::AppState;
use parking_lot::Mutex;
use sqlx::PgPool;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

pub const TEST_SALT: &str = "test-salt";

// ── PostgreSQL fixtures ─────────────────────────────────────────────────────

pub async fn create_test_domain(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO domains (user_id, domain) VALUES (1, $1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_link(
    pool: &PgPool,
    code: &str,
    url: &str,
    domain_id: Option<i64>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO links (user_id, code, long_url, domain_id) VALUES (1, $1, $2, $3) RETURNING id",
    )
    .bind(code)
    .bind(url)
    .bind(domain_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_expired_link(pool: &PgPool, code: &str, url: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO links (user_id, code, long_url, expires_at) \
         VALUES (1, $1, $2, NOW() - INTERVAL '1 hour') RETURNING id",
    )
    .bind(code)
    .bind(url)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn count_clicks(pool: &PgPool, link_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM clicks WHERE link_id = $1")
        .bind(link_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ── In-memory collaborators ─────────────────────────────────────────────────

pub fn link(id: i64, code: &str, url: &str, domain_id: Option<i64>) -> Link {
    let now = Utc::now();
    Link {
        id,
        user_id: 1,
        code: code.to_string(),
        domain_id,
        long_url: url.to_string(),
        title: None,
        expires_at: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn expiring(mut link: Link, expires_at: DateTime<Utc>) -> Link {
    link.expires_at = Some(expires_at);
    link
}

pub fn inactive(mut link: Link) -> Link {
    link.is_active = false;
    link
}

/// Link store backed by a vector. `set_failing(true)` makes every call fail.
#[derive(Default)]
pub struct InMemoryLinks {
    links: Mutex<Vec<Link>>,
    failing: AtomicBool,
}

impl InMemoryLinks {
    pub fn with(links: Vec<Link>) -> Self {
        Self {
            links: Mutex::new(links),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinks {
    async fn find_by_scope_and_code(
        &self,
        domain_id: Option<i64>,
        code: &str,
    ) -> Result<Option<Link>, RepositoryError> {
        self.check()?;
        Ok(self
            .links
            .lock()
            .iter()
            .find(|l| l.domain_id == domain_id && l.code == code)
            .cloned())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check()
    }
}

#[derive(Default)]
pub struct InMemoryDomains {
    domains: Vec<Domain>,
}

impl InMemoryDomains {
    pub fn with(names: &[(i64, &str)]) -> Self {
        Self {
            domains: names
                .iter()
                .map(|(id, name)| Domain {
                    id: *id,
                    user_id: 1,
                    domain: name.to_string(),
                    created_at: Utc::now(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl DomainRepository for InMemoryDomains {
    async fn find_by_name(&self, domain: &str) -> Result<Option<Domain>, RepositoryError> {
        Ok(self.domains.iter().find(|d| d.domain == domain).cloned())
    }
}

/// Click store that keeps every inserted batch.
#[derive(Default)]
pub struct RecordingClicks {
    pub batches: Mutex<Vec<Vec<NewClick>>>,
}

#[async_trait]
impl ClickRepository for RecordingClicks {
    async fn batch_insert(&self, clicks: Vec<NewClick>) -> Result<u64, RepositoryError> {
        let inserted = clicks.len() as u64;
        self.batches.lock().push(clicks);
        Ok(inserted)
    }
}

/// Handles to the pieces behind a test [`AppState`].
pub struct TestContext {
    pub state: AppState,
    pub click_rx: mpsc::Receiver<ClickEvent>,
    pub links: Arc<InMemoryLinks>,
    pub buffer: Arc<MemoryEventBuffer>,
}

pub fn create_test_state(links: InMemoryLinks, domains: InMemoryDomains) -> TestContext {
    create_test_state_with_capacity(links, domains, 100)
}

pub fn create_test_state_with_capacity(
    links: InMemoryLinks,
    domains: InMemoryDomains,
    capacity: usize,
) -> TestContext {
    let links = Arc::new(links);
    let buffer = Arc::new(MemoryEventBuffer::new());
    let (tx, rx) = mpsc::channel(capacity);

    let resolver = Arc::new(ResolveService::new(
        links.clone(),
        Arc::new(domains),
        Arc::new(MemoryCache::new(3600)),
        ResolveOptions::default(),
    ));
    let click_service = Arc::new(ClickService::new(buffer.clone(), Duration::from_secs(1)));

    let state = AppState::new(resolver, click_service, tx, TEST_SALT).cache_backend("memory");

    TestContext {
        state,
        click_rx: rx,
        links,
        buffer,
    }
}
