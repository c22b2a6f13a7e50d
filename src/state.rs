use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{ClickService, ResolveService};
use crate::domain::click_event::ClickEvent;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<ResolveService>,
    pub click_service: Arc<ClickService>,
    /// Producer side of the bounded channel drained by the click forwarder.
    pub click_sender: mpsc::Sender<ClickEvent>,
    pub ip_hash_salt: Arc<str>,
    pub behind_proxy: bool,
    /// Human-readable cache backend name for health output.
    pub cache_backend: &'static str,
}

impl AppState {
    pub fn new(
        resolver: Arc<ResolveService>,
        click_service: Arc<ClickService>,
        click_sender: mpsc::Sender<ClickEvent>,
        ip_hash_salt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            resolver,
            click_service,
            click_sender,
            ip_hash_salt: ip_hash_salt.into(),
            behind_proxy: false,
            cache_backend: "disabled",
        }
    }

    pub fn behind_proxy(mut self, behind_proxy: bool) -> Self {
        self.behind_proxy = behind_proxy;
        self
    }

    pub fn cache_backend(mut self, name: &'static str) -> Self {
        self.cache_backend = name;
        self
    }
}
