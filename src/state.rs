use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::application::services::{
    ExpirySweepService, ResolverService, ShortenerService, StatisticsService, VisitRecorder,
};
use crate::domain::repositories::{LinkRepository, VisitRepository};
use crate::domain::visit_event::VisitEvent;
use crate::infrastructure::cache::{CacheService, MemoryCache};
use crate::infrastructure::persistence::{
    MemoryLinkRepository, MemoryVisitRepository, PgLinkRepository, PgVisitRepository,
};

pub type Shortener = ShortenerService<dyn LinkRepository, dyn CacheService>;
pub type Resolver = ResolverService<dyn LinkRepository, dyn CacheService>;
pub type Statistics = StatisticsService<dyn LinkRepository, dyn VisitRepository>;
pub type Sweeper = ExpirySweepService<dyn LinkRepository, dyn CacheService>;
pub type Recorder = VisitRecorder<dyn VisitRepository>;

/// The store and cache implementations a process runs with.
#[derive(Clone)]
pub struct Backends {
    pub links: Arc<dyn LinkRepository>,
    pub visits: Arc<dyn VisitRepository>,
    pub cache: Arc<dyn CacheService>,
}

impl Backends {
    /// PostgreSQL stores sharing one pool.
    pub fn postgres(pool: Arc<PgPool>, cache: Arc<dyn CacheService>) -> Self {
        Self {
            links: Arc::new(PgLinkRepository::new(pool.clone())),
            visits: Arc::new(PgVisitRepository::new(pool)),
            cache,
        }
    }

    /// Process-local stores; nothing survives a restart.
    pub fn memory(cache: Arc<dyn CacheService>) -> Self {
        let links = Arc::new(MemoryLinkRepository::new());
        let visits = Arc::new(MemoryVisitRepository::new(links.clone()));

        Self {
            links,
            visits,
            cache,
        }
    }

    /// Process-local stores fronted by a moka cache.
    pub fn in_memory(cache_max_entries: u64, cache_ttl_seconds: u64) -> Self {
        Self::memory(Arc::new(MemoryCache::new(
            cache_max_entries,
            cache_ttl_seconds,
        )))
    }

    pub fn shortener(&self, cache_ttl_seconds: u64) -> Shortener {
        ShortenerService::new(self.links.clone(), self.cache.clone(), cache_ttl_seconds)
    }

    pub fn resolver(&self, cache_ttl_seconds: u64) -> Resolver {
        ResolverService::new(self.links.clone(), self.cache.clone(), cache_ttl_seconds)
    }

    pub fn statistics(&self) -> Statistics {
        StatisticsService::new(self.links.clone(), self.visits.clone())
    }

    pub fn sweeper(&self) -> Sweeper {
        ExpirySweepService::new(self.links.clone(), self.cache.clone())
    }

    pub fn recorder(&self) -> Recorder {
        VisitRecorder::new(self.visits.clone())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub shortener: Arc<Shortener>,
    pub resolver: Arc<Resolver>,
    pub statistics: Arc<Statistics>,
    pub link_repository: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
    pub visit_sender: mpsc::Sender<VisitEvent>,
    pub base_url: String,
    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP`.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        backends: &Backends,
        visit_sender: mpsc::Sender<VisitEvent>,
        base_url: impl Into<String>,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            shortener: Arc::new(backends.shortener(cache_ttl_seconds)),
            resolver: Arc::new(backends.resolver(cache_ttl_seconds)),
            statistics: Arc::new(backends.statistics()),
            link_repository: backends.links.clone(),
            cache: backends.cache.clone(),
            visit_sender,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            behind_proxy: false,
        }
    }

    pub fn with_behind_proxy(mut self, behind_proxy: bool) -> Self {
        self.behind_proxy = behind_proxy;
        self
    }

    /// Public URL of a short code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }
}
