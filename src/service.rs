//! The surface the CLI talks to: aggregate stats, counters, cache upkeep.
//!
//! Per-page and per-hero failures come back as `Ok(None)` after being
//! logged; only environment failures are returned as `Err`.

use chrono::Utc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use crate::analysis::merge::{PositionData, StatsMerger};
use crate::api::models::Hero;
use crate::cache::{AggregateStatsCache, CacheStore, CacheSummary, CounterCacheEntry};
use crate::error::AppError;
use crate::models::{CounterEntry, HeroStat, Position};
use crate::precache::{PreCacheOrchestrator, PreCacheReport};
use crate::scrape::counters::CounterFetcher;
use crate::scrape::identity::HeroIdentityResolver;
use crate::scrape::positions::PositionStatsFetcher;
use crate::scrape::{PageRenderer, PageSource};

/// Pause between two consecutive position page requests.
pub const POSITION_DELAY: Duration = Duration::from_secs(5);

pub struct StatsService {
    positions: PositionStatsFetcher,
    counters: CounterFetcher,
    merger: StatsMerger,
    store: CacheStore,
    heroes: Vec<Hero>,
    position_delay: Duration,
}

pub struct ServiceParts {
    pub source: Arc<dyn PageSource>,
    pub renderer: Arc<dyn PageRenderer>,
    pub resolver: Arc<dyn HeroIdentityResolver>,
    pub store: CacheStore,
    pub base_url: String,
    pub render_timeout: Duration,
}

impl StatsService {
    pub fn new(parts: ServiceParts, heroes: Vec<Hero>) -> Self {
        StatsService {
            positions: PositionStatsFetcher::new(
                parts.source,
                Arc::clone(&parts.resolver),
                &parts.base_url,
            ),
            counters: CounterFetcher::new(
                parts.renderer,
                Arc::clone(&parts.resolver),
                &parts.base_url,
                parts.render_timeout,
            ),
            merger: StatsMerger::new(parts.resolver),
            store: parts.store,
            heroes,
            position_delay: POSITION_DELAY,
        }
    }

    #[cfg(test)]
    fn with_position_delay(mut self, delay: Duration) -> Self {
        self.position_delay = delay;
        self
    }

    pub fn heroes(&self) -> &[Hero] {
        &self.heroes
    }

    /// Fetches all five positions, merges them and replaces the aggregate
    /// cache. All or nothing: one failed position fails the whole fetch and
    /// leaves the cache untouched.
    pub fn fetch_aggregate_stats(&self, patch_version: &str) -> Result<Option<Vec<HeroStat>>, AppError> {
        if self.heroes.is_empty() {
            return Err(AppError::NoHeroes);
        }

        let mut data = PositionData::new();
        for (i, position) in Position::ALL.into_iter().enumerate() {
            if i > 0 {
                thread::sleep(self.position_delay);
            }
            info!(%position, step = i + 1, of = Position::ALL.len(), "fetching position stats");

            match self.positions.fetch_position(patch_version, position) {
                Ok(mapping) => {
                    data.insert(position, mapping);
                }
                Err(e) if e.is_environment() => return Err(e),
                Err(e) => {
                    warn!(%position, error = %e, retryable = e.is_retryable(), "position fetch failed, aborting aggregate fetch");
                    return Ok(None);
                }
            }
        }

        let fetched_at = Utc::now();
        let stats = self.merger.merge(&data, &self.heroes, patch_version, fetched_at);
        if stats.is_empty() {
            warn!("no scraped hero matched the hero directory");
            return Ok(None);
        }

        self.store
            .save_aggregate(&AggregateStatsCache::new(stats.clone(), patch_version, fetched_at))?;
        Ok(Some(stats))
    }

    pub fn cached_aggregate_stats(&self) -> Result<Option<Vec<HeroStat>>, AppError> {
        Ok(self.store.load_aggregate()?.map(|cache| cache.stats))
    }

    pub fn cached_aggregate(&self) -> Result<Option<AggregateStatsCache>, AppError> {
        self.store.load_aggregate()
    }

    pub fn has_valid_aggregate_cache(&self, patch_version: &str) -> bool {
        self.store.is_aggregate_valid(patch_version)
    }

    /// Counters for one hero, from the cache when it holds the hero for this
    /// patch, otherwise fetched and persisted.
    pub fn fetch_counters(&self, hero_slug: &str, patch_version: &str) -> Result<Option<Vec<CounterEntry>>, AppError> {
        if let Some(entry) = self.store.load_counter_entry(hero_slug, patch_version)? {
            info!(slug = hero_slug, "counters served from cache");
            return Ok(Some(entry.counters));
        }
        self.refetch_counters(hero_slug, patch_version)
    }

    /// Like [`fetch_counters`](Self::fetch_counters) but always goes to the
    /// source.
    pub fn refetch_counters(&self, hero_slug: &str, patch_version: &str) -> Result<Option<Vec<CounterEntry>>, AppError> {
        match self.counters.fetch_counters(hero_slug, patch_version) {
            Ok(counters) => {
                let entry = CounterCacheEntry::new(hero_slug, counters.clone());
                self.store.save_counter_entry(hero_slug, entry, patch_version)?;
                Ok(Some(counters))
            }
            Err(e) if e.is_environment() => Err(e),
            Err(e) => {
                warn!(slug = hero_slug, error = %e, retryable = e.is_retryable(), "counters fetch failed");
                Ok(None)
            }
        }
    }

    pub fn cache_summary(&self) -> Result<CacheSummary, AppError> {
        self.store.cache_summary()
    }

    pub fn clear_counters_cache(&self) -> Result<(), AppError> {
        self.store.clear_counters()
    }

    /// Called when the collaborator switches patch: both caches go.
    pub fn reset_for_patch(&self) -> Result<(), AppError> {
        self.store.clear_aggregate()?;
        self.store.clear_counters()
    }

    pub fn pre_cache_all<P, C>(
        &self,
        patch_version: &str,
        heroes: &[Hero],
        on_progress: P,
        should_continue: C,
    ) -> Result<usize, AppError>
    where
        P: FnMut(usize, usize),
        C: FnMut() -> bool,
    {
        self.pre_cache_report(patch_version, heroes, on_progress, should_continue)
            .map(|report| report.completed())
    }

    pub fn pre_cache_report<P, C>(
        &self,
        patch_version: &str,
        heroes: &[Hero],
        on_progress: P,
        should_continue: C,
    ) -> Result<PreCacheReport, AppError>
    where
        P: FnMut(usize, usize),
        C: FnMut() -> bool,
    {
        PreCacheOrchestrator::new(&self.counters, &self.store).run_all(
            patch_version,
            heroes,
            on_progress,
            should_continue,
        )
    }
}
