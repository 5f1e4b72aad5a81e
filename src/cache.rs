use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{CounterEntry, HeroStat};
use crate::storage::JsonDocument;

pub const STATS_FILE: &str = "dotabuff-stats.json";
pub const COUNTERS_FILE: &str = "hero-counters.json";

const AGGREGATE_MAX_AGE_HOURS: i64 = 24;

/// Whole-patch hero stats. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatsCache {
    pub stats: Vec<HeroStat>,
    pub last_fetched: DateTime<Utc>,
    pub patch_version: String,
}

impl AggregateStatsCache {
    pub fn new(stats: Vec<HeroStat>, patch_version: &str, last_fetched: DateTime<Utc>) -> Self {
        AggregateStatsCache {
            stats,
            last_fetched,
            patch_version: patch_version.to_string(),
        }
    }

    /// Valid for the same patch and for less than 24 hours.
    pub fn is_valid_at(&self, current_patch: &str, now: DateTime<Utc>) -> bool {
        !self.stats.is_empty()
            && self.patch_version == current_patch
            && now.signed_duration_since(self.last_fetched) < Duration::hours(AGGREGATE_MAX_AGE_HOURS)
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.last_fetched)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterCacheEntry {
    pub hero_url: String,
    pub counters: Vec<CounterEntry>,
    pub last_fetched: DateTime<Utc>,
}

impl CounterCacheEntry {
    pub fn new(hero_url: &str, counters: Vec<CounterEntry>) -> Self {
        CounterCacheEntry {
            hero_url: hero_url.to_string(),
            counters,
            last_fetched: Utc::now(),
        }
    }
}

/// Per-hero counters, scoped as a whole to one patch. Entries have no age
/// limit of their own; a patch change discards all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountersCache {
    pub cache: BTreeMap<String, CounterCacheEntry>,
    pub patch_version: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSummary {
    pub entry_count: usize,
    pub patch_version: Option<String>,
    pub oldest_fetched: Option<DateTime<Utc>>,
    pub newest_fetched: Option<DateTime<Utc>>,
}

/// Sole owner of the two persisted cache documents. Everything handed out
/// is a copy.
pub struct CacheStore {
    aggregate: JsonDocument<AggregateStatsCache>,
    counters: JsonDocument<CountersCache>,
}

impl CacheStore {
    pub fn new(data_dir: &Path) -> Self {
        CacheStore {
            aggregate: JsonDocument::new(data_dir.join(STATS_FILE)),
            counters: JsonDocument::new(data_dir.join(COUNTERS_FILE)),
        }
    }

    pub fn is_aggregate_valid(&self, current_patch: &str) -> bool {
        self.is_aggregate_valid_at(current_patch, Utc::now())
    }

    pub fn is_aggregate_valid_at(&self, current_patch: &str, now: DateTime<Utc>) -> bool {
        match self.load_aggregate() {
            Ok(Some(cache)) => cache.is_valid_at(current_patch, now),
            Ok(None) => false,
            Err(e) => {
                debug!(error = %e, "aggregate cache unreadable");
                false
            }
        }
    }

    pub fn load_aggregate(&self) -> Result<Option<AggregateStatsCache>, AppError> {
        self.aggregate.load()
    }

    pub fn save_aggregate(&self, data: &AggregateStatsCache) -> Result<(), AppError> {
        self.aggregate.save(data)?;
        info!(heroes = data.stats.len(), patch = %data.patch_version, "saved aggregate stats cache");
        Ok(())
    }

    pub fn clear_aggregate(&self) -> Result<(), AppError> {
        self.aggregate.remove()
    }

    pub fn load_counters(&self) -> Result<Option<CountersCache>, AppError> {
        self.counters.load()
    }

    /// `None` unless the stored cache belongs to `current_patch`, even if an
    /// entry for the slug physically exists.
    pub fn load_counter_entry(
        &self,
        slug: &str,
        current_patch: &str,
    ) -> Result<Option<CounterCacheEntry>, AppError> {
        let Some(cache) = self.load_counters()? else {
            return Ok(None);
        };
        if cache.patch_version != current_patch {
            debug!(slug, cached_patch = %cache.patch_version, current_patch, "counters cache is for another patch");
            return Ok(None);
        }
        Ok(cache.cache.get(slug).cloned())
    }

    /// Upserts one hero. A cache stored for another patch is emptied first.
    pub fn save_counter_entry(
        &self,
        slug: &str,
        entry: CounterCacheEntry,
        current_patch: &str,
    ) -> Result<(), AppError> {
        let mut cache = self.load_counters()?.unwrap_or_default();

        if cache.patch_version != current_patch {
            if !cache.cache.is_empty() {
                info!(
                    old_patch = %cache.patch_version,
                    new_patch = current_patch,
                    discarded = cache.cache.len(),
                    "patch changed, resetting counters cache"
                );
            }
            cache = CountersCache {
                cache: BTreeMap::new(),
                patch_version: current_patch.to_string(),
            };
        }

        cache.cache.insert(slug.to_string(), entry);
        self.counters.save(&cache)?;
        debug!(slug, entries = cache.cache.len(), "saved counters entry");
        Ok(())
    }

    pub fn clear_counters(&self) -> Result<(), AppError> {
        self.counters.remove()?;
        info!("counters cache cleared");
        Ok(())
    }

    pub fn cache_summary(&self) -> Result<CacheSummary, AppError> {
        let Some(cache) = self.load_counters()? else {
            return Ok(CacheSummary::default());
        };

        let fetched = cache.cache.values().map(|entry| entry.last_fetched);
        Ok(CacheSummary {
            entry_count: cache.cache.len(),
            patch_version: Some(cache.patch_version.clone()),
            oldest_fetched: fetched.clone().min(),
            newest_fetched: fetched.max(),
        })
    }
}
