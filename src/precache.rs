use tracing::{info, warn};

use crate::api::models::Hero;
use crate::cache::{CacheStore, CounterCacheEntry};
use crate::error::AppError;
use crate::scrape::counters::CounterFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreCacheReport {
    pub outcome: RunOutcome,
    pub total: usize,
    /// Fetched and persisted during this run.
    pub fetched: usize,
    /// Already cached for the patch; not fetched again.
    pub skipped: usize,
    /// Slugs whose fetch failed. Not retried within the run.
    pub failed: Vec<String>,
}

impl PreCacheReport {
    fn new(total: usize) -> Self {
        PreCacheReport {
            outcome: RunOutcome::Completed,
            total,
            fetched: 0,
            skipped: 0,
            failed: Vec::new(),
        }
    }

    /// Heroes whose counters are cached for the patch after this run.
    pub fn completed(&self) -> usize {
        self.fetched + self.skipped
    }
}

/// Walks the hero list one hero at a time, persisting each success as soon
/// as it arrives so cancelling or crashing never loses finished work.
pub struct PreCacheOrchestrator<'a> {
    fetcher: &'a CounterFetcher,
    store: &'a CacheStore,
}

impl<'a> PreCacheOrchestrator<'a> {
    pub fn new(fetcher: &'a CounterFetcher, store: &'a CacheStore) -> Self {
        PreCacheOrchestrator { fetcher, store }
    }

    /// `should_continue` is polled before each hero; returning false stops
    /// the run before that hero is fetched. `on_progress(completed, total)`
    /// fires after each hero that ends up cached.
    ///
    /// Only environment failures (browser, disk) abort the run with `Err`.
    pub fn run_all<P, C>(
        &self,
        patch_version: &str,
        heroes: &[Hero],
        mut on_progress: P,
        mut should_continue: C,
    ) -> Result<PreCacheReport, AppError>
    where
        P: FnMut(usize, usize),
        C: FnMut() -> bool,
    {
        let mut report = PreCacheReport::new(heroes.len());
        info!(patch = patch_version, heroes = heroes.len(), "pre-caching counters");

        for hero in heroes {
            if !should_continue() {
                report.outcome = RunOutcome::Cancelled;
                info!(completed = report.completed(), total = report.total, "pre-cache cancelled");
                break;
            }

            let slug = hero.slug();

            if self.store.load_counter_entry(&slug, patch_version)?.is_some() {
                report.skipped += 1;
                on_progress(report.completed(), report.total);
                continue;
            }

            match self.fetcher.fetch_counters(&slug, patch_version) {
                Ok(counters) => {
                    let entry = CounterCacheEntry::new(&slug, counters);
                    self.store.save_counter_entry(&slug, entry, patch_version)?;
                    report.fetched += 1;
                    on_progress(report.completed(), report.total);
                }
                Err(e) if e.is_environment() => return Err(e),
                Err(e) => {
                    warn!(hero = %hero.localized_name, slug = %slug, error = %e, "failed to fetch counters, continuing");
                    report.failed.push(slug);
                }
            }
        }

        if report.outcome == RunOutcome::Completed {
            info!(
                fetched = report.fetched,
                skipped = report.skipped,
                failed = report.failed.len(),
                "pre-cache finished"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::counters::tests::{counter_row, FakeRenderer};
    use crate::scrape::identity::SlugHashResolver;
    use crate::scrape::PageRenderer;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    fn heroes() -> Vec<Hero> {
        vec![
            Hero::new(1, "Anti-Mage"),
            Hero::new(2, "Axe"),
            Hero::new(26, "Lion"),
            Hero::new(13, "Puck"),
            Hero::new(25, "Lina"),
        ]
    }

    fn renderer_for(heroes: &[Hero]) -> FakeRenderer {
        heroes.iter().fold(FakeRenderer::default(), |renderer, hero| {
            renderer.with_hero(&hero.slug(), &[counter_row("Slark", "slark", -1.0, 48.0, 500)])
        })
    }

    fn fetcher(renderer: Arc<dyn PageRenderer>) -> CounterFetcher {
        CounterFetcher::new(
            renderer,
            Arc::new(SlugHashResolver),
            "https://www.dotabuff.com/heroes",
            Duration::from_secs(1),
        )
    }

    #[test]
    fn completes_all_heroes_in_order_with_monotonic_progress() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let heroes = heroes();
        let renderer = Arc::new(renderer_for(&heroes));
        let fetcher = fetcher(renderer.clone());

        let mut progress = Vec::new();
        let report = PreCacheOrchestrator::new(&fetcher, &store)
            .run_all("7.36", &heroes, |done, total| progress.push((done, total)), || true)
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.completed(), 5);
        assert_eq!(progress, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);

        let order: Vec<String> = heroes.iter().map(|h| h.slug()).collect();
        assert_eq!(renderer.requested_slugs(), order);
        assert_eq!(store.cache_summary().unwrap().entry_count, 5);
    }

    #[test]
    fn cancel_then_resume_fetches_each_hero_once() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let heroes = heroes();
        let renderer = Arc::new(renderer_for(&heroes));
        let fetcher = fetcher(renderer.clone());
        let orchestrator = PreCacheOrchestrator::new(&fetcher, &store);

        // Allow two heroes, then cancel before the third.
        let mut polls = 0;
        let first = orchestrator
            .run_all("7.36", &heroes, |_, _| {}, || {
                polls += 1;
                polls <= 2
            })
            .unwrap();

        assert_eq!(first.outcome, RunOutcome::Cancelled);
        assert_eq!(first.fetched, 2);
        assert_eq!(store.cache_summary().unwrap().entry_count, 2);
        assert_eq!(renderer.requested_slugs().len(), 2);

        let second = orchestrator
            .run_all("7.36", &heroes, |_, _| {}, || true)
            .unwrap();

        assert_eq!(second.outcome, RunOutcome::Completed);
        assert_eq!(second.skipped, 2);
        assert_eq!(second.fetched, 3);
        assert_eq!(store.cache_summary().unwrap().entry_count, 5);

        let mut requested = renderer.requested_slugs();
        assert_eq!(requested.len(), 5);
        requested.sort();
        requested.dedup();
        assert_eq!(requested.len(), 5);
    }

    #[test]
    fn cancelling_immediately_fetches_nothing() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let heroes = heroes();
        let renderer = Arc::new(renderer_for(&heroes));
        let fetcher = fetcher(renderer.clone());

        let report = PreCacheOrchestrator::new(&fetcher, &store)
            .run_all("7.36", &heroes, |_, _| panic!("no progress expected"), || false)
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.completed(), 0);
        assert!(renderer.requested_slugs().is_empty());
    }

    #[test]
    fn one_failing_hero_does_not_stop_the_batch() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let heroes = heroes();
        let mut renderer = renderer_for(&heroes);
        renderer.failing.insert("lion".to_string());
        let renderer = Arc::new(renderer);
        let fetcher = fetcher(renderer.clone());

        let mut progress = Vec::new();
        let report = PreCacheOrchestrator::new(&fetcher, &store)
            .run_all("7.36", &heroes, |done, _| progress.push(done), || true)
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.fetched, 4);
        assert_eq!(report.failed, vec!["lion".to_string()]);
        assert_eq!(progress, vec![1, 2, 3, 4]);
        assert!(store.load_counter_entry("lion", "7.36").unwrap().is_none());
        assert!(store.load_counter_entry("lina", "7.36").unwrap().is_some());
    }

    #[test]
    fn entries_from_an_older_patch_are_refetched() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let heroes = heroes();
        store
            .save_counter_entry("axe", CounterCacheEntry::new("axe", vec![]), "7.35")
            .unwrap();
        let renderer = Arc::new(renderer_for(&heroes));
        let fetcher = fetcher(renderer.clone());

        let report = PreCacheOrchestrator::new(&fetcher, &store)
            .run_all("7.36", &heroes, |_, _| {}, || true)
            .unwrap();

        assert_eq!(report.skipped, 0);
        assert_eq!(report.fetched, 5);
        assert_eq!(store.load_counters().unwrap().unwrap().patch_version, "7.36");
    }
}
