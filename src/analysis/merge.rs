use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::models::Hero;
use crate::models::{HeroStat, Position, PositionMapping};
use crate::scrape::identity::HeroIdentityResolver;

/// The five position pages of one patch.
pub type PositionData = BTreeMap<Position, PositionMapping>;

pub struct StatsMerger {
    resolver: Arc<dyn HeroIdentityResolver>,
}

impl StatsMerger {
    pub fn new(resolver: Arc<dyn HeroIdentityResolver>) -> Self {
        StatsMerger { resolver }
    }

    /// Builds one record per core-mid hero that resolves against the hero
    /// directory.
    ///
    /// Core-mid is the canonical sample: it decides membership and is the
    /// only source of win rate and ban rate. The other positions contribute
    /// their pick rate only, and a hero missing from one of them gets 0.0
    /// there.
    pub fn merge(
        &self,
        positions: &PositionData,
        heroes: &[Hero],
        patch_version: &str,
        fetched_at: DateTime<Utc>,
    ) -> Vec<HeroStat> {
        let Some(core_mid) = positions.get(&Position::CoreMid) else {
            warn!("no core-mid data to merge");
            return Vec::new();
        };

        let mut merged = Vec::with_capacity(core_mid.len());
        let mut seen_ids = HashSet::new();

        for (hero_name, mid) in core_mid {
            let Some(hero) = self.resolver.match_by_name(hero_name, heroes) else {
                warn!(hero = %hero_name, "could not match scraped hero to the hero directory, skipping");
                continue;
            };

            if !seen_ids.insert(hero.id) {
                debug!(hero = %hero_name, id = hero.id, "duplicate hero in core-mid data");
                continue;
            }

            let mut stat = HeroStat {
                id: hero.id,
                localized_name: hero.localized_name.clone(),
                hero_url: mid.url_slug.clone(),
                win_rate: mid.win_rate,
                pick_rate_core_mid: mid.pick_rate,
                pick_rate_core_safe: 0.0,
                pick_rate_core_off: 0.0,
                pick_rate_support_safe: 0.0,
                pick_rate_support_off: 0.0,
                ban_rate: mid.ban_rate,
                last_fetched: fetched_at,
                patch_version: patch_version.to_string(),
            };

            for position in Position::ALL.into_iter().skip(1) {
                let pick_rate = positions
                    .get(&position)
                    .and_then(|mapping| mapping.get(hero_name))
                    .map(|row| row.pick_rate)
                    .unwrap_or(0.0);
                stat.set_pick_rate(position, pick_rate);
            }

            merged.push(stat);
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PositionStats;
    use crate::scrape::identity::{derive_id, SlugHashResolver};

    fn row(slug: &str, win: f64, pick: f64, ban: f64) -> PositionStats {
        PositionStats {
            win_rate: win,
            pick_rate: pick,
            ban_rate: ban,
            url_slug: slug.to_string(),
            hero_id: derive_id(slug),
        }
    }

    fn merger() -> StatsMerger {
        StatsMerger::new(Arc::new(SlugHashResolver))
    }

    fn directory() -> Vec<Hero> {
        vec![
            Hero::new(2, "Axe"),
            Hero::new(26, "Lion"),
            Hero::new(53, "Nature's Prophet"),
        ]
    }

    #[test]
    fn hero_missing_from_other_positions_gets_zero_pick_rates() {
        let mut positions = PositionData::new();
        positions.insert(
            Position::CoreMid,
            PositionMapping::from([("Axe".to_string(), row("axe", 52.1, 5.0, 3.0))]),
        );
        for position in Position::ALL.into_iter().skip(1) {
            positions.insert(position, PositionMapping::new());
        }

        let merged = merger().merge(&positions, &directory(), "7.36", Utc::now());

        assert_eq!(merged.len(), 1);
        let axe = &merged[0];
        assert_eq!(axe.id, 2);
        assert_eq!(axe.win_rate, 52.1);
        assert_eq!(axe.ban_rate, 3.0);
        assert_eq!(axe.pick_rate_core_mid, 5.0);
        assert_eq!(axe.pick_rate_core_safe, 0.0);
        assert_eq!(axe.pick_rate_core_off, 0.0);
        assert_eq!(axe.pick_rate_support_safe, 0.0);
        assert_eq!(axe.pick_rate_support_off, 0.0);
        assert_eq!(axe.patch_version, "7.36");
        assert_eq!(axe.hero_url, "axe");
    }

    #[test]
    fn win_and_ban_rates_come_only_from_core_mid() {
        let mut positions = PositionData::new();
        positions.insert(
            Position::CoreMid,
            PositionMapping::from([("Lion".to_string(), row("lion", 48.0, 1.0, 0.5))]),
        );
        positions.insert(
            Position::SupportSafe,
            PositionMapping::from([("Lion".to_string(), row("lion", 55.0, 12.0, 9.0))]),
        );
        positions.insert(
            Position::SupportOff,
            PositionMapping::from([("Lion".to_string(), row("lion", 54.0, 10.5, 9.0))]),
        );

        let merged = merger().merge(&positions, &directory(), "7.36", Utc::now());
        let lion = &merged[0];
        assert_eq!(lion.win_rate, 48.0);
        assert_eq!(lion.ban_rate, 0.5);
        assert_eq!(lion.pick_rate(Position::SupportSafe), 12.0);
        assert_eq!(lion.pick_rate(Position::SupportOff), 10.5);
        assert_eq!(lion.pick_rate(Position::CoreSafe), 0.0);
    }

    #[test]
    fn membership_follows_core_mid_and_skips_unresolved_heroes() {
        let mut positions = PositionData::new();
        positions.insert(
            Position::CoreMid,
            PositionMapping::from([
                ("Axe".to_string(), row("axe", 50.0, 2.0, 1.0)),
                ("Natures Prophet".to_string(), row("natures-prophet", 51.0, 3.0, 1.0)),
                ("Ringmaster".to_string(), row("ringmaster", 47.0, 1.0, 0.1)),
            ]),
        );
        // Only in a non-canonical position: never merged.
        positions.insert(
            Position::CoreSafe,
            PositionMapping::from([("Lion".to_string(), row("lion", 40.0, 1.0, 0.1))]),
        );

        let merged = merger().merge(&positions, &directory(), "7.36", Utc::now());
        let mut ids: Vec<_> = merged.iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec![2, 53]);
    }

    #[test]
    fn names_resolving_to_the_same_hero_are_not_duplicated() {
        let mut positions = PositionData::new();
        positions.insert(
            Position::CoreMid,
            PositionMapping::from([
                ("Axe".to_string(), row("axe", 50.0, 2.0, 1.0)),
                ("axe".to_string(), row("axe", 49.0, 2.0, 1.0)),
            ]),
        );

        let merged = merger().merge(&positions, &directory(), "7.36", Utc::now());
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn missing_core_mid_merges_nothing() {
        let mut positions = PositionData::new();
        positions.insert(
            Position::CoreSafe,
            PositionMapping::from([("Axe".to_string(), row("axe", 50.0, 2.0, 1.0))]),
        );
        assert!(merger().merge(&positions, &directory(), "7.36", Utc::now()).is_empty());
    }
}
