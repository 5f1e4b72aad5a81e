use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Role archetype used to slice the statistics pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    CoreMid,
    CoreSafe,
    CoreOff,
    SupportSafe,
    SupportOff,
}

impl Position {
    /// Fetch order. Core-mid comes first: it is the canonical source of
    /// hero membership, win rate and ban rate.
    pub const ALL: [Position; 5] = [
        Position::CoreMid,
        Position::CoreSafe,
        Position::CoreOff,
        Position::SupportSafe,
        Position::SupportOff,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Position::CoreMid => "core-mid",
            Position::CoreSafe => "core-safe",
            Position::CoreOff => "core-off",
            Position::SupportSafe => "support-safe",
            Position::SupportOff => "support-off",
        }
    }

    /// Conventional lane number: 1 safe carry through 5 hard support.
    pub fn number(self) -> u8 {
        match self {
            Position::CoreSafe => 1,
            Position::CoreMid => 2,
            Position::CoreOff => 3,
            Position::SupportOff => 4,
            Position::SupportSafe => 5,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One row of a position page.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionStats {
    pub win_rate: f64,
    pub pick_rate: f64,
    pub ban_rate: f64,
    pub url_slug: String,
    pub hero_id: i64,
}

/// Scraped hero display name -> stats for one (patch, position) page.
pub type PositionMapping = BTreeMap<String, PositionStats>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroStat {
    pub id: i64,
    pub localized_name: String,
    pub hero_url: String,
    pub win_rate: f64,
    pub pick_rate_core_mid: f64,
    pub pick_rate_core_safe: f64,
    pub pick_rate_core_off: f64,
    pub pick_rate_support_safe: f64,
    pub pick_rate_support_off: f64,
    pub ban_rate: f64,
    pub last_fetched: DateTime<Utc>,
    pub patch_version: String,
}

impl HeroStat {
    pub fn pick_rate(&self, position: Position) -> f64 {
        match position {
            Position::CoreMid => self.pick_rate_core_mid,
            Position::CoreSafe => self.pick_rate_core_safe,
            Position::CoreOff => self.pick_rate_core_off,
            Position::SupportSafe => self.pick_rate_support_safe,
            Position::SupportOff => self.pick_rate_support_off,
        }
    }

    pub fn set_pick_rate(&mut self, position: Position, value: f64) {
        match position {
            Position::CoreMid => self.pick_rate_core_mid = value,
            Position::CoreSafe => self.pick_rate_core_safe = value,
            Position::CoreOff => self.pick_rate_core_off = value,
            Position::SupportSafe => self.pick_rate_support_safe = value,
            Position::SupportOff => self.pick_rate_support_off = value,
        }
    }
}

/// An opposing hero's matchup against the selected hero.
///
/// `disadvantage` is kept exactly as the source publishes it. Whether a
/// negative value is favourable for the selected hero is the source's
/// convention, not ours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterEntry {
    pub hero_id: i64,
    pub hero_name: String,
    #[serde(default)]
    pub hero_url: String,
    pub disadvantage: f64,
    pub win_rate: f64,
    pub matches_played: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    pub version: String,
    pub last_modified: DateTime<Utc>,
}

impl Patch {
    pub fn new(version: &str) -> Self {
        Patch {
            version: version.trim().to_string(),
            last_modified: Utc::now(),
        }
    }
}

/// Hero directory ids the user marked as favourites, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteHeroes {
    pub hero_ids: Vec<i64>,
    pub last_modified: DateTime<Utc>,
}

impl FavoriteHeroes {
    pub fn contains(&self, hero_id: i64) -> bool {
        self.hero_ids.contains(&hero_id)
    }

    /// False when the hero was already a favourite.
    pub fn add(&mut self, hero_id: i64) -> bool {
        if self.contains(hero_id) {
            return false;
        }
        self.hero_ids.push(hero_id);
        self.last_modified = Utc::now();
        true
    }

    /// False when the hero was not a favourite.
    pub fn remove(&mut self, hero_id: i64) -> bool {
        let before = self.hero_ids.len();
        self.hero_ids.retain(|id| *id != hero_id);
        if self.hero_ids.len() == before {
            return false;
        }
        self.last_modified = Utc::now();
        true
    }
}
