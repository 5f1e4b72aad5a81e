//! Favourite heroes with their win rate and the positions they are
//! actually played in.

use crate::api::models::Hero;
use crate::models::{FavoriteHeroes, HeroStat, Position};

/// Share of a hero's mean pick rate a position needs to count as viable.
pub const VIABLE_SHARE: f64 = 0.20;

#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteSummary {
    pub hero_id: i64,
    pub localized_name: String,
    pub win_rate: f64,
    /// `None` when no aggregate stats exist for the hero.
    pub positions: Option<Vec<Position>>,
}

/// Positions whose pick rate reaches [`VIABLE_SHARE`] of the hero's mean
/// pick rate over all five, ordered by lane number. Empty when the mean is
/// not positive.
pub fn viable_positions(stat: &HeroStat) -> Vec<Position> {
    let average = Position::ALL.iter().map(|p| stat.pick_rate(*p)).sum::<f64>()
        / Position::ALL.len() as f64;
    if average <= 0.0 {
        return Vec::new();
    }

    let threshold = average * VIABLE_SHARE;
    let mut positions: Vec<Position> = Position::ALL
        .into_iter()
        .filter(|p| stat.pick_rate(*p) >= threshold)
        .collect();
    positions.sort_by_key(|p| p.number());
    positions
}

/// One row per favourite found in the directory, best win rate first.
/// Favourites without stats sort as 0% win rate.
pub fn summarize_favorites(
    favorites: &FavoriteHeroes,
    heroes: &[Hero],
    stats: &[HeroStat],
) -> Vec<FavoriteSummary> {
    let mut rows: Vec<FavoriteSummary> = favorites
        .hero_ids
        .iter()
        .filter_map(|id| heroes.iter().find(|hero| hero.id == *id))
        .map(|hero| {
            let stat = stats.iter().find(|stat| stat.id == hero.id);
            FavoriteSummary {
                hero_id: hero.id,
                localized_name: hero.localized_name.clone(),
                win_rate: stat.map_or(0.0, |stat| stat.win_rate),
                positions: stat.map(viable_positions),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.win_rate.total_cmp(&a.win_rate));
    rows
}
