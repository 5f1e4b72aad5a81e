// URL builders for the stats source

use crate::models::Position;

pub fn hero_stats_url(base_url: &str, patch_version: &str, position: Position) -> String {
    format!(
        "{}?show=heroes&view=meta&mode=all-pick&date={}&position={}",
        base_url.trim_end_matches('/'),
        patch_version,
        position.key()
    )
}

pub fn hero_counters_url(base_url: &str, hero_slug: &str, patch_version: &str) -> String {
    format!(
        "{}/{}/counters?date={}",
        base_url.trim_end_matches('/'),
        hero_slug,
        patch_version
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_position_url() {
        assert_eq!(
            hero_stats_url("https://www.dotabuff.com/heroes", "7.36", Position::CoreSafe),
            "https://www.dotabuff.com/heroes?show=heroes&view=meta&mode=all-pick&date=7.36&position=core-safe"
        );
    }

    #[test]
    fn builds_counters_url() {
        assert_eq!(
            hero_counters_url("https://www.dotabuff.com/heroes/", "anti-mage", "7.36"),
            "https://www.dotabuff.com/heroes/anti-mage/counters?date=7.36"
        );
    }
}
