use std::sync::Arc;

use scraper::Html;
use tracing::{debug, info, warn};

use super::identity::{slug_from_href, HeroIdentityResolver};
use super::{element_text, parse_percentage, selector, PageSource};
use crate::api::endpoints;
use crate::error::AppError;
use crate::models::{Position, PositionMapping, PositionStats};

// 1-based cells of the meta table, as laid out on the source
const WIN_RATE_CELL: usize = 3;
const PICK_RATE_CELL: usize = 5;
const BAN_RATE_CELL: usize = 7;

/// Retrieves one (patch, position) meta page and parses it into a mapping.
pub struct PositionStatsFetcher {
    source: Arc<dyn PageSource>,
    resolver: Arc<dyn HeroIdentityResolver>,
    base_url: String,
}

impl PositionStatsFetcher {
    pub fn new(
        source: Arc<dyn PageSource>,
        resolver: Arc<dyn HeroIdentityResolver>,
        base_url: &str,
    ) -> Self {
        PositionStatsFetcher {
            source,
            resolver,
            base_url: base_url.to_string(),
        }
    }

    /// Either the whole page parses into at least one row or the position
    /// fails; there is no partial mapping.
    pub fn fetch_position(
        &self,
        patch_version: &str,
        position: Position,
    ) -> Result<PositionMapping, AppError> {
        let url = endpoints::hero_stats_url(&self.base_url, patch_version, position);
        debug!(%position, %url, "requesting position page");

        let html = self.source.get_page(&url)?;
        let mapping = parse_position_table(&html, self.resolver.as_ref())?;

        info!(%position, rows = mapping.len(), "parsed position page");
        Ok(mapping)
    }
}

pub fn parse_position_table(
    html: &str,
    resolver: &dyn HeroIdentityResolver,
) -> Result<PositionMapping, AppError> {
    let document = Html::parse_document(html);
    let row_selector = selector("tbody tr")?;
    let cell_selector = selector("td")?;
    let link_selector = selector(r#"a[href^="/heroes/"]"#)?;
    let span_selector = selector("span")?;

    let rows: Vec<_> = document.select(&row_selector).collect();
    if rows.is_empty() {
        return Err(AppError::Parse("no hero rows found on position page".to_string()));
    }

    let mut mapping = PositionMapping::new();
    let mut dropped = 0usize;

    for row in &rows {
        let cells: Vec<_> = row.select(&cell_selector).collect();

        // The hero cell carries an icon link followed by the name link.
        let Some(name_link) = cells
            .first()
            .and_then(|cell| cell.select(&link_selector).nth(1))
        else {
            dropped += 1;
            continue;
        };

        let hero_name = element_text(&name_link);
        let slug = name_link.value().attr("href").and_then(slug_from_href);
        let Some(slug) = slug.filter(|_| !hero_name.is_empty()) else {
            dropped += 1;
            continue;
        };

        let rate = |cell_number: usize| {
            let text = cells
                .get(cell_number - 1)
                .and_then(|cell| cell.select(&span_selector).next())
                .map(|span| element_text(&span));
            parse_percentage(text.as_deref())
        };

        let stats = PositionStats {
            win_rate: rate(WIN_RATE_CELL),
            pick_rate: rate(PICK_RATE_CELL),
            ban_rate: rate(BAN_RATE_CELL),
            hero_id: resolver.derive_id(&slug),
            url_slug: slug,
        };
        mapping.insert(hero_name, stats);
    }

    if dropped > 0 {
        debug!(dropped, "dropped rows without a hero link");
    }

    if mapping.is_empty() {
        warn!(rows = rows.len(), "position page rows did not match the hero link structure");
        return Err(AppError::Parse(format!(
            "{} rows found but none carried a hero link",
            rows.len()
        )));
    }

    Ok(mapping)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::scrape::identity::{derive_id, SlugHashResolver};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Instant;

    pub(crate) fn hero_row(name: &str, slug: &str, win: &str, pick: &str, ban: &str) -> String {
        format!(
            r#"<tr>
                <td><a href="/heroes/{slug}"><img src="/{slug}.png"></a><a href="/heroes/{slug}">{name}</a></td>
                <td>tier</td>
                <td><span>{win}</span></td>
                <td><div class="bar"></div></td>
                <td><span>{pick}</span></td>
                <td><div class="bar"></div></td>
                <td><span>{ban}</span></td>
            </tr>"#
        )
    }

    pub(crate) fn meta_page(rows: &[String]) -> String {
        format!(
            "<html><body><table><thead><tr><th>Hero</th></tr></thead><tbody>{}</tbody></table></body></html>",
            rows.concat()
        )
    }

    /// Serves canned HTML by URL substring and records every request.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub pages: HashMap<String, String>,
        pub requests: Mutex<Vec<String>>,
        pub request_times: Mutex<Vec<Instant>>,
    }

    impl PageSource for FakeSource {
        fn get_page(&self, url: &str) -> Result<String, AppError> {
            self.request_times.lock().unwrap().push(Instant::now());
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .iter()
                .find(|(key, _)| url.contains(key.as_str()))
                .map(|(_, html)| html.clone())
                .ok_or_else(|| AppError::HttpStatus { status: 404, url: url.to_string() })
        }
    }

    #[test]
    fn parses_rates_and_slugs() {
        let html = meta_page(&[
            hero_row("Axe", "axe", "52.1%", "5.0%", "3.0%"),
            hero_row("Nature's Prophet", "natures-prophet", "49.80%", "2.31%", "0.50%"),
        ]);
        let mapping = parse_position_table(&html, &SlugHashResolver).unwrap();

        assert_eq!(mapping.len(), 2);
        let axe = &mapping["Axe"];
        assert_eq!(axe.win_rate, 52.1);
        assert_eq!(axe.pick_rate, 5.0);
        assert_eq!(axe.ban_rate, 3.0);
        assert_eq!(axe.url_slug, "axe");
        assert_eq!(axe.hero_id, derive_id("axe"));
        assert_eq!(mapping["Nature's Prophet"].url_slug, "natures-prophet");
    }

    #[test]
    fn malformed_percentages_keep_the_row() {
        let html = meta_page(&[hero_row("Puck", "puck", "-", "1.2%", "oops")]);
        let mapping = parse_position_table(&html, &SlugHashResolver).unwrap();
        let puck = &mapping["Puck"];
        assert_eq!(puck.win_rate, 0.0);
        assert_eq!(puck.pick_rate, 1.2);
        assert_eq!(puck.ban_rate, 0.0);
    }

    #[test]
    fn rows_without_hero_links_are_dropped() {
        let broken = r#"<tr><td><a href="/heroes/axe">Axe</a></td><td></td><td><span>50%</span></td></tr>"#;
        let html = meta_page(&[broken.to_string(), hero_row("Lina", "lina", "51%", "4%", "1%")]);
        let mapping = parse_position_table(&html, &SlugHashResolver).unwrap();
        assert_eq!(mapping.len(), 1);
        assert!(mapping.contains_key("Lina"));
    }

    #[test]
    fn page_without_rows_is_a_layout_failure() {
        let html = "<html><body><p>Verifying you are human</p></body></html>";
        let err = parse_position_table(html, &SlugHashResolver).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn page_whose_rows_all_drop_is_a_layout_failure() {
        let html = meta_page(&["<tr><td>no link</td></tr>".to_string()]);
        assert!(matches!(
            parse_position_table(&html, &SlugHashResolver),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn fetcher_requests_patch_and_position() {
        let mut source = FakeSource::default();
        source.pages.insert(
            "position=support-off".to_string(),
            meta_page(&[hero_row("Lion", "lion", "50%", "8%", "1%")]),
        );
        let source = Arc::new(source);
        let fetcher = PositionStatsFetcher::new(
            source.clone(),
            Arc::new(SlugHashResolver),
            "https://www.dotabuff.com/heroes",
        );

        let mapping = fetcher.fetch_position("7.36", Position::SupportOff).unwrap();
        assert_eq!(mapping["Lion"].pick_rate, 8.0);

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("date=7.36"));
        assert!(requests[0].contains("position=support-off"));
    }

    #[test]
    fn fetcher_surfaces_http_failures() {
        let fetcher = PositionStatsFetcher::new(
            Arc::new(FakeSource::default()),
            Arc::new(SlugHashResolver),
            "https://www.dotabuff.com/heroes",
        );
        let err = fetcher.fetch_position("7.36", Position::CoreMid).unwrap_err();
        assert!(matches!(err, AppError::HttpStatus { status: 404, .. }));
    }
}
