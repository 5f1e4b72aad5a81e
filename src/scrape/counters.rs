use std::sync::Arc;
use std::time::Duration;

use scraper::{ElementRef, Html};
use tracing::{debug, info};

use super::identity::{slug_from_href, HeroIdentityResolver};
use super::{element_text, parse_number, selector, PageRenderer};
use crate::api::endpoints;
use crate::error::AppError;
use crate::models::CounterEntry;

/// Rows the rendered counters page must contain before it is read.
pub const COUNTER_ROW_SELECTOR: &str = "table.sortable tbody tr";

// 1-based cells: icon, name, disadvantage, win rate, matches played
const NAME_CELL: usize = 2;
const DISADVANTAGE_CELL: usize = 3;
const WIN_RATE_CELL: usize = 4;
const MATCHES_CELL: usize = 5;

pub struct CounterFetcher {
    renderer: Arc<dyn PageRenderer>,
    resolver: Arc<dyn HeroIdentityResolver>,
    base_url: String,
    timeout: Duration,
}

impl CounterFetcher {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        resolver: Arc<dyn HeroIdentityResolver>,
        base_url: &str,
        timeout: Duration,
    ) -> Self {
        CounterFetcher {
            renderer,
            resolver,
            base_url: base_url.to_string(),
            timeout,
        }
    }

    /// Counter matchups for one hero, strongest counters (lowest
    /// disadvantage) first.
    pub fn fetch_counters(
        &self,
        hero_slug: &str,
        patch_version: &str,
    ) -> Result<Vec<CounterEntry>, AppError> {
        let url = endpoints::hero_counters_url(&self.base_url, hero_slug, patch_version);
        debug!(slug = hero_slug, %url, "rendering counters page");

        let html = self.renderer.render(&url, COUNTER_ROW_SELECTOR, self.timeout)?;
        let counters = parse_counters_table(&html, self.resolver.as_ref())?;

        info!(slug = hero_slug, rows = counters.len(), "parsed counters page");
        Ok(counters)
    }
}

pub fn parse_counters_table(
    html: &str,
    resolver: &dyn HeroIdentityResolver,
) -> Result<Vec<CounterEntry>, AppError> {
    let document = Html::parse_document(html);
    let row_selector = selector(COUNTER_ROW_SELECTOR)?;
    let cell_selector = selector("td")?;
    let link_selector = selector(r#"a[href^="/heroes/"]"#)?;

    let rows: Vec<_> = document.select(&row_selector).collect();
    if rows.is_empty() {
        return Err(AppError::Parse("no counter rows found on counters page".to_string()));
    }

    let mut counters = Vec::with_capacity(rows.len());
    for row in &rows {
        let cells: Vec<_> = row.select(&cell_selector).collect();
        let links: Vec<_> = row.select(&link_selector).collect();

        let Some(slug) = links
            .iter()
            .find_map(|link| link.value().attr("href").and_then(slug_from_href))
        else {
            continue;
        };

        let hero_name = links
            .iter()
            .map(element_text)
            .find(|text| !text.is_empty())
            .or_else(|| {
                cells
                    .get(NAME_CELL - 1)
                    .and_then(|cell| cell.value().attr("data-value"))
                    .map(|value| value.trim().to_string())
            })
            .unwrap_or_else(|| slug.clone());

        let number = |cell_number: usize| {
            cells
                .get(cell_number - 1)
                .and_then(cell_value)
                .unwrap_or(0.0)
        };

        counters.push(CounterEntry {
            hero_id: resolver.derive_id(&slug),
            hero_name,
            hero_url: slug,
            disadvantage: number(DISADVANTAGE_CELL),
            win_rate: number(WIN_RATE_CELL),
            matches_played: number(MATCHES_CELL).max(0.0).round() as u64,
        });
    }

    if counters.is_empty() {
        return Err(AppError::Parse(format!(
            "{} counter rows found but none carried a hero link",
            rows.len()
        )));
    }

    sort_by_disadvantage(&mut counters);
    Ok(counters)
}

/// The machine-readable `data-value` attribute wins over display text.
fn cell_value(cell: &ElementRef<'_>) -> Option<f64> {
    cell.value()
        .attr("data-value")
        .and_then(|value| parse_number(Some(value)))
        .or_else(|| parse_number(Some(&element_text(cell))))
}

pub fn sort_by_disadvantage(counters: &mut [CounterEntry]) {
    counters.sort_by(|a, b| a.disadvantage.total_cmp(&b.disadvantage));
}
