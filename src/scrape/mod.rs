pub mod counters;
pub mod identity;
pub mod positions;

use std::time::Duration;

use scraper::{ElementRef, Selector};

use crate::error::AppError;

/// Plain HTTP page retrieval.
pub trait PageSource {
    fn get_page(&self, url: &str) -> Result<String, AppError>;
}

/// Page retrieval through a script-executing engine. Returns the rendered
/// document once `wait_selector` matches, or fails after `timeout`.
pub trait PageRenderer {
    fn render(&self, url: &str, wait_selector: &str, timeout: Duration) -> Result<String, AppError>;
}

pub(crate) fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::Parse(format!("invalid selector '{}': {}", css, e)))
}

/// "52.31%" -> 52.31. Malformed or missing text reads as 0.0.
pub fn parse_percentage(text: Option<&str>) -> f64 {
    parse_number(text).unwrap_or(0.0)
}

/// Accepts display text such as "-3.21%", "12,345" or "48.5".
pub(crate) fn parse_number(text: Option<&str>) -> Option<f64> {
    let cleaned: String = text?
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok()
}

pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_strip_the_sign() {
        assert_eq!(parse_percentage(Some("52.31%")), 52.31);
        assert_eq!(parse_percentage(Some(" 4.0 % ")), 4.0);
        assert_eq!(parse_percentage(Some("-1.5%")), -1.5);
    }

    #[test]
    fn malformed_percentages_default_to_zero() {
        assert_eq!(parse_percentage(Some("n/a")), 0.0);
        assert_eq!(parse_percentage(Some("")), 0.0);
        assert_eq!(parse_percentage(None), 0.0);
    }

    #[test]
    fn numbers_drop_thousands_separators() {
        assert_eq!(parse_number(Some("12,345")), Some(12345.0));
        assert_eq!(parse_number(Some("abc")), None);
    }
}
