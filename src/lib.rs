//! Scrapes per-hero competitive statistics and counter matchups from
//! Dotabuff and keeps them in patch-scoped JSON caches.

pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod models;
pub mod precache;
pub mod rate_limit;
pub mod scrape;
pub mod service;
pub mod storage;
