pub mod browser;
pub mod client;
pub mod endpoints;
pub mod models;
