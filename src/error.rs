use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limited by the stats source, please try again later")]
    RateLimited,

    #[error("Page layout mismatch: {0}")]
    Parse(String),

    #[error("Rendering engine error: {0}")]
    Browser(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No heroes data found. Run `dota-helper heroes` first")]
    NoHeroes,
}

impl AppError {
    /// Failures of the local environment rather than of one page or hero.
    /// These propagate as hard errors; everything else is absorbed into a
    /// "failed" result at the component boundary.
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            AppError::Browser(_) | AppError::Io(_) | AppError::ConfigError(_) | AppError::NoHeroes
        )
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Http(_)
                | AppError::HttpStatus { .. }
                | AppError::Timeout(_)
                | AppError::RateLimited
        )
    }
}
