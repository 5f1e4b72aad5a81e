use crate::config::Config;
use crate::error::AppError;
use crate::rate_limit::RequestPacer;
use crate::scrape::PageSource;
use std::io::{self, ErrorKind};
use tracing::{debug, warn};

use super::models::Hero;

/// Plain HTTP access to the stats source and the hero directory API.
pub struct DotabuffClient {
    agent: ureq::Agent,
    pacer: RequestPacer,
    heroes_url: String,
}

impl DotabuffClient {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.http_timeout)
            .user_agent(&config.user_agent)
            .build();
        DotabuffClient {
            agent,
            pacer: RequestPacer::new(config.request_interval),
            heroes_url: config.heroes_url.clone(),
        }
    }

    fn execute_request(&self, url: &str) -> Result<ureq::Response, AppError> {
        self.pacer.wait();
        debug!(%url, "GET");

        match self.agent.get(url).call() {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(status, _)) => {
                let err = status_error(status, url);
                if matches!(err, AppError::RateLimited) {
                    warn!(%url, "rate limited by source");
                }
                Err(err)
            }
            Err(ureq::Error::Transport(transport)) => Err(transport_error(url, &transport)),
        }
    }

    /// Hero directory from OpenDota.
    pub fn fetch_hero_directory(&self) -> Result<Vec<Hero>, AppError> {
        let resp = self.execute_request(&self.heroes_url)?;
        let mut heroes: Vec<Hero> = resp
            .into_json()
            .map_err(|e| AppError::JsonError(e.to_string()))?;
        heroes.sort_by_key(|hero| hero.id);
        Ok(heroes)
    }
}

impl PageSource for DotabuffClient {
    fn get_page(&self, url: &str) -> Result<String, AppError> {
        let resp = self.execute_request(url)?;
        resp.into_string().map_err(|e| {
            if is_timeout(e.kind()) {
                AppError::Timeout(url.to_string())
            } else {
                AppError::Http(e.to_string())
            }
        })
    }
}

fn status_error(status: u16, url: &str) -> AppError {
    match status {
        429 => AppError::RateLimited,
        _ => AppError::HttpStatus {
            status,
            url: url.to_string(),
        },
    }
}

/// Socket timeouts surface as `ErrorKind::Io` wrapping the `io::Error`.
fn transport_error(url: &str, transport: &ureq::Transport) -> AppError {
    let timed_out = transport.kind() == ureq::ErrorKind::Io
        && std::error::Error::source(transport)
            .and_then(|source| source.downcast_ref::<io::Error>())
            .is_some_and(|io_err| is_timeout(io_err.kind()));

    if timed_out {
        AppError::Timeout(url.to_string())
    } else {
        AppError::Http(transport.to_string())
    }
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::TimedOut | ErrorKind::WouldBlock)
}
