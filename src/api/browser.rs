//! Headless browser rendering for pages that build their tables client-side.
//!
//! One browser process is launched lazily on first use and reused for every
//! render. The mutex guards only that one-time launch; each render then runs
//! in its own incognito context so cookies and cache never leak between
//! fetches. Renders are not issued concurrently.

use headless_chrome::{Browser, LaunchOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::rate_limit::RequestPacer;
use crate::scrape::PageRenderer;

const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
    pub navigation_timeout: Duration,
}

impl RenderOptions {
    pub fn from_config(config: &Config) -> Self {
        RenderOptions {
            chrome_path: config.chrome_path.clone(),
            user_agent: config.user_agent.clone(),
            navigation_timeout: config.render_timeout,
        }
    }
}

pub struct BrowserRenderer {
    options: RenderOptions,
    browser: Mutex<Option<Arc<Browser>>>,
    pacer: RequestPacer,
}

impl BrowserRenderer {
    pub fn new(options: RenderOptions, request_interval: Duration) -> Self {
        BrowserRenderer {
            options,
            browser: Mutex::new(None),
            pacer: RequestPacer::new(request_interval),
        }
    }

    pub fn is_running(&self) -> bool {
        self.browser
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Closes the browser process. A later render relaunches it.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.browser.lock() {
            if guard.take().is_some() {
                info!("headless browser shut down");
            }
        }
    }

    fn browser(&self) -> Result<Arc<Browser>, AppError> {
        let mut guard = self
            .browser
            .lock()
            .map_err(|_| AppError::Browser("browser initialization lock poisoned".to_string()))?;

        if let Some(browser) = guard.as_ref() {
            return Ok(Arc::clone(browser));
        }

        info!(path = ?self.options.chrome_path, "launching headless browser");
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .path(self.options.chrome_path.clone())
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .build()
            .map_err(|e| AppError::Browser(format!("invalid launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("failed to launch browser: {}", e)))?;
        let browser = Arc::new(browser);
        *guard = Some(Arc::clone(&browser));
        Ok(browser)
    }
}

impl PageRenderer for BrowserRenderer {
    fn render(&self, url: &str, wait_selector: &str, timeout: Duration) -> Result<String, AppError> {
        let browser = self.browser()?;
        self.pacer.wait();

        let context = browser
            .new_context()
            .map_err(|e| AppError::Browser(format!("failed to open browser context: {}", e)))?;
        let tab = context
            .new_tab()
            .map_err(|e| AppError::Browser(format!("failed to open tab: {}", e)))?;

        tab.set_default_timeout(self.options.navigation_timeout);
        if let Err(e) = tab.set_user_agent(&self.options.user_agent, None, None) {
            debug!(error = %e, "could not override user agent");
        }

        debug!(%url, "navigating");
        let result = tab
            .navigate_to(url)
            .map_err(|e| AppError::Http(format!("navigation to {} failed: {}", url, e)))
            .and_then(|tab| {
                tab.wait_for_element_with_custom_timeout(wait_selector, timeout)
                    .map_err(|e| {
                        AppError::Timeout(format!(
                            "'{}' did not appear on {} within {}s: {}",
                            wait_selector,
                            url,
                            timeout.as_secs(),
                            e
                        ))
                    })?;
                tab.get_content()
                    .map_err(|e| AppError::Http(format!("failed to read rendered page: {}", e)))
            });

        if let Err(e) = tab.close(true) {
            warn!(error = %e, "failed to close tab");
        }

        result
    }
}
