use crate::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.dotabuff.com/heroes";
pub const DEFAULT_HEROES_URL: &str = "https://api.opendota.com/api/heroes";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub base_url: String,
    pub heroes_url: String,
    pub user_agent: String,
    pub http_timeout: Duration,
    pub render_timeout: Duration,
    pub request_interval: Duration,
    pub chrome_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            base_url: DEFAULT_BASE_URL.to_string(),
            heroes_url: DEFAULT_HEROES_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout: Duration::from_secs(30),
            render_timeout: Duration::from_secs(60),
            request_interval: Duration::from_millis(1500),
            chrome_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut config = Config::default();

        if let Ok(dir) = env::var("DOTA_HELPER_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = env::var("DOTABUFF_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(url) = env::var("OPENDOTA_HEROES_URL") {
            config.heroes_url = url;
        }
        if let Ok(ua) = env::var("DOTA_HELPER_USER_AGENT") {
            config.user_agent = ua;
        }
        if let Some(secs) = read_number("DOTA_HELPER_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = read_number("DOTA_HELPER_RENDER_TIMEOUT_SECS")? {
            config.render_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = read_number("DOTA_HELPER_REQUEST_INTERVAL_MS")? {
            config.request_interval = Duration::from_millis(ms);
        }
        config.chrome_path = env::var("DOTA_HELPER_CHROME_PATH").ok().map(PathBuf::from);

        Ok(config)
    }
}

fn read_number(key: &str) -> Result<Option<u64>, AppError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            AppError::ConfigError(format!("{} must be a whole number, got '{}'", key, raw))
        }),
        Err(_) => Ok(None),
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("DotaHelper"))
        .unwrap_or_else(|| PathBuf::from(".dota_helper"))
}
