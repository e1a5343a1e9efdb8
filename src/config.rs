use crate::storage::resolve_data_path;
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    /// `None` keeps everything local.
    pub remote: Option<RemoteConfig>,
}

impl Config {
    /// Reads `PORT`, `APP_DATA_PATH`, `APP_REMOTE_URL` and `APP_REMOTE_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let remote = env::var("APP_REMOTE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .map(|url| RemoteConfig {
                url,
                timeout: Duration::from_millis(
                    env::var("APP_REMOTE_TIMEOUT_MS")
                        .ok()
                        .and_then(|value| value.parse::<u64>().ok())
                        .unwrap_or(DEFAULT_REMOTE_TIMEOUT_MS),
                ),
            });

        Self {
            port,
            data_path: resolve_data_path(),
            remote,
        }
    }
}
