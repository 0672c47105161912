use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use teloxide::types::UserId;
use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite://db/users.db";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_ANSWER_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
    #[error("{0} and {1} must be set together")]
    Incomplete(&'static str, &'static str),
}

/// Address pair for running behind a webhook instead of long polling.
#[derive(Debug, Clone)]
pub struct Webhook {
    pub url: Url,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub data_dir: PathBuf,
    pub moderators: Vec<UserId>,
    pub answer_timeout: Duration,
    pub webhook: Option<Webhook>,
}

impl Config {
    /// Reads the configuration from the process environment, loading `.env`
    /// first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let moderators = match lookup("MODERATOR_IDS") {
            Some(raw) => parse_moderators(&raw)?,
            None => Vec::new(),
        };

        let answer_timeout = match lookup("ANSWER_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "ANSWER_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => Duration::from_secs(DEFAULT_ANSWER_TIMEOUT_SECS),
        };

        let webhook = match (lookup("WEBHOOK_URL"), lookup("WEBHOOK_ADDR")) {
            (Some(url), Some(addr)) => Some(Webhook {
                url: url.parse().map_err(|_| ConfigError::Invalid {
                    name: "WEBHOOK_URL",
                    value: url.clone(),
                })?,
                addr: addr.parse().map_err(|_| ConfigError::Invalid {
                    name: "WEBHOOK_ADDR",
                    value: addr.clone(),
                })?,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::Incomplete("WEBHOOK_URL", "WEBHOOK_ADDR")),
        };

        Ok(Self {
            database_url,
            data_dir,
            moderators,
            answer_timeout,
            webhook,
        })
    }

    pub fn content_path(&self) -> PathBuf {
        self.data_dir.join("json").join("learn.json")
    }

    pub fn media_cache_path(&self) -> PathBuf {
        self.data_dir.join("json").join("id.json")
    }

    pub fn image_dir(&self) -> PathBuf {
        self.data_dir.join("img")
    }

    pub fn video_dir(&self) -> PathBuf {
        self.data_dir.join("vid")
    }

    /// Directories that must exist before the bot starts serving.
    pub fn required_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![
            self.data_dir.join("json"),
            self.image_dir(),
            self.video_dir(),
        ];
        if let Some(parent) = sqlite_parent_dir(&self.database_url) {
            dirs.push(parent);
        }
        dirs
    }
}

fn parse_moderators(raw: &str) -> Result<Vec<UserId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u64>().map(UserId).map_err(|_| ConfigError::Invalid {
                name: "MODERATOR_IDS",
                value: id.to_owned(),
            })
        })
        .collect()
}

fn sqlite_parent_dir(database_url: &str) -> Option<PathBuf> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
