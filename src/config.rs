// Run configuration: everything comes from the process environment (with an
// optional `.env` file), the same way the API client reads its gateway URL.

use crate::error::{PosterError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "5.131";
pub const DEFAULT_PLATFORM_URL: &str = "https://api.vk.com/method";
pub const DEFAULT_COMIC_URL: &str = "https://xkcd.com";
pub const DEFAULT_SCRATCH_DIR: &str = "images";
pub const DEFAULT_SCRATCH_FILE: &str = "comic.png";

/// Values every platform method call carries.
#[derive(Clone)]
pub struct Credentials {
    pub access_token: String,
    pub api_version: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Credentials {
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// `access_token` and `v` pairs, the common prefix of every method call.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("access_token", self.access_token.clone()),
            ("v", self.api_version.clone()),
        ]
    }
}

// Keep the token out of logs and panics.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub group_id: u64,
    pub credentials: Credentials,
    pub platform_url: String,
    pub comic_url: String,
    pub scratch_dir: PathBuf,
    pub scratch_file: String,
    pub http_timeout: Option<Duration>,
}

impl Settings {
    /// Settings with defaults for everything but the two required values.
    pub fn new(group_id: u64, access_token: impl Into<String>) -> Self {
        Settings {
            group_id,
            credentials: Credentials::new(access_token),
            platform_url: DEFAULT_PLATFORM_URL.to_string(),
            comic_url: DEFAULT_COMIC_URL.to_string(),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            scratch_file: DEFAULT_SCRATCH_FILE.to_string(),
            http_timeout: None,
        }
    }

    /// Load `.env` (if any) and read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_group = get("VK_GROUP_ID")
            .ok_or_else(|| PosterError::Config("VK_GROUP_ID is not set".into()))?;
        let group_id = parse_group_id(&raw_group)?;
        let access_token = get("VK_ACCESS_TOKEN")
            .ok_or_else(|| PosterError::Config("VK_ACCESS_TOKEN is not set".into()))?;

        let mut settings = Settings::new(group_id, access_token);
        if let Some(version) = get("VK_API_VERSION") {
            settings.credentials.api_version = version;
        }
        if let Some(url) = get("VK_API_URL") {
            settings.platform_url = url;
        }
        if let Some(url) = get("COMIC_API_URL") {
            settings.comic_url = url;
        }
        if let Some(dir) = get("SCRATCH_DIR") {
            settings.scratch_dir = PathBuf::from(dir);
        }
        if let Some(file) = get("SCRATCH_FILE") {
            settings.scratch_file = file;
        }
        if let Some(secs) = get("HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                PosterError::Config(format!("HTTP_TIMEOUT_SECS must be a number, got {secs:?}"))
            })?;
            settings.http_timeout = Some(Duration::from_secs(secs));
        }
        Ok(settings)
    }
}

/// Group ids are positive integers; a leading `-` (the owner form) is accepted.
fn parse_group_id(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    match digits.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(PosterError::Config(format!(
            "VK_GROUP_ID must be a positive integer, got {raw:?}"
        ))),
    }
}
