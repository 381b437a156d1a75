//! Configuration for jenq.
//!
//! JENQ_ROOT resolution order:
//! 1. Explicit path passed to Config::load_from()
//! 2. JENQ_ROOT environment variable
//! 3. Default: the platform config directory (~/.config/jenq on Linux)
//!
//! `JENKINS_HOST_URL`, `JENKINS_DEFAULT_JOB` and `JENKINS_USER` override
//! the values read from `config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::pool::{PoolOptions, DEFAULT_CHANNEL_CAPACITY, DEFAULT_WORKERS};
use crate::{Error, Result};

pub const ENV_ROOT: &str = "JENQ_ROOT";
pub const ENV_HOST_URL: &str = "JENKINS_HOST_URL";
pub const ENV_DEFAULT_JOB: &str = "JENKINS_DEFAULT_JOB";
pub const ENV_USER: &str = "JENKINS_USER";

/// jenq configuration, scoped to one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml.
    #[serde(skip)]
    pub root: PathBuf,

    /// Base URL of the Jenkins host.
    #[serde(default)]
    pub host_url: Option<String>,

    /// Job queried when none is given on the command line.
    #[serde(default)]
    pub default_job: Option<String>,

    /// User to authenticate as.
    #[serde(default = "default_username")]
    pub username: String,

    /// Concurrent build fetches.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Fetched builds buffered ahead of the consumer.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Create a new config rooted at the given directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            host_url: None,
            default_job: None,
            username: default_username(),
            workers: default_workers(),
            channel_capacity: default_channel_capacity(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Load config from JENQ_ROOT/config.toml and apply environment overrides.
    pub fn load() -> Result<Self> {
        let root = resolve_root()?;
        let mut config = Self::load_from(&root)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load the stored config only, ignoring the environment. Used when the
    /// config is about to be rewritten.
    pub fn load_stored() -> Result<Self> {
        Self::load_from(&resolve_root()?)
    }

    /// Load config from a specific root, without environment overrides.
    pub fn load_from(root: &Path) -> Result<Self> {
        let config_path = root.join("config.toml");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
            config.root = root.to_path_buf();
            Ok(config)
        } else {
            Ok(Self::with_root(root))
        }
    }

    /// Save config to JENQ_ROOT/config.toml.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(self.config_path(), contents)?;
        Ok(())
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = lookup(ENV_HOST_URL) {
            self.host_url = Some(host);
        }
        if let Some(job) = lookup(ENV_DEFAULT_JOB) {
            self.default_job = Some(job);
        }
        if let Some(user) = lookup(ENV_USER) {
            self.username = user;
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// The Jenkins host URL with exactly one trailing slash.
    pub fn host_url(&self) -> Result<String> {
        match self.host_url.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => Ok(normalize_host(host)),
            _ => Err(Error::Config(format!("{} is empty", ENV_HOST_URL))),
        }
    }

    /// Pick the job to query: the explicit name, else the configured default.
    pub fn job<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        explicit
            .or(self.default_job.as_deref())
            .filter(|job| !job.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "Job not specified. Pass a job name or set {}",
                    ENV_DEFAULT_JOB
                ))
            })
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            workers: self.workers,
            capacity: self.channel_capacity,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Trim trailing slashes and append a single one.
pub fn normalize_host(host: &str) -> String {
    format!("{}/", host.trim_end_matches('/'))
}

/// Resolve JENQ_ROOT using the standard resolution order.
fn resolve_root() -> Result<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var(ENV_ROOT) {
        return Ok(PathBuf::from(path));
    }

    // 2. XDG config directory (via directories crate)
    if let Some(proj_dirs) = ProjectDirs::from("", "", "jenq") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // 3. Fallback to ~/.config/jenq
    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".config/jenq"))
}
