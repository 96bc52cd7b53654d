use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cache::{CacheExt, InMemoryCache};

/// Environment variable overriding the settings directory
pub const SETTINGS_DIR_ENV: &str = "MDS_SETTINGS_DIR";

/// Environment variable enabling verbose (debug) output
pub const VERBOSE_ENV: &str = "MDS_SDK_VERBOSE";

/// File holding the selected environment name
const SELECTED_ENV_FILE: &str = "selectedEnv";

/// Environment used when none is selected
pub const DEFAULT_ENV_NAME: &str = "default";

/// mds-token - obtain an MdsCloud identity token
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Named environment from the settings directory
    #[arg(short = 'e', long = "env", env = "MDS_ENV")]
    pub environment: Option<String>,

    /// Identity service URL
    #[arg(short = 'i', long, env = "MDS_IDENTITY_URL")]
    pub identity_url: Option<String>,

    /// Account to authenticate against
    #[arg(short = 'a', long, env = "MDS_ACCOUNT")]
    pub account: Option<String>,

    /// User to authenticate as
    #[arg(short = 'u', long, env = "MDS_USER_ID")]
    pub user_id: Option<String>,

    /// Password to authenticate with
    #[arg(short = 'p', long, env = "MDS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Accept self-signed certificates from the identity service
    #[arg(long, env = "MDS_ALLOW_SELF_SIGN_CERT")]
    pub allow_self_sign_cert: Option<bool>,

    /// Pre-issued token to seed the token cache with
    #[arg(long, env = "MDS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Token cache backend
    #[arg(long, env = "MDS_CACHE", value_enum, default_value = "disk")]
    pub cache: CacheKind,

    /// Token cache file (disk backend)
    #[arg(long, env = "MDS_CACHE_FILE")]
    pub cache_file: Option<String>,

    /// Settings directory holding environment files
    #[arg(long, env = "MDS_SETTINGS_DIR")]
    pub settings_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl CliArgs {
    /// Parse CLI arguments after loading a `.env` file if one exists
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    /// Effective log level; verbose mode forces at least debug
    pub fn effective_log_level(&self) -> String {
        if std::env::var_os(VERBOSE_ENV).is_some() && !is_more_verbose_than_debug(&self.log_level) {
            return "debug".to_string();
        }
        self.log_level.to_lowercase()
    }
}

fn is_more_verbose_than_debug(level: &str) -> bool {
    matches!(level.to_lowercase().as_str(), "debug" | "trace")
}

/// Token cache backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CacheKind {
    /// JSON file in the settings directory, shared across processes
    #[default]
    Disk,
    /// Process-local map
    Memory,
}

/// Service locations for an environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentUrls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qs_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sm_url: Option<String>,

    /// Accept self-signed certificates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_self_sign_cert: Option<bool>,
}

impl EnvironmentUrls {
    /// Fill every unset field from `fallback`
    pub fn or(self, fallback: EnvironmentUrls) -> EnvironmentUrls {
        EnvironmentUrls {
            identity_url: self.identity_url.or(fallback.identity_url),
            ns_url: self.ns_url.or(fallback.ns_url),
            qs_url: self.qs_url.or(fallback.qs_url),
            fs_url: self.fs_url.or(fallback.fs_url),
            sf_url: self.sf_url.or(fallback.sf_url),
            sm_url: self.sm_url.or(fallback.sm_url),
            allow_self_sign_cert: self.allow_self_sign_cert.or(fallback.allow_self_sign_cert),
        }
    }
}

/// Contents of `{settings_dir}/{name}.json`
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    #[serde(flatten)]
    pub urls: EnvironmentUrls,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("urls", &self.urls)
            .field("account", &self.account)
            .field("user_id", &self.user_id)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Reader for the settings directory (`~/.mds` by default)
///
/// Lookups are memoized for the lifetime of the store.
pub struct ConfigStore {
    settings_dir: PathBuf,
    memo: InMemoryCache,
}

impl ConfigStore {
    /// Create a store reading from `settings_dir`
    pub fn new(settings_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings_dir: settings_dir.into(),
            memo: InMemoryCache::new(),
        }
    }

    /// Create a store for [`default_settings_dir`]
    pub fn from_env() -> Self {
        Self::new(default_settings_dir())
    }

    /// Get the settings directory
    pub fn settings_dir(&self) -> &Path {
        &self.settings_dir
    }

    /// Name of the selected environment, or [`DEFAULT_ENV_NAME`]
    pub fn default_env(&self) -> String {
        const MEMO_KEY: &str = "defaultEnv";
        if let Ok(Some(name)) = self.memo.get_as::<String>(MEMO_KEY) {
            return name;
        }

        let file = self.settings_dir.join(SELECTED_ENV_FILE);
        let selected = std::fs::read_to_string(&file)
            .ok()
            .map(|contents| contents.trim().to_string())
            .filter(|name| !name.is_empty());

        match selected {
            Some(name) => {
                if let Err(e) = self.memo.set_as(MEMO_KEY, &name) {
                    tracing::debug!("Failed to memoize selected environment {}: {}", name, e);
                }
                name
            }
            None => DEFAULT_ENV_NAME.to_string(),
        }
    }

    /// Load `{settings_dir}/{name}.json`
    ///
    /// Missing, unreadable or malformed files yield `None`.
    pub fn env_config(&self, name: &str) -> Option<EnvironmentConfig> {
        if name.is_empty() {
            return None;
        }

        let memo_key = format!("envConfig-{}", name);
        if let Ok(Some(config)) = self.memo.get_as::<EnvironmentConfig>(&memo_key) {
            return Some(config);
        }

        let file = self.settings_dir.join(format!("{}.json", name));
        let contents = match std::fs::read_to_string(&file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::debug!("Failed to read environment {} from {}: {}", name, file.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<EnvironmentConfig>(&contents) {
            Ok(config) => {
                if let Err(e) = self.memo.set_as(&memo_key, &config) {
                    tracing::debug!("Failed to memoize environment {}: {}", name, e);
                }
                Some(config)
            }
            Err(e) => {
                tracing::debug!("Failed to parse environment {} from {}: {}", name, file.display(), e);
                None
            }
        }
    }
}

/// Settings directory from `MDS_SETTINGS_DIR`, else `~/.mds`
pub fn default_settings_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(SETTINGS_DIR_ENV) {
        if !dir.is_empty() {
            return expand_tilde(&dir);
        }
    }

    dirs::home_dir()
        .map(|home| home.join(".mds"))
        .unwrap_or_else(|| PathBuf::from(".mds"))
}

/// Expand tilde (~) in file paths to user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
