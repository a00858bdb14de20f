use serde::{Deserialize, Serialize};

/// Main configuration structure for the sync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// GitHub API token (required)
    #[serde(default)]
    pub github_api_token: String,

    /// Label applied to every mirrored issue (required)
    #[serde(default)]
    pub sync_label: String,

    /// Package to repository mappings, processed in order (required)
    #[serde(default)]
    pub repositories: Vec<RepositoryMapping>,

    /// GitHub endpoint configuration
    #[serde(default)]
    pub github: GitHubConfig,

    /// Debian BTS endpoint configuration
    #[serde(default)]
    pub debbugs: DebbugsConfig,

    /// Host call pacing
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Retry policy for transient host failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Tracker read-through cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Reconciliation policy switches
    #[serde(default)]
    pub sync: SyncPolicyConfig,
}

/// One Debian package mirrored into one GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RepositoryMapping {
    /// Source package name on the BTS
    pub debian_pkg: String,

    /// Target repository as `owner/name`
    pub github_repo: String,
}

/// GitHub endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GitHubConfig {
    /// Base URL of the REST API
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Debian BTS endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DebbugsConfig {
    /// SOAP endpoint
    #[serde(default = "default_soap_url")]
    pub soap_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_soap_url() -> String {
    "https://bugs.debian.org/cgi-bin/soap.cgi".to_string()
}

impl Default for DebbugsConfig {
    fn default() -> Self {
        Self {
            soap_url: default_soap_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Host call pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ThrottleConfig {
    /// Below this many remaining requests the sync pauses for `cooldown_secs`
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: u32,

    /// Length of the pause once the quota runs low
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Per-call delay is `total * backoff_factor / remaining` seconds
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Extra delay after each content-creating call, in milliseconds
    #[serde(default = "default_write_delay_ms")]
    pub write_delay_ms: u64,
}

const fn default_low_water_mark() -> u32 {
    10
}

const fn default_cooldown_secs() -> u64 {
    3600
}

const fn default_backoff_factor() -> f64 {
    0.1
}

const fn default_write_delay_ms() -> u64 {
    1000
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            low_water_mark: default_low_water_mark(),
            cooldown_secs: default_cooldown_secs(),
            backoff_factor: default_backoff_factor(),
            write_delay_ms: default_write_delay_ms(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    2000
}

const fn default_max_backoff_ms() -> u64 {
    60000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Tracker read-through cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Disable to always hit the tracker
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding cached entries
    #[serde(default = "default_cache_dir")]
    pub dir: String,

    /// Entry lifetime in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

const fn default_true() -> bool {
    true
}

fn default_cache_dir() -> String {
    ".cache".to_string()
}

const fn default_cache_ttl_secs() -> u64 {
    60 * 60 * 24
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            dir: default_cache_dir(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for daily-rotated JSON log files (optional)
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Reconciliation policy switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncPolicyConfig {
    /// Create (then close) issues for bugs already resolved on first sighting
    #[serde(default = "default_true")]
    pub create_resolved_bugs: bool,
}

impl Default for SyncPolicyConfig {
    fn default() -> Self {
        Self {
            create_resolved_bugs: default_true(),
        }
    }
}
