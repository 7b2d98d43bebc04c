use serde::Deserialize;

/// Main configuration structure for Feedback-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

/// Target listing site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root URL of the listing site, e.g. `https://congtytui1.com`
    #[serde(rename = "root-url")]
    pub root_url: String,
}

/// Which automation engine drives page loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Headless Chromium, waits for network quiescence
    Chromium,
    /// Plain HTTP fetches, no script execution
    Http,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Http => "http",
        }
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_engine")]
    pub engine: EngineKind,

    /// Launch Chromium with `--no-sandbox --disable-setuid-sandbox`
    #[serde(rename = "no-sandbox", default = "default_true")]
    pub no_sandbox: bool,

    /// Settling window with no in-flight requests (milliseconds)
    #[serde(rename = "idle-time-ms", default = "default_idle_time_ms")]
    pub idle_time_ms: u64,

    /// Upper bound for a single navigation including the settle wait (milliseconds)
    #[serde(
        rename = "navigation-timeout-ms",
        default = "default_navigation_timeout_ms"
    )]
    pub navigation_timeout_ms: u64,

    /// User agent override
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Path to a Chromium executable; auto-detected when absent
    #[serde(default)]
    pub executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            no_sandbox: true,
            idle_time_ms: default_idle_time_ms(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            user_agent: None,
            executable: None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// How long a write waits on a locked database (milliseconds)
    #[serde(rename = "busy-timeout-ms", default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// What happens to a crawl request when every session slot is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Wait for a free slot
    Queue,
    /// Fail immediately with `HarvestError::Busy`
    Reject,
}

/// Crawl service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Maximum number of browser sessions alive at once
    #[serde(
        rename = "max-concurrent-crawls",
        default = "default_max_concurrent_crawls"
    )]
    pub max_concurrent_crawls: u32,

    #[serde(default = "default_admission")]
    pub admission: AdmissionPolicy,

    /// Serialize concurrent crawls of the same company slug
    #[serde(rename = "per-slug-lock", default)]
    pub per_slug_lock: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_crawls: default_max_concurrent_crawls(),
            admission: default_admission(),
            per_slug_lock: false,
        }
    }
}

fn default_engine() -> EngineKind {
    EngineKind::Chromium
}

fn default_true() -> bool {
    true
}

fn default_idle_time_ms() -> u64 {
    500
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_database_path() -> String {
    "./feedback.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_max_concurrent_crawls() -> u32 {
    2
}

fn default_admission() -> AdmissionPolicy {
    AdmissionPolicy::Queue
}
