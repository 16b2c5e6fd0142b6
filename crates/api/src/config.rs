use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use idioms_cloud::openai::OpenAiConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background jobs, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Whether the admin routes are mounted at all (default: `false`).
    pub admin_enabled: bool,
    /// Largest accepted request body on admin routes (default: 10 MiB).
    pub max_upload_bytes: usize,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    pub listing: ListingConfig,
    pub generation: GenerationTaskConfig,
    pub openai: OpenAiConfig,
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `ADMIN_ENABLED`         | `false`                    |
    /// | `MAX_UPLOAD_BYTES`      | `10485760`                 |
    ///
    /// See [`ListingConfig::from_env`], [`GenerationTaskConfig::from_env`],
    /// [`openai_from_env`] and [`StorageConfig::from_env`] for the rest.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_parse("PORT", "3000");
        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );
        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", "30");
        let shutdown_timeout_secs: u64 = env_parse("SHUTDOWN_TIMEOUT_SECS", "30");
        let admin_enabled = env_flag("ADMIN_ENABLED", false);
        let max_upload_bytes: usize = env_parse("MAX_UPLOAD_BYTES", "10485760");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            admin_enabled,
            max_upload_bytes,
            jwt,
            listing: ListingConfig::from_env(),
            generation: GenerationTaskConfig::from_env(admin_enabled),
            openai: openai_from_env(),
            storage: StorageConfig::from_env(),
        }
    }
}

// ---------------------------------------------------------------------------
// Listing defaults
// ---------------------------------------------------------------------------

/// Page sizes per listing endpoint.
///
/// Each endpoint has its own named default; requested sizes are still
/// clamped to the global maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingConfig {
    /// `GET /idioms`
    pub public_page_size: i64,
    /// `GET /idioms/admin`
    pub admin_page_size: i64,
    /// `GET /idioms/search`
    pub search_page_size: i64,
    /// `GET /idioms/featured`
    pub featured_page_size: i64,
    /// Neighbours taken on each side by `GET /idioms/{id}/related`.
    pub related_per_side: i64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            public_page_size: 20,
            admin_page_size: 20,
            search_page_size: 10,
            featured_page_size: 24,
            related_per_side: 4,
        }
    }
}

impl ListingConfig {
    /// | Env Var              | Default |
    /// |----------------------|---------|
    /// | `PUBLIC_PAGE_SIZE`   | `20`    |
    /// | `ADMIN_PAGE_SIZE`    | `20`    |
    /// | `SEARCH_PAGE_SIZE`   | `10`    |
    /// | `FEATURED_PAGE_SIZE` | `24`    |
    /// | `RELATED_PER_SIDE`   | `4`     |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            public_page_size: env_parse("PUBLIC_PAGE_SIZE", &defaults.public_page_size.to_string()),
            admin_page_size: env_parse("ADMIN_PAGE_SIZE", &defaults.admin_page_size.to_string()),
            search_page_size: env_parse("SEARCH_PAGE_SIZE", &defaults.search_page_size.to_string()),
            featured_page_size: env_parse(
                "FEATURED_PAGE_SIZE",
                &defaults.featured_page_size.to_string(),
            ),
            related_per_side: env_parse("RELATED_PER_SIDE", &defaults.related_per_side.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Background generation
// ---------------------------------------------------------------------------

/// Settings of the queue-draining generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTaskConfig {
    pub enabled: bool,
    pub interval: Duration,
}

impl GenerationTaskConfig {
    /// | Env Var                    | Default           |
    /// |----------------------------|-------------------|
    /// | `GENERATION_ENABLED`       | `ADMIN_ENABLED`   |
    /// | `GENERATION_INTERVAL_SECS` | `120`             |
    pub fn from_env(admin_enabled: bool) -> Self {
        let interval_secs: u64 = env_parse("GENERATION_INTERVAL_SECS", "120");
        Self {
            enabled: env_flag("GENERATION_ENABLED", admin_enabled),
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }
}

// ---------------------------------------------------------------------------
// External services
// ---------------------------------------------------------------------------

/// Generation API settings.
///
/// | Env Var               | Default                  |
/// |-----------------------|--------------------------|
/// | `OPENAI_API_KEY`      | empty                    |
/// | `OPENAI_ORG`          | unset                    |
/// | `OPENAI_BASE_URL`     | `https://api.openai.com` |
/// | `OPENAI_TEXT_MODEL`   | `gpt-4o`                 |
/// | `OPENAI_IMAGE_MODEL`  | `dall-e-3`               |
/// | `OPENAI_TIMEOUT_SECS` | `120`                    |
pub fn openai_from_env() -> OpenAiConfig {
    let defaults = OpenAiConfig::default();
    let timeout_secs: u64 = env_parse("OPENAI_TIMEOUT_SECS", &defaults.timeout.as_secs().to_string());
    OpenAiConfig {
        api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
        organization: std::env::var("OPENAI_ORG").ok().filter(|o| !o.is_empty()),
        base_url: std::env::var("OPENAI_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url),
        text_model: std::env::var("OPENAI_TEXT_MODEL").unwrap_or(defaults.text_model),
        image_model: std::env::var("OPENAI_IMAGE_MODEL").unwrap_or(defaults.image_model),
        timeout: Duration::from_secs(timeout_secs),
    }
}

/// Thumbnail storage settings. Credentials and region come from the
/// default AWS provider chain.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// `THUMBNAIL_BUCKET`; objects are kept in memory when unset.
    pub thumbnail_bucket: Option<String>,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            thumbnail_bucket: std::env::var("THUMBNAIL_BUCKET")
                .ok()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
        }
    }
}

// ---- private helpers ----

fn env_parse<T>(key: &str, default: &str) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .unwrap_or_else(|e| panic!("{key} must be valid: {e}"))
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|raw| parse_flag(&raw))
        .unwrap_or(default)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
