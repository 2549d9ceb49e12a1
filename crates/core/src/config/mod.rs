//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (STOCKROOM_*)
//! 2. Storefront credential variables (ETSY_API_KEY, SHOPIFY_DOMAIN, ...)
//! 3. TOML config file (if STOCKROOM_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};

mod validation;

pub use validation::ConfigError;

/// Storefront credential variables and the config path each one fills.
///
/// These keep the names the shop scripts have always used so an existing
/// `.env` keeps working.
const RAW_ENV_KEYS: &[(&str, &str)] = &[
    ("ETSY_API_KEY", "etsy.api_key"),
    ("ETSY_ACCESS_TOKEN", "etsy.access_token"),
    ("ETSY_SHOP_ID", "etsy.shop_id"),
    ("SHOPIFY_DOMAIN", "shopify.domain"),
    ("SHOPIFY_STOREFRONT_ACCESS_TOKEN", "shopify.storefront_access_token"),
    ("SHOPIFY_ADMIN_ACCESS_TOKEN", "shopify.admin_access_token"),
    ("SHOP_NAME", "shopify.shop_name"),
    ("API_KEY", "ravelry.username"),
    ("API_PASSWORD", "ravelry.password"),
    ("STORE_ID", "ravelry.store_id"),
    ("DESIGNER_ID", "ravelry.designer_id"),
    ("DESIGNER_NAME", "ravelry.designer_name"),
    ("PORT", "port"),
];

/// Which storefront the catalog is served from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Etsy Open API v3.
    #[default]
    Etsy,
    /// Shopify Storefront or Admin GraphQL API.
    Shopify,
    /// Legacy Ravelry REST API.
    Ravelry,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Etsy => f.write_str("etsy"),
            BackendKind::Shopify => f.write_str("shopify"),
            BackendKind::Ravelry => f.write_str("ravelry"),
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (STOCKROOM_*)
/// 2. Storefront credential variables (ETSY_API_KEY, PORT, ...)
/// 3. TOML config file (if STOCKROOM_CONFIG_FILE set)
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storefront backend to read the catalog from.
    ///
    /// Set via STOCKROOM_BACKEND environment variable.
    #[serde(default)]
    pub backend: BackendKind,

    /// Directory holding the JSON cache files.
    ///
    /// Set via STOCKROOM_DATA_DIR environment variable.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Freshness window for cached entries, in seconds.
    ///
    /// Set via STOCKROOM_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Serve an expired entry when the refetch fails.
    ///
    /// Set via STOCKROOM_SERVE_STALE_ON_ERROR environment variable.
    #[serde(default = "default_true")]
    pub serve_stale_on_error: bool,

    /// HTTP listen port.
    ///
    /// Set via PORT or STOCKROOM_PORT environment variable.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Storefront API request timeout in milliseconds.
    ///
    /// Set via STOCKROOM_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent string for storefront API requests.
    ///
    /// Set via STOCKROOM_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Number of listings whose reviews are fetched concurrently.
    #[serde(default = "default_review_batch_size")]
    pub review_batch_size: usize,

    /// Pause between review batches in milliseconds.
    #[serde(default = "default_review_batch_delay_ms")]
    pub review_batch_delay_ms: u64,

    /// Pause between product detail fetches during a full sync, in milliseconds.
    #[serde(default = "default_sync_delay_ms")]
    pub sync_delay_ms: u64,

    #[serde(default)]
    pub etsy: EtsyConfig,

    #[serde(default)]
    pub shopify: ShopifyConfig,

    #[serde(default)]
    pub ravelry: RavelryConfig,
}

/// Etsy Open API v3 credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtsyConfig {
    /// Set via ETSY_API_KEY.
    #[serde(default, deserialize_with = "lossy_string")]
    pub api_key: Option<String>,
    /// OAuth2 bearer token. Set via ETSY_ACCESS_TOKEN.
    #[serde(default, deserialize_with = "lossy_string")]
    pub access_token: Option<String>,
    /// Set via ETSY_SHOP_ID.
    #[serde(default, deserialize_with = "lossy_string")]
    pub shop_id: Option<String>,
    #[serde(default = "default_etsy_base_url")]
    pub base_url: String,
}

/// Shopify GraphQL credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyConfig {
    /// Shop domain, e.g. `example.myshopify.com`. Set via SHOPIFY_DOMAIN.
    #[serde(default)]
    pub domain: Option<String>,
    /// Set via SHOPIFY_STOREFRONT_ACCESS_TOKEN. Preferred when present.
    #[serde(default, deserialize_with = "lossy_string")]
    pub storefront_access_token: Option<String>,
    /// Set via SHOPIFY_ADMIN_ACCESS_TOKEN.
    #[serde(default, deserialize_with = "lossy_string")]
    pub admin_access_token: Option<String>,
    #[serde(default = "default_shopify_api_version")]
    pub api_version: String,
    /// Display name overriding the shop name. Set via SHOP_NAME.
    #[serde(default)]
    pub shop_name: Option<String>,
}

/// Legacy Ravelry credentials (HTTP Basic).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RavelryConfig {
    /// Set via API_KEY.
    #[serde(default, deserialize_with = "lossy_string")]
    pub username: Option<String>,
    /// Set via API_PASSWORD.
    #[serde(default, deserialize_with = "lossy_string")]
    pub password: Option<String>,
    /// Set via STORE_ID.
    #[serde(default, deserialize_with = "lossy_string")]
    pub store_id: Option<String>,
    /// Set via DESIGNER_ID.
    #[serde(default, deserialize_with = "lossy_string")]
    pub designer_id: Option<String>,
    /// Set via DESIGNER_NAME.
    #[serde(default)]
    pub designer_name: Option<String>,
    #[serde(default = "default_ravelry_base_url")]
    pub base_url: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_cache_ttl_secs() -> u64 {
    7 * 24 * 60 * 60 // 1 week
}

fn default_port() -> u16 {
    3000
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_user_agent() -> String {
    "stockroom/0.1".into()
}

fn default_review_batch_size() -> usize {
    5
}

fn default_review_batch_delay_ms() -> u64 {
    1_000
}

fn default_sync_delay_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

fn default_etsy_base_url() -> String {
    "https://api.etsy.com/v3/application/".into()
}

fn default_shopify_api_version() -> String {
    "2024-10".into()
}

fn default_ravelry_base_url() -> String {
    "https://api.ravelry.com/".into()
}

/// Accept ids and tokens that the env provider parsed as numbers.
fn lossy_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lossy {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(Option::<Lossy>::deserialize(deserializer)?.map(|v| match v {
        Lossy::Text(s) => s,
        Lossy::Signed(n) => n.to_string(),
        Lossy::Unsigned(n) => n.to_string(),
    }))
}

impl Default for EtsyConfig {
    fn default() -> Self {
        Self { api_key: None, access_token: None, shop_id: None, base_url: default_etsy_base_url() }
    }
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            domain: None,
            storefront_access_token: None,
            admin_access_token: None,
            api_version: default_shopify_api_version(),
            shop_name: None,
        }
    }
}

impl Default for RavelryConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            store_id: None,
            designer_id: None,
            designer_name: None,
            base_url: default_ravelry_base_url(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: default_data_dir(),
            cache_ttl_secs: default_cache_ttl_secs(),
            serve_stale_on_error: true,
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            review_batch_size: default_review_batch_size(),
            review_batch_delay_ms: default_review_batch_delay_ms(),
            sync_delay_ms: default_sync_delay_ms(),
            etsy: EtsyConfig::default(),
            shopify: ShopifyConfig::default(),
            ravelry: RavelryConfig::default(),
        }
    }
}

fn raw_env_path(key: &str) -> String {
    RAW_ENV_KEYS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, path)| (*path).to_string())
        .unwrap_or_else(|| key.to_lowercase())
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache freshness window as Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn review_batch_delay(&self) -> Duration {
        Duration::from_millis(self.review_batch_delay_ms)
    }

    pub fn sync_delay(&self) -> Duration {
        Duration::from_millis(self.sync_delay_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `STOCKROOM_`
    /// 2. Storefront credential variables listed in `RAW_ENV_KEYS`
    /// 3. TOML file from `STOCKROOM_CONFIG_FILE` (if set)
    /// 4. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("STOCKROOM_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        let raw_names: Vec<&str> = RAW_ENV_KEYS.iter().map(|(name, _)| *name).collect();
        figment = figment.merge(Env::raw().only(&raw_names).map(|key| raw_env_path(key.as_str()).into()));

        figment.merge(
            Env::prefixed("STOCKROOM_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }
}

fn require<'a>(value: &'a Option<String>, field: &str, env: &str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Missing { field: field.into(), hint: format!("Set {env} environment variable") })
}

impl EtsyConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if ETSY_API_KEY is not set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        require(&self.api_key, "etsy.api_key", "ETSY_API_KEY")
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if ETSY_ACCESS_TOKEN is not set.
    pub fn require_access_token(&self) -> Result<&str, ConfigError> {
        require(&self.access_token, "etsy.access_token", "ETSY_ACCESS_TOKEN (complete the OAuth 2.0 flow first)")
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if ETSY_SHOP_ID is not set.
    pub fn require_shop_id(&self) -> Result<&str, ConfigError> {
        require(&self.shop_id, "etsy.shop_id", "ETSY_SHOP_ID")
    }
}

/// Which Shopify API a token grants access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopifyApi {
    Storefront,
    Admin,
}

impl ShopifyConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if SHOPIFY_DOMAIN is not set.
    pub fn require_domain(&self) -> Result<&str, ConfigError> {
        require(&self.domain, "shopify.domain", "SHOPIFY_DOMAIN")
    }

    /// Pick the API and token to use. The storefront token wins when both are set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if neither token is set.
    pub fn require_token(&self) -> Result<(ShopifyApi, &str), ConfigError> {
        if let Ok(token) = require(&self.storefront_access_token, "", "") {
            return Ok((ShopifyApi::Storefront, token));
        }
        require(
            &self.admin_access_token,
            "shopify.admin_access_token",
            "SHOPIFY_STOREFRONT_ACCESS_TOKEN or SHOPIFY_ADMIN_ACCESS_TOKEN",
        )
        .map(|token| (ShopifyApi::Admin, token))
    }
}

impl RavelryConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if API_KEY or API_PASSWORD is not set.
    pub fn require_basic_auth(&self) -> Result<(&str, &str), ConfigError> {
        let username = require(&self.username, "ravelry.username", "API_KEY")?;
        let password = require(&self.password, "ravelry.password", "API_PASSWORD")?;
        Ok((username, password))
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if STORE_ID is not set.
    pub fn require_store_id(&self) -> Result<&str, ConfigError> {
        require(&self.store_id, "ravelry.store_id", "STORE_ID")
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if DESIGNER_ID is not set.
    pub fn require_designer_id(&self) -> Result<&str, ConfigError> {
        require(&self.designer_id, "ravelry.designer_id", "DESIGNER_ID")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend, BackendKind::Etsy);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.cache_ttl_secs, 604_800);
        assert_eq!(config.port, 3000);
        assert_eq!(config.review_batch_size, 5);
        assert_eq!(config.review_batch_delay(), Duration::from_secs(1));
        assert_eq!(config.sync_delay(), Duration::from_millis(100));
        assert!(config.serve_stale_on_error);
        assert!(config.etsy.api_key.is_none());
        assert_eq!(config.shopify.api_version, "2024-10");
    }

    #[test]
    fn test_cache_ttl_is_one_week() {
        let config = AppConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(60 * 60 * 24 * 7));
    }

    #[test]
    fn test_require_etsy_credentials_missing() {
        let config = AppConfig::default();
        assert!(matches!(config.etsy.require_api_key(), Err(ConfigError::Missing { .. })));
        assert!(matches!(config.etsy.require_access_token(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_require_treats_blank_as_missing() {
        let etsy = EtsyConfig { api_key: Some("   ".into()), ..Default::default() };
        assert!(matches!(etsy.require_api_key(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_shopify_prefers_storefront_token() {
        let shopify = ShopifyConfig {
            storefront_access_token: Some("sf".into()),
            admin_access_token: Some("admin".into()),
            ..Default::default()
        };
        assert_eq!(shopify.require_token().unwrap(), (ShopifyApi::Storefront, "sf"));

        let shopify = ShopifyConfig { admin_access_token: Some("admin".into()), ..Default::default() };
        assert_eq!(shopify.require_token().unwrap(), (ShopifyApi::Admin, "admin"));

        let shopify = ShopifyConfig::default();
        assert!(matches!(shopify.require_token(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_load_from_raw_env_names() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ETSY_API_KEY", "key123");
            jail.set_env("ETSY_SHOP_ID", "4242");
            jail.set_env("API_KEY", "ravelry-user");
            jail.set_env("PORT", "8080");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.etsy.api_key.as_deref(), Some("key123"));
            assert_eq!(config.etsy.shop_id.as_deref(), Some("4242"));
            assert_eq!(config.ravelry.username.as_deref(), Some("ravelry-user"));
            assert_eq!(config.port, 8080);
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_overrides_raw_and_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("stockroom.toml", "backend = \"ravelry\"\nport = 4000\n")?;
            jail.set_env("STOCKROOM_CONFIG_FILE", "stockroom.toml");
            jail.set_env("PORT", "5000");
            jail.set_env("STOCKROOM_PORT", "6000");
            jail.set_env("STOCKROOM_SHOPIFY__API_VERSION", "2025-01");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.backend, BackendKind::Ravelry);
            assert_eq!(config.port, 6000);
            assert_eq!(config.shopify.api_version, "2025-01");
            Ok(())
        });
    }
}
