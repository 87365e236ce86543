//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ML_CLIENT_ID` - Marketplace application client ID
//! - `ML_CLIENT_SECRET` - Marketplace application client secret
//! - `ML_SELLER_ID` - Seller user ID whose data is aggregated
//!
//! ## Optional
//! - `ML_API_BASE_URL` - API base URL (default: <https://api.mercadolibre.com>)
//! - `ML_UTC_OFFSET_HOURS` - Seller's UTC offset for query windows (default: -3)
//! - `PULSE_HOST` - Bind address (default: 127.0.0.1)
//! - `PULSE_PORT` - Listen port (default: 3002)
//! - `PULSE_REQUEST_TIMEOUT_SECS` - Per-call HTTP timeout (default: 30)
//! - `PULSE_DEADLINE_SECS` - Deadline for one metrics computation (default: 120)
//! - `PULSE_ACCOUNTING_RULE` - `computed`, `payment` or `order_total` (default: payment)
//! - `PULSE_SALES_COUNT_BASIS` - `packs` or `orders` (default: packs)
//! - `PULSE_ORDER_STATUS` - Order status filter (default: paid)
//! - `PULSE_PAGE_SIZE` - Page size for paginated endpoints, 1-50 (default: 50)
//! - `PULSE_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use meli_pulse_core::{AccountingRule, OrderStatus, SalesCountBasis};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "https://api.mercadolibre.com";

/// Largest page the marketplace search endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Marketplace API configuration
    pub marketplace: MarketplaceConfig,
    /// Metrics engine settings
    pub engine: EngineSettings,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Marketplace API configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct MarketplaceConfig {
    /// API base URL
    pub base_url: Url,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Seller user ID
    pub seller_id: String,
    /// Seller's UTC offset, used to express query windows
    pub utc_offset: FixedOffset,
    /// Timeout for each HTTP call
    pub request_timeout: Duration,
}

impl std::fmt::Debug for MarketplaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("seller_id", &self.seller_id)
            .field("utc_offset", &self.utc_offset)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Metrics engine settings.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Page size for paginated endpoints
    pub page_size: u32,
    /// Default revenue accounting rule
    pub accounting_rule: AccountingRule,
    /// What `total_sales` counts
    pub sales_count_basis: SalesCountBasis,
    /// Order status filter for order listings
    pub order_status: OrderStatus,
    /// Deadline for one metrics computation
    pub deadline: Duration,
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Source(&lookup);

        let host = env.parsed_or("PULSE_HOST", "127.0.0.1".parse::<IpAddr>())?;
        let port = env.parsed_or("PULSE_PORT", Ok::<u16, ConfigError>(3002))?;

        Ok(Self {
            host,
            port,
            marketplace: MarketplaceConfig::from_source(&env)?,
            engine: EngineSettings::from_source(&env)?,
            log_json: env.optional("PULSE_LOG_JSON").is_some(),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MarketplaceConfig {
    fn from_source(env: &Source<'_>) -> Result<Self, ConfigError> {
        let base_url = env
            .optional("ML_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ML_API_BASE_URL".to_string(), e.to_string()))?;

        let offset_hours: i32 = env.parsed_or("ML_UTC_OFFSET_HOURS", Ok::<i32, ConfigError>(-3))?;
        let utc_offset = offset_from_hours(offset_hours).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "ML_UTC_OFFSET_HOURS".to_string(),
                format!("{offset_hours} is outside -23..=23"),
            )
        })?;

        let timeout_secs: u64 =
            env.parsed_or("PULSE_REQUEST_TIMEOUT_SECS", Ok::<u64, ConfigError>(30))?;

        let client_secret = env.required("ML_CLIENT_SECRET")?;
        validate_not_placeholder(&client_secret, "ML_CLIENT_SECRET")?;

        Ok(Self {
            base_url,
            client_id: env.required("ML_CLIENT_ID")?,
            client_secret: SecretString::from(client_secret),
            seller_id: env.required("ML_SELLER_ID")?,
            utc_offset,
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }
}

impl EngineSettings {
    fn from_source(env: &Source<'_>) -> Result<Self, ConfigError> {
        let page_size: u32 =
            env.parsed_or("PULSE_PAGE_SIZE", Ok::<u32, ConfigError>(MAX_PAGE_SIZE))?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidEnvVar(
                "PULSE_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        let deadline_secs: u64 = env.parsed_or("PULSE_DEADLINE_SECS", Ok::<u64, ConfigError>(120))?;

        Ok(Self {
            page_size,
            accounting_rule: env
                .parsed_or("PULSE_ACCOUNTING_RULE", Ok::<_, ConfigError>(AccountingRule::default()))?,
            sales_count_basis: env.parsed_or(
                "PULSE_SALES_COUNT_BASIS",
                Ok::<_, ConfigError>(SalesCountBasis::default()),
            )?,
            order_status: env.parsed_or("PULSE_ORDER_STATUS", Ok::<_, ConfigError>(OrderStatus::Paid))?,
            deadline: Duration::from_secs(deadline_secs.max(1)),
        })
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            accounting_rule: AccountingRule::default(),
            sales_count_basis: SalesCountBasis::default(),
            order_status: OrderStatus::Paid,
            deadline: Duration::from_secs(120),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Key lookup used while loading configuration.
struct Source<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Source<'_> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, or fall back to the given default when unset.
    fn parsed_or<T, E>(&self, key: &str, default: Result<T, E>) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
        E: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
            None => default.map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        }
    }
}

/// Build a fixed offset from whole hours east of UTC.
fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
    if !(-23..=23).contains(&hours) {
        return None;
    }
    FixedOffset::east_opt(hours * 3600)
}

/// Reject values that look like template placeholders.
fn validate_not_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("looks like a placeholder (contains '{pattern}')"),
        ));
    }
    Ok(())
}

impl MarketplaceConfig {
    /// Expose the client secret for the token request.
    pub(crate) fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<DashboardConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DashboardConfig::from_source(|key| map.get(key).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("ML_CLIENT_ID", "1234567890"),
        ("ML_CLIENT_SECRET", "aB3xY9mK2nL5pQ7rT0uW4zC6"),
        ("ML_SELLER_ID", "98765"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(REQUIRED).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3002");
        assert_eq!(config.marketplace.base_url.as_str(), "https://api.mercadolibre.com/");
        assert_eq!(config.marketplace.utc_offset, FixedOffset::west_opt(3 * 3600).unwrap());
        assert_eq!(config.marketplace.request_timeout, Duration::from_secs(30));
        assert_eq!(config.engine.page_size, 50);
        assert_eq!(config.engine.accounting_rule, AccountingRule::Payment);
        assert_eq!(config.engine.sales_count_basis, SalesCountBasis::Packs);
        assert_eq!(config.engine.order_status, OrderStatus::Paid);
        assert!(!config.log_json);
    }

    #[test]
    fn test_missing_required_var() {
        let result = load(&[("ML_CLIENT_ID", "1"), ("ML_SELLER_ID", "2")]);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(key)) if key == "ML_CLIENT_SECRET"));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("PULSE_ACCOUNTING_RULE", "order_total"),
            ("PULSE_SALES_COUNT_BASIS", "orders"),
            ("PULSE_PAGE_SIZE", "20"),
            ("ML_UTC_OFFSET_HOURS", "-5"),
            ("PULSE_PORT", "8080"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.engine.accounting_rule, AccountingRule::OrderTotal);
        assert_eq!(config.engine.sales_count_basis, SalesCountBasis::Orders);
        assert_eq!(config.engine.page_size, 20);
        assert_eq!(config.marketplace.utc_offset, FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PULSE_ACCOUNTING_RULE", "gross"));
        assert!(matches!(load(&vars), Err(ConfigError::InvalidEnvVar(_, _))));

        let mut vars = REQUIRED.to_vec();
        vars.push(("PULSE_PAGE_SIZE", "500"));
        assert!(matches!(load(&vars), Err(ConfigError::InvalidEnvVar(_, _))));

        let mut vars = REQUIRED.to_vec();
        vars.push(("ML_UTC_OFFSET_HOURS", "30"));
        assert!(matches!(load(&vars), Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_placeholder_secret_is_rejected() {
        let result = load(&[
            ("ML_CLIENT_ID", "1"),
            ("ML_CLIENT_SECRET", "your-client-secret"),
            ("ML_SELLER_ID", "2"),
        ]);
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_marketplace_config_debug_redacts_secrets() {
        let config = load(REQUIRED).unwrap();
        let debug_output = format!("{:?}", config.marketplace);

        assert!(debug_output.contains("1234567890"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("aB3xY9mK2nL5pQ7rT0uW4zC6"));
    }
}
