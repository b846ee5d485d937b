use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::reorder::{
    ReorderParams, DEFAULT_LEAD_TIME_DAYS, DEFAULT_LOOKBACK_DAYS, DEFAULT_SAFETY_DAYS,
};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_STORE_BACKEND: &str = "postgrest";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SALES_TABLE: &str = "sales_lines";
const DEFAULT_INVENTORY_TABLE: &str = "inventory_levels";
const DEFAULT_PRODUCTS_TABLE: &str = "products";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Store backend: "postgrest" or "in-memory"
    #[serde(default = "default_store_backend")]
    #[validate(custom = "validate_store_backend")]
    pub store_backend: String,

    /// Base URL of the PostgREST / Supabase project (without `/rest/v1`)
    #[serde(default)]
    pub store_url: Option<String>,

    /// Service key sent as both `apikey` and bearer token
    #[serde(default)]
    pub store_service_key: Option<String>,

    /// Per-request timeout for store calls
    #[serde(default = "default_store_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub store_timeout_secs: u64,

    /// Append-only ledger table
    #[serde(default = "default_sales_table")]
    #[validate(length(min = 1))]
    pub sales_table: String,

    /// Inventory snapshot table
    #[serde(default = "default_inventory_table")]
    #[validate(length(min = 1))]
    pub inventory_table: String,

    /// Product catalog table
    #[serde(default = "default_products_table")]
    #[validate(length(min = 1))]
    pub products_table: String,

    /// Report default: sales history window
    #[serde(default = "default_lookback_days")]
    #[validate(range(min = 1, max = 3650))]
    pub default_lookback_days: u32,

    /// Report default: supplier lead time
    #[serde(default = "default_lead_time_days")]
    #[validate(range(max = 3650))]
    pub default_lead_time_days: u32,

    /// Report default: safety stock buffer
    #[serde(default = "default_safety_days")]
    #[validate(range(max = 3650))]
    pub default_safety_days: u32,

    /// Maximum webhook body size in bytes (default 2MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// CORS: comma-separated list of allowed origins; permissive when unset
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
}

impl AppConfig {
    /// Creates a configuration with every optional setting at its default
    pub fn new(host: String, port: u16, environment: String) -> Self {
        Self {
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            store_backend: default_store_backend(),
            store_url: None,
            store_service_key: None,
            store_timeout_secs: default_store_timeout_secs(),
            sales_table: default_sales_table(),
            inventory_table: default_inventory_table(),
            products_table: default_products_table(),
            default_lookback_days: default_lookback_days(),
            default_lead_time_days: default_lead_time_days(),
            default_safety_days: default_safety_days(),
            max_body_size: default_max_body_size(),
            cors_allowed_origins: None,
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn uses_in_memory_store(&self) -> bool {
        self.store_backend.eq_ignore_ascii_case("in-memory")
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Report parameters used when a request leaves them out
    pub fn report_defaults(&self) -> ReorderParams {
        ReorderParams::clamped(
            i64::from(self.default_lookback_days),
            i64::from(self.default_lead_time_days),
            i64::from(self.default_safety_days),
        )
    }

    /// Parsed CORS origins, empty entries dropped
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.uses_in_memory_store() {
            match self.store_url.as_deref().map(str::trim) {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                _ => {
                    let mut err = ValidationError::new("store_url_required");
                    err.message = Some(
                        "Set APP__STORE_URL (or SUPABASE_URL) to the http(s) base URL of the store"
                            .into(),
                    );
                    errors.add("store_url", err);
                }
            }

            if self
                .store_service_key
                .as_deref()
                .map_or(true, |key| key.trim().is_empty())
            {
                let mut err = ValidationError::new("store_service_key_required");
                err.message = Some(
                    "Set APP__STORE_SERVICE_KEY (or SUPABASE_SERVICE_ROLE_KEY)".into(),
                );
                errors.add("store_service_key", err);
            }
        }

        if self.is_production() && self.uses_in_memory_store() {
            let mut err = ValidationError::new("in_memory_store_in_production");
            err.message = Some("The in-memory store loses every write on restart".into());
            errors.add("store_backend", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_store_backend() -> String {
    DEFAULT_STORE_BACKEND.to_string()
}

fn default_store_timeout_secs() -> u64 {
    DEFAULT_STORE_TIMEOUT_SECS
}

fn default_sales_table() -> String {
    DEFAULT_SALES_TABLE.to_string()
}

fn default_inventory_table() -> String {
    DEFAULT_INVENTORY_TABLE.to_string()
}

fn default_products_table() -> String {
    DEFAULT_PRODUCTS_TABLE.to_string()
}

fn default_lookback_days() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

fn default_lead_time_days() -> u32 {
    DEFAULT_LEAD_TIME_DAYS
}

fn default_safety_days() -> u32 {
    DEFAULT_SAFETY_DAYS
}

fn default_max_body_size() -> usize {
    2 * 1024 * 1024
}

fn validate_store_backend(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "postgrest" | "in-memory" => Ok(()),
        _ => {
            let mut err = ValidationError::new("store_backend");
            err.message = Some("Must be one of: postgrest, in-memory".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("posabit_reorder={},reorder_cli={},tower_http=debug", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
/// 5. `SUPABASE_URL` / `SUPABASE_SERVICE_ROLE_KEY`, when set
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same as [`load_config`] with the config directory given explicitly
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .set_override_option("store_url", non_empty_env("SUPABASE_URL"))?
        .set_override_option("store_service_key", non_empty_env("SUPABASE_SERVICE_ROLE_KEY"))?
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    validate_config(&app_config)?;

    info!(
        store_backend = %app_config.store_backend,
        "Configuration loaded successfully"
    );
    Ok(app_config)
}

/// Runs the derived and cross-field validation rules
pub fn validate_config(app_config: &AppConfig) -> Result<(), AppConfigError> {
    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration store validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
