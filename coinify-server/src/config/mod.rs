//! Configuration module for coinify-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{AdminConfig, CheckoutUrls, ServerConfig, SharedConfig};
use coinify_sdk::config::{ApiConfig, SANDBOX_API_BASE};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Longest outbound timeout accepted from the config file.
const MAX_TIMEOUT_SECS: u64 = 120;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("invalid url: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<SocketAddr>,
    pub api_key: Option<String>,
    pub webhook_secret: Option<String>,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub coinify: ApiConfig,
    pub checkout: CheckoutUrls,
}

impl LoadedConfig {
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.server, self.admin, self.coinify, self.checkout)
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    overrides: Overrides,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, overrides: Overrides) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            overrides,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 3. Apply CLI and environment overrides
    /// 4. Validate the result
    ///
    /// Overrides are applied after the rewrite so credentials passed through
    /// the environment never end up on disk.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if !file_config.is_admin_secret_hashed() {
            if file_config.admin.secret.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "admin secret must not be empty".into(),
                ));
            }
            file_config.admin.secret = hash_secret(&file_config.admin.secret)?;
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
        }

        self.apply_overrides(&mut file_config);
        validate(&file_config)?;
        build_loaded_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn apply_overrides(&self, file_config: &mut FileConfig) {
        if let Some(listen) = self.overrides.listen {
            file_config.server.listen = listen;
        }
        if let Some(api_key) = &self.overrides.api_key {
            file_config.coinify.api_key = api_key.clone();
        }
        if let Some(secret) = &self.overrides.webhook_secret {
            file_config.coinify.webhook_secret = secret.clone();
        }
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let coinify = &config.coinify;
    if coinify.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "coinify.api_key is empty and COINIFY_API_KEY is not set".into(),
        ));
    }
    if coinify.webhook_secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "coinify.webhook_secret is empty and COINIFY_WEBHOOK_SECRET is not set".into(),
        ));
    }
    if coinify.timeout_secs == 0 || coinify.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::ValidationError(format!(
            "coinify.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
        )));
    }
    if let Some(base) = &coinify.api_base
        && base.cannot_be_a_base()
    {
        return Err(ConfigError::ValidationError(format!(
            "coinify.api_base {base} cannot be used as a base url"
        )));
    }
    for (name, template) in [
        ("success_url", &config.checkout.success_url),
        ("failure_url", &config.checkout.failure_url),
    ] {
        Url::parse(&template.replace("{order_id}", "0")).map_err(|e| {
            ConfigError::ValidationError(format!("checkout.{name} is not a valid url: {e}"))
        })?;
    }
    Ok(())
}

fn hash_secret(plaintext: &str) -> Result<String, ConfigError> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::HashError(e.to_string()))
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let coinify = file_config.coinify;
    let api_base = match coinify.api_base {
        Some(base) => base,
        None => Url::parse(SANDBOX_API_BASE)?,
    };

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        admin: AdminConfig::new(file_config.admin.secret),
        coinify: ApiConfig::new(
            coinify.api_key,
            api_base,
            coinify.webhook_secret.into_bytes(),
        )
        .with_timeout(Duration::from_secs(coinify.timeout_secs)),
        checkout: CheckoutUrls::new(
            file_config.checkout.success_url,
            file_config.checkout.failure_url,
        ),
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
