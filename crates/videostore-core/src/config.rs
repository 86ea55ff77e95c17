//! Configuration module
//!
//! Settings are read from the process environment (optionally seeded from a
//! `.env` file) with defaults for everything except the database URL.

use std::env;

// Common constants
const SERVER_PORT: u16 = 8080;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 500;
const STORAGE_PATH: &str = "storage/videos";
const ALLOWED_CONTENT_TYPES: &str = "video/mp4,video/mpeg";

/// Server, database pool and logging settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    /// "pretty" or "json"
    pub log_format: String,
}

/// Video store configuration
#[derive(Clone, Debug)]
pub struct VideoStoreConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub storage_path: String,
    /// Overrides the request `Host` header when building file locations
    pub public_host: Option<String>,
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    /// Accept by filename extension when content sniffing recognizes nothing
    pub extension_fallback: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<VideoStoreConfig>);

impl Config {
    fn as_store(&self) -> &VideoStoreConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.as_store().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = VideoStoreConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_store().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_store().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_store().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_store().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.as_store().base.log_format
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_store().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_store().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.as_store().database_url
    }

    pub fn storage_path(&self) -> &str {
        &self.as_store().storage_path
    }

    pub fn public_host(&self) -> Option<&str> {
        self.as_store().public_host.as_deref()
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.as_store().max_file_size_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.as_store().allowed_content_types
    }

    pub fn extension_fallback(&self) -> bool {
        self.as_store().extension_fallback
    }
}

fn is_production_name(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

/// Split a comma separated list, dropping blanks.
fn parse_list(value: &str, lowercase: bool) -> Vec<String> {
    value
        .split(',')
        .map(|s| {
            if lowercase {
                s.trim().to_lowercase()
            } else {
                s.trim().to_string()
            }
        })
        .filter(|s| !s.is_empty())
        .collect()
}

impl VideoStoreConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins: parse_list(&cors_origins_str, false),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase(),
        };

        let config = VideoStoreConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_path: env::var("STORAGE_PATH").unwrap_or_else(|_| STORAGE_PATH.to_string()),
            public_host: env::var("PUBLIC_HOST").ok().filter(|s| !s.trim().is_empty()),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_content_types: parse_list(
                &env::var("ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| ALLOWED_CONTENT_TYPES.to_string()),
                true,
            ),
            extension_fallback: env::var("EXTENSION_FALLBACK")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.storage_path.trim().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_PATH must not be empty"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES must list at least one content type"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.base.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be greater than 0"));
        }

        if !matches!(self.base.log_format.as_str(), "pretty" | "json") {
            return Err(anyhow::anyhow!("LOG_FORMAT must be 'pretty' or 'json'"));
        }

        Ok(())
    }
}
