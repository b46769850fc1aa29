use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const CONFIG_FILE: &str = "chemstat.toml";
pub const ENV_PREFIX: &str = "CHEMSTAT_";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    /// Base for the `csv_file` links handed to clients
    #[validate(url)]
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[validate(length(min = 1))]
    pub url: String,
    #[validate(range(min = 1, max = 64))]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatasetPolicy {
    /// Number of most recent datasets kept after each upload
    #[validate(range(min = 1))]
    pub retention_limit: i64,
    #[validate(range(min = 1))]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    pub delimiter: char,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub datasets: DatasetPolicy,
    pub parser: ParserConfig,
    /// `tracing_subscriber::EnvFilter` directives, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            public_base_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://chemstat.db".to_string(),
            max_connections: 4,
        }
    }
}

impl Default for DatasetPolicy {
    fn default() -> Self {
        Self {
            retention_limit: 5,
            max_upload_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            datasets: DatasetPolicy::default(),
            parser: ParserConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `chemstat.toml`, then `CHEMSTAT_*` environment
    /// variables (`__` separates nested keys, e.g. `CHEMSTAT_SERVER__PORT`).
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.datasets.validate()?;
        self.parser.delimiter_byte()?;
        Ok(())
    }
}

impl ParserConfig {
    /// Delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter {
            '"' | '\n' | '\r' => Err(AppError::ValidationError(format!(
                "{:?} cannot be used as a CSV delimiter",
                self.delimiter
            ))),
            c if c.is_ascii() => Ok(c as u8),
            c => Err(AppError::ValidationError(format!(
                "CSV delimiter must be a single ASCII character, got {:?}",
                c
            ))),
        }
    }
}
