//! Server configuration

use std::path::PathBuf;
use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which storage engine backs the order workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL via sqlx
    Postgres,
    /// Single-file redb database under `data_dir`
    Embedded,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "embedded" | "redb" => Ok(Self::Embedded),
            other => Err(format!("unknown STORAGE_BACKEND: {other}")),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// HTTP listen port
    pub http_port: u16,
    pub storage_backend: StorageBackend,
    /// PostgreSQL connection URL (required for the postgres backend)
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Directory holding the embedded database file
    pub data_dir: PathBuf,
    /// HS256 secret for user tokens
    pub jwt_secret: String,
    /// Budget for one payment transaction
    pub pay_timeout_ms: u64,
    /// Enables daily rolling file logs when set
    pub log_dir: Option<PathBuf>,
    /// JSON array of books upserted at startup
    pub books_seed_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let environment = var("ENVIRONMENT").unwrap_or_else(|| "development".into());

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(v) => v.parse::<StorageBackend>()?,
            None => StorageBackend::Postgres,
        };
        let database_url = var("DATABASE_URL");
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set for the postgres backend".into());
        }

        Ok(Self {
            http_port: parse_or(var("HTTP_PORT"), "HTTP_PORT", 8080)?,
            storage_backend,
            database_url,
            database_max_connections: parse_or(
                var("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                10,
            )?,
            data_dir: var("DATA_DIR").unwrap_or_else(|| "data".into()).into(),
            jwt_secret: require_secret(lookup("JWT_SECRET"), "JWT_SECRET", &environment)?,
            pay_timeout_ms: parse_or(var("PAY_TIMEOUT_MS"), "PAY_TIMEOUT_MS", 5000)?,
            log_dir: var("LOG_DIR").map(PathBuf::from),
            books_seed_file: var("BOOKS_SEED_FILE").map(PathBuf::from),
            environment,
        })
    }

    pub fn pay_timeout(&self) -> Duration {
        Duration::from_millis(self.pay_timeout_ms)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Require a secret: must be set and non-empty outside development.
fn require_secret(value: Option<String>, name: &str, environment: &str) -> Result<String, BoxError> {
    let val = match value {
        Some(v) => v,
        None => {
            if environment != "development" {
                return Err(format!("{name} must be set in {environment} environment").into());
            }
            format!("dev-{name}-not-for-production")
        }
    };
    if val.is_empty() && environment != "development" {
        return Err(format!("{name} must not be empty in {environment} environment").into());
    }
    Ok(val)
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, name: &str, default: T) -> Result<T, BoxError> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| format!("{name} has an invalid value: {v}").into()),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, BoxError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_embedded_defaults() {
        let config = load(&[("STORAGE_BACKEND", "embedded")]).unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.storage_backend, StorageBackend::Embedded);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.pay_timeout(), Duration::from_millis(5000));
        assert_eq!(config.jwt_secret, "dev-JWT_SECRET-not-for-production");
        assert!(config.log_dir.is_none());
        assert!(config.books_seed_file.is_none());
    }

    #[test]
    fn test_postgres_requires_url() {
        assert!(load(&[]).is_err());

        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/bookstore"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Postgres);
        assert_eq!(config.database_max_connections, 4);
    }

    #[test]
    fn test_secret_required_outside_development() {
        let vars = [("STORAGE_BACKEND", "embedded"), ("ENVIRONMENT", "production")];
        assert!(load(&vars).is_err());

        let config = load(&[
            ("STORAGE_BACKEND", "embedded"),
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
        assert!(!config.is_development());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("STORAGE_BACKEND", "sqlite")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "embedded"), ("HTTP_PORT", "http")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "embedded"), ("PAY_TIMEOUT_MS", "-1")]).is_err());
    }
}
