/// Configuration management for Post Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Document store configuration
    pub database: DatabaseConfig,
    /// Upstream authentication context
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Number of HTTP worker threads
    pub workers: usize,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongodb,
    Memory,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// MongoDB connection string; unused by the memory backend
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header carrying the authenticated user id set by the gateway
    pub user_id_header: String,
}

// Default values
fn default_port() -> u16 {
    5000
}

fn default_workers() -> usize {
    4
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = env.eq_ignore_ascii_case("production");

        let app = AppConfig {
            host: std::env::var("POST_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("POST_SERVICE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_port),
            workers: std::env::var("HTTP_WORKERS")
                .ok()
                .and_then(|w| w.parse().ok())
                .filter(|w| *w > 0)
                .unwrap_or_else(default_workers),
            env,
        };

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if production => bail!("CORS_ALLOWED_ORIGINS must be set in production"),
                Err(_) => "http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                bail!("CORS_ALLOWED_ORIGINS cannot be '*' in production");
            }

            CorsConfig { allowed_origins }
        };

        let backend = match std::env::var("POST_STORE") {
            Ok(value) => parse_backend(&value)?,
            Err(_) => StoreBackend::Mongodb,
        };

        let database = DatabaseConfig {
            backend,
            uri: match backend {
                StoreBackend::Mongodb => std::env::var("MONGODB_URI")
                    .context("MONGODB_URI environment variable not set")?,
                StoreBackend::Memory => std::env::var("MONGODB_URI").unwrap_or_default(),
            },
            database: std::env::var("MONGODB_DATABASE").unwrap_or_else(|_| "memories".to_string()),
            collection: std::env::var("MONGODB_COLLECTION")
                .unwrap_or_else(|_| "postmessages".to_string()),
        };

        let auth = AuthConfig {
            user_id_header: std::env::var("USER_ID_HEADER")
                .map(|h| h.trim().to_ascii_lowercase())
                .ok()
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| "x-user-id".to_string()),
        };

        Ok(Config {
            app,
            cors,
            database,
            auth,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn parse_backend(value: &str) -> Result<StoreBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "mongodb" | "mongo" => Ok(StoreBackend::Mongodb),
        "memory" => Ok(StoreBackend::Memory),
        other => bail!("Unknown POST_STORE '{}': expected 'mongodb' or 'memory'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "APP_ENV",
        "POST_SERVICE_HOST",
        "POST_SERVICE_PORT",
        "HTTP_WORKERS",
        "CORS_ALLOWED_ORIGINS",
        "POST_STORE",
        "MONGODB_URI",
        "MONGODB_DATABASE",
        "MONGODB_COLLECTION",
        "USER_ID_HEADER",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_env();
        std::env::set_var("MONGODB_URI", "mongodb://localhost:27017");

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.port, 5000);
        assert_eq!(config.app.workers, 4);
        assert_eq!(config.cors.allowed_origins, "http://localhost:3000");
        assert_eq!(config.database.backend, StoreBackend::Mongodb);
        assert_eq!(config.database.database, "memories");
        assert_eq!(config.database.collection, "postmessages");
        assert_eq!(config.auth.user_id_header, "x-user-id");
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_mongodb_requires_uri() {
        clear_env();
        assert!(Config::from_env().is_err());

        std::env::set_var("POST_STORE", "memory");
        let config = Config::from_env().unwrap();
        assert_eq!(config.database.backend, StoreBackend::Memory);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_production_rejects_wildcard_cors() {
        clear_env();
        std::env::set_var("APP_ENV", "production");
        std::env::set_var("POST_STORE", "memory");
        assert!(Config::from_env().is_err());

        std::env::set_var("CORS_ALLOWED_ORIGINS", "*");
        assert!(Config::from_env().is_err());

        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://memories.example");
        assert!(Config::from_env().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("POST_STORE", "memory");
        std::env::set_var("POST_SERVICE_PORT", "8088");
        std::env::set_var("HTTP_WORKERS", "0");
        std::env::set_var("USER_ID_HEADER", " X-Auth-User ");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.port, 8088);
        assert_eq!(config.app.workers, 4);
        assert_eq!(config.auth.user_id_header, "x-auth-user");
        clear_env();
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("MongoDB").unwrap(), StoreBackend::Mongodb);
        assert_eq!(parse_backend("memory").unwrap(), StoreBackend::Memory);
        assert!(parse_backend("postgres").is_err());
    }
}
