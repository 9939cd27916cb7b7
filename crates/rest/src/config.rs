//! Server configuration for the FHIR REST API.
//!
//! This module provides configuration types for the REST server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SMH_SERVER_PORT` | 3005 | Server port |
//! | `SMH_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `SMH_LOG_LEVEL` | info | Log level |
//! | `SMH_MAX_BODY_SIZE` | 1048576 | Max request body (bytes) |
//! | `SMH_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `SMH_ENABLE_CORS` | true | Enable CORS |
//! | `SMH_CORS_ORIGINS` | * | Allowed origins |
//! | `SMH_CORS_METHODS` | GET,POST,OPTIONS | Allowed methods |
//! | `SMH_CORS_HEADERS` | Content-Type,Authorization,Accept | Allowed headers |
//! | `SMH_BASE_URL` | http://localhost:3005/4_0_0 | Public base URL; its path prefixes every route |
//! | `SMH_DATABASE_URL` | persondb.db | SQLite file, or `:memory:` |
//! | `SMH_DEFAULT_PAGE_SIZE` | 20 | Search page size when `_count` is absent |
//! | `SMH_MAX_PAGE_SIZE` | 100 | Upper bound for `_count` |
//!
//! # Example
//!
//! ```rust
//! use smh_rest::ServerConfig;
//!
//! // Create from environment
//! let config = ServerConfig::from_env();
//!
//! // Or create programmatically
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     ..Default::default()
//! };
//! assert_eq!(config.base_path(), "/4_0_0");
//! ```

use clap::Parser;
use url::Url;

/// Server configuration for the FHIR REST API.
///
/// This struct can be constructed from environment variables using [`ServerConfig::from_env`],
/// from command line arguments using [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "smh-fhir-server")]
#[command(about = "Saint Martin Hospital FHIR server over the person registry")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "SMH_SERVER_PORT", default_value = "3005")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "SMH_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SMH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "SMH_MAX_BODY_SIZE", default_value = "1048576")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "SMH_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "SMH_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "SMH_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(long, env = "SMH_CORS_METHODS", default_value = "GET,POST,OPTIONS")]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "SMH_CORS_HEADERS",
        default_value = "Content-Type,Authorization,Accept"
    )]
    pub cors_headers: String,

    /// Public base URL (used in Location headers and Bundle links).
    #[arg(long, env = "SMH_BASE_URL", default_value = "http://localhost:3005/4_0_0")]
    pub base_url: String,

    /// SQLite database file, or `:memory:`.
    #[arg(long, env = "SMH_DATABASE_URL", default_value = "persondb.db")]
    pub database_url: String,

    /// Default page size for search results.
    #[arg(long, env = "SMH_DEFAULT_PAGE_SIZE", default_value = "20")]
    pub default_page_size: usize,

    /// Maximum page size for search results.
    #[arg(long, env = "SMH_MAX_PAGE_SIZE", default_value = "100")]
    pub max_page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3005,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,OPTIONS".to_string(),
            cors_headers: "Content-Type,Authorization,Accept".to_string(),
            base_url: "http://localhost:3005/4_0_0".to_string(),
            database_url: "persondb.db".to_string(),
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// This is a convenience method that parses environment variables without
    /// requiring command line arguments.
    pub fn from_env() -> Self {
        Self::try_parse_from(["smh-fhir-server"]).unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the base URL without a trailing slash.
    pub fn full_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns the path component of the base URL (`/4_0_0`), or an empty
    /// string when routes live at the root.
    pub fn base_path(&self) -> String {
        Url::parse(&self.base_url)
            .map(|url| url.path().trim_end_matches('/').to_string())
            .unwrap_or_default()
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if let Err(e) = Url::parse(&self.base_url) {
            errors.push(format!("Base URL '{}' is not a valid URL: {}", self.base_url, e));
        }

        if self.database_url.trim().is_empty() {
            errors.push("Database URL cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Routes are served at the root, the database is in memory and pages
    /// are small.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            max_body_size: 1024 * 1024,
            request_timeout: 5, // Shorter timeout for tests
            enable_cors: false,
            cors_origins: "*".to_string(),
            cors_methods: "*".to_string(),
            cors_headers: "*".to_string(),
            base_url: "http://localhost:3005".to_string(),
            database_url: ":memory:".to_string(),
            default_page_size: 10,
            max_page_size: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3005);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.database_url, "persondb.db");
        assert!(config.enable_cors);
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            port: 3000,
            host: "0.0.0.0".to_string(),
            ..Default::default()
        };
        assert_eq!(config.socket_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_base_path() {
        assert_eq!(ServerConfig::default().base_path(), "/4_0_0");
        assert_eq!(ServerConfig::for_testing().base_path(), "");

        let trailing = ServerConfig {
            base_url: "https://fhir.example.org/r4/".to_string(),
            ..Default::default()
        };
        assert_eq!(trailing.base_path(), "/r4");
        assert_eq!(trailing.full_base_url(), "https://fhir.example.org/r4");
    }

    #[test]
    fn test_validate_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().iter().any(|e| e.contains("Port")));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let config = ServerConfig {
            default_page_size: 100,
            max_page_size: 50,
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_for_testing() {
        let config = ServerConfig::for_testing();
        assert_eq!(config.port, 0);
        assert!(!config.enable_cors);
        assert_eq!(config.database_url, ":memory:");
    }
}
