//! Configuration for the dashboard API
//!
//! CLI arguments and environment variable handling using clap. A `.env`
//! file, when present, is loaded before parsing.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

use crate::types::ApiError;

/// Naradai - dashboard content API
#[derive(Parser, Debug, Clone)]
#[command(name = "naradai")]
#[command(about = "REST API serving dashboard insights from MongoDB")]
pub struct Args {
    /// IP address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DATABASE", default_value = "naradai")]
    pub mongodb_database: String,

    /// Storage backend
    #[arg(long = "storage", env = "STORAGE_BACKEND", value_enum, default_value = "mongo")]
    pub storage: StorageBackend,

    /// Enable development mode (falls back to the memory store when
    /// MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// CORS configuration
    #[command(flatten)]
    pub cors: CorsArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Seconds to wait for in-flight requests on shutdown
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value = "5")]
    pub shutdown_grace_secs: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mongo => "mongo",
            Self::Memory => "memory",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Cross-origin policy
#[derive(Parser, Debug, Clone)]
pub struct CorsArgs {
    /// Allowed origins; `*` allows any
    #[arg(
        long = "cors-allowed-origins",
        env = "CORS_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000,http://localhost:5173,https://staging.teoremaintelligence.com,https://teoremaintelligence.com,http://127.0.0.1:8000,http://127.0.0.1:8080,https://api.staging.teoremaintelligence.com"
    )]
    pub allowed_origins: Vec<String>,

    #[arg(
        long = "cors-allowed-methods",
        env = "CORS_ALLOWED_METHODS",
        value_delimiter = ',',
        default_value = "GET,POST,PUT,PATCH,DELETE,OPTIONS"
    )]
    pub allowed_methods: Vec<String>,

    #[arg(
        long = "cors-allowed-headers",
        env = "CORS_ALLOWED_HEADERS",
        value_delimiter = ',',
        default_value = "Content-Type,Authorization"
    )]
    pub allowed_headers: Vec<String>,
}

impl Args {
    /// Socket address built from `host` and `port`
    pub fn listen_addr(&self) -> Result<SocketAddr, ApiError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ApiError::Config(format!("invalid listen address {}:{}: {}", self.host, self.port, e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.cors.origins().next().is_none() {
            return Err("CORS_ALLOWED_ORIGINS must list at least one origin".to_string());
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        self.listen_addr().map_err(|e| e.to_string())?;

        Ok(())
    }
}

impl CorsArgs {
    /// Configured origins with blanks removed
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
    }
}
