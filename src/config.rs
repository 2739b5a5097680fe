//! Configuration types, built from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default database location when `STUDY_TRACKER_DATABASE_URL` is unset.
pub const DEFAULT_DB_PATH: &str = "./data/topics.db";

/// Where the topic store lives.
#[derive(Debug, Clone)]
pub enum DatabaseConfig {
    /// Local SQLite file (created if missing).
    Local(PathBuf),
    /// In-memory database, lost on exit.
    Memory,
    /// Remote libSQL server.
    Remote { url: String, auth_token: SecretString },
}

impl DatabaseConfig {
    /// Pick a backend from a connection string.
    ///
    /// `libsql://`, `http://` and `https://` URLs select a remote server and
    /// need a token; `:memory:` selects an in-memory database; anything else
    /// is a file path.
    pub fn from_url(url: &str, auth_token: Option<String>) -> Result<Self, ConfigError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "STUDY_TRACKER_DATABASE_URL".into(),
                message: "must not be empty".into(),
            });
        }
        if url == ":memory:" {
            return Ok(Self::Memory);
        }
        let is_remote = ["libsql://", "http://", "https://"]
            .iter()
            .any(|scheme| url.starts_with(scheme));
        if is_remote {
            let token = auth_token.ok_or_else(|| ConfigError::MissingRequired {
                key: "STUDY_TRACKER_DATABASE_TOKEN".into(),
                hint: "Remote databases need an auth token.".into(),
            })?;
            return Ok(Self::Remote {
                url: url.to_string(),
                auth_token: SecretString::from(token),
            });
        }
        Ok(Self::Local(PathBuf::from(url.strip_prefix("file:").unwrap_or(url))))
    }

    /// Short label for startup logs (never includes the token).
    pub fn describe(&self) -> String {
        match self {
            Self::Local(path) => path.display().to_string(),
            Self::Memory => ":memory:".to_string(),
            Self::Remote { url, .. } => url.clone(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
}

impl ServerConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (env in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("STUDY_TRACKER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("STUDY_TRACKER_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "STUDY_TRACKER_PORT".into(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => 5000,
        };

        let url = lookup("STUDY_TRACKER_DATABASE_URL").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let database = DatabaseConfig::from_url(&url, lookup("STUDY_TRACKER_DATABASE_TOKEN"))?;

        Ok(Self {
            host,
            port,
            database,
        })
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "STUDY_TRACKER_HOST".into(),
                message: format!("{}: {e}", self.host),
            })
    }
}
