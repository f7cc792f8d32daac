// Copyright 2026 S4Core Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration management for the Rollcall server.
//!
//! Every setting comes from a `ROLLCALL_*` environment variable with a
//! development default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Signing secret used when `ROLLCALL_SECRET_KEY` is unset.
pub const DEV_SECRET_KEY: &str = "rollcall-development-secret-change-me-in-production";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings (bind address, TLS, allowed hosts)
    pub server: ServerConfig,
    /// SQLite database location
    pub database: DatabaseConfig,
    /// Token signing and admin bootstrap
    pub security: SecurityConfig,
    /// Metrics and monitoring configuration
    pub metrics: MetricsConfig,
    /// Log verbosity
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000")
    pub bind: String,
    /// Comma-separated `Host` values accepted; `*` accepts all.
    pub allowed_hosts: String,
    /// TLS configuration for HTTPS support.
    pub tls: TlsConfig,
}

/// TLS/HTTPS configuration.
///
/// TLS is disabled by default. To enable it, set `ROLLCALL_TLS_CERT` and
/// `ROLLCALL_TLS_KEY` to PEM-encoded certificate and private key files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Set when either path is provided
    pub enabled: bool,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

impl TlsConfig {
    /// Returns an error if TLS is enabled but a certificate or key path is missing.
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled {
            if self.cert_path.is_none() {
                return Err("TLS enabled but ROLLCALL_TLS_CERT is not set".to_string());
            }
            if self.key_path.is_none() {
                return Err("TLS enabled but ROLLCALL_TLS_KEY is not set".to_string());
            }
        }
        Ok(())
    }
}

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseLocation {
    /// Private in-memory database, lost on shutdown
    Memory,
    File(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub location: DatabaseLocation,
}

/// Parses `ROLLCALL_DATABASE_URL`.
///
/// Accepts a plain path, `:memory:`, or a `sqlite://` URL where, as in
/// `sqlite:///./rollcall.db` and `sqlite:////var/lib/rollcall.db`, the
/// third slash separates the scheme from the path.
pub fn parse_database_url(url: &str) -> DatabaseLocation {
    let url = url.trim();
    let path = match url.strip_prefix("sqlite://") {
        Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
        None => url,
    };

    if path == ":memory:" {
        DatabaseLocation::Memory
    } else {
        DatabaseLocation::File(PathBuf::from(path))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 signing secret
    pub secret_key: String,
    /// Access token lifetime
    pub token_ttl_minutes: i64,
    /// Admin account created on startup when a password is configured
    pub admin: Option<AdminConfig>,
}

impl SecurityConfig {
    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics
    pub prometheus_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Raises the default log level to debug
    pub debug: bool,
}

impl LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset.
    pub fn default_directives(&self) -> String {
        let level = if self.debug { "debug" } else { "info" };
        ["rollcall_core", "rollcall_features", "rollcall_api", "rollcall_server", "tower_http"]
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cert_path = lookup("ROLLCALL_TLS_CERT").map(PathBuf::from);
        let key_path = lookup("ROLLCALL_TLS_KEY").map(PathBuf::from);

        let location = match lookup("ROLLCALL_DATABASE_URL") {
            Some(url) => parse_database_url(&url),
            // Use temp directory for development
            None => DatabaseLocation::File(
                std::env::temp_dir().join("rollcall-data").join("rollcall.db"),
            ),
        };

        let token_ttl_minutes = match lookup("ROLLCALL_TOKEN_TTL_MINUTES") {
            Some(raw) => {
                let minutes: i64 = raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("ROLLCALL_TOKEN_TTL_MINUTES must be an integer, got {:?}", raw)
                })?;
                if minutes <= 0 {
                    anyhow::bail!("ROLLCALL_TOKEN_TTL_MINUTES must be positive");
                }
                minutes
            }
            None => rollcall_features::iam::DEFAULT_TOKEN_TTL_MINUTES,
        };

        let admin = lookup("ROLLCALL_ADMIN_PASSWORD").map(|password| {
            let username = lookup("ROLLCALL_ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string());
            let email = lookup("ROLLCALL_ADMIN_EMAIL")
                .unwrap_or_else(|| format!("{}@localhost", username));
            AdminConfig {
                username,
                email,
                password,
            }
        });

        Ok(Self {
            server: ServerConfig {
                bind: lookup("ROLLCALL_BIND").unwrap_or_else(|| "127.0.0.1:8000".to_string()),
                allowed_hosts: lookup("ROLLCALL_ALLOWED_HOSTS")
                    .unwrap_or_else(|| "localhost,127.0.0.1".to_string()),
                tls: TlsConfig {
                    enabled: cert_path.is_some() || key_path.is_some(),
                    cert_path,
                    key_path,
                },
            },
            database: DatabaseConfig { location },
            security: SecurityConfig {
                secret_key: lookup("ROLLCALL_SECRET_KEY")
                    .unwrap_or_else(|| DEV_SECRET_KEY.to_string()),
                token_ttl_minutes,
                admin,
            },
            metrics: MetricsConfig {
                prometheus_enabled: lookup("ROLLCALL_METRICS_ENABLED")
                    .map(|s| parse_flag(&s))
                    .unwrap_or(true),
            },
            logging: LoggingConfig {
                debug: lookup("ROLLCALL_DEBUG").map(|s| parse_flag(&s)).unwrap_or(false),
            },
        })
    }
}
