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

//! Application initialization and runtime.
//!
//! This module handles:
//! - Repository initialization
//! - Admin bootstrap
//! - HTTP/HTTPS server setup and graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::ServiceExt;
use rollcall_api::{create_router, AllowedHosts, AppState};
use rollcall_core::{Repository, SqliteRepository};
use rollcall_features::JwtManager;
use tokio::net::TcpListener;
use tower_http::normalize_path::NormalizePath;
use tracing::{error, info, warn};

use crate::config::{Config, DatabaseLocation};

/// Main application.
pub struct App {
    config: Config,
    repo: Arc<dyn Repository>,
}

impl App {
    /// Creates a new application instance, opening the database.
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing Rollcall application...");

        let repo = match &config.database.location {
            DatabaseLocation::Memory => {
                warn!("Using an in-memory database; data is lost on shutdown");
                SqliteRepository::open_in_memory().context("Failed to open in-memory database")?
            }
            DatabaseLocation::File(path) => {
                info!("Database path: {:?}", path);
                SqliteRepository::open(path)
                    .with_context(|| format!("Failed to open database at {:?}", path))?
            }
        };

        info!("Repository initialized successfully");
        Ok(Self {
            config,
            repo: Arc::new(repo),
        })
    }

    /// Builds the shared state and bootstraps the admin account if configured.
    ///
    /// The Prometheus recorder is installed separately by [`App::run`].
    pub async fn build_state(&self) -> Result<AppState> {
        let security = &self.config.security;
        if security.uses_dev_secret() {
            warn!("ROLLCALL_SECRET_KEY not set; using the development signing secret");
        }

        let jwt_manager = JwtManager::new(
            &security.secret_key,
            chrono::Duration::minutes(security.token_ttl_minutes),
        );
        let allowed_hosts = AllowedHosts::parse(&self.config.server.allowed_hosts);
        let state = AppState::new(self.repo.clone(), jwt_manager).with_allowed_hosts(allowed_hosts);

        initialize_admin_user(&state, &self.config).await?;
        Ok(state)
    }

    /// Runs the application (HTTP/HTTPS server).
    ///
    /// If TLS is configured via `ROLLCALL_TLS_CERT` and `ROLLCALL_TLS_KEY`,
    /// the server uses HTTPS. Otherwise, it runs as HTTP.
    pub async fn run(self) -> Result<()> {
        self.config
            .server
            .tls
            .validate()
            .map_err(|e| anyhow::anyhow!("TLS configuration error: {}", e))?;

        let addr: SocketAddr = self
            .config
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address {:?}", self.config.server.bind))?;

        let tls_config = if self.config.server.tls.enabled {
            Some(self.load_tls_config().await?)
        } else {
            None
        };

        let mut state = self.build_state().await?;

        if self.config.metrics.prometheus_enabled {
            use metrics_exporter_prometheus::PrometheusBuilder;
            match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => {
                    info!("Prometheus metrics enabled (available at /metrics)");
                    state = state.with_prometheus_handle(handle);
                }
                Err(e) => {
                    warn!("Failed to install Prometheus recorder: {}. Metrics disabled.", e);
                }
            }
        } else {
            info!("Prometheus metrics disabled");
        }

        let router = create_router(state);

        if let Some(rustls_config) = tls_config {
            info!("Listening on https://{}", addr);
            run_https_server(addr, router, rustls_config).await
        } else {
            info!("Listening on http://{}", addr);
            run_http_server(addr, router).await
        }
    }

    /// Loads TLS configuration from certificate and key files.
    async fn load_tls_config(&self) -> Result<axum_server::tls_rustls::RustlsConfig> {
        use axum_server::tls_rustls::RustlsConfig;

        let tls_config = &self.config.server.tls;
        let cert_path = tls_config
            .cert_path
            .as_ref()
            .context("TLS certificate path not configured")?;
        let key_path = tls_config
            .key_path
            .as_ref()
            .context("TLS private key path not configured")?;

        info!("Loading TLS certificate from {:?}", cert_path);
        let rustls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .context("Failed to load TLS certificate and key")?;

        info!("TLS configured successfully");
        Ok(rustls_config)
    }
}

/// Runs the HTTP server (without TLS).
async fn run_http_server(addr: SocketAddr, router: axum::Router) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Clients may send `/api/students/`; routes are registered without the slash
    let app = NormalizePath::trim_trailing_slash(router);

    axum::serve(
        listener,
        ServiceExt::<axum::http::Request<axum::body::Body>>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Runs the HTTPS server (with TLS).
async fn run_https_server(
    addr: SocketAddr,
    router: axum::Router,
    rustls_config: axum_server::tls_rustls::RustlsConfig,
) -> Result<()> {
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
    });

    let app = NormalizePath::trim_trailing_slash(router);

    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(ServiceExt::<axum::http::Request<axum::body::Body>>::into_make_service(app))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handles graceful shutdown signals.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown...");
        }
    }
}

/// Creates the admin account from `ROLLCALL_ADMIN_*` if it does not exist.
async fn initialize_admin_user(state: &AppState, config: &Config) -> Result<()> {
    let Some(admin) = &config.security.admin else {
        info!("Admin bootstrap skipped (ROLLCALL_ADMIN_PASSWORD not set)");
        return Ok(());
    };

    let created = state
        .auth_service
        .ensure_admin(&admin.username, &admin.email, &admin.password)
        .await
        .with_context(|| format!("Failed to create admin user '{}'", admin.username))?;

    if created {
        info!("Admin user '{}' created", admin.username);
    } else {
        info!("Admin user '{}' already exists", admin.username);
    }
    Ok(())
}
