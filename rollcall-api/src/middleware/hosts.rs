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

//! Host header allow-list.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Hosts the server answers for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedHosts {
    Any,
    /// Lower-case host names, without ports
    List(Vec<String>),
}

impl AllowedHosts {
    /// Parses a comma-separated list; a `*` entry allows every host.
    pub fn parse(list: &str) -> Self {
        let hosts: Vec<String> = list
            .split(',')
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        if hosts.iter().any(|h| h == "*") {
            AllowedHosts::Any
        } else {
            AllowedHosts::List(hosts)
        }
    }

    /// Whether a `Host` header value (with or without port) is allowed.
    pub fn allows(&self, host: &str) -> bool {
        match self {
            AllowedHosts::Any => true,
            AllowedHosts::List(hosts) => {
                let name = strip_port(host).to_ascii_lowercase();
                hosts.iter().any(|h| *h == name)
            }
        }
    }
}

impl Default for AllowedHosts {
    fn default() -> Self {
        AllowedHosts::Any
    }
}

fn strip_port(host: &str) -> &str {
    let host = host.trim();
    if host.starts_with('[') {
        // [::1]:8000
        return match host.find(']') {
            Some(end) => &host[1..end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Rejects requests whose `Host` header is not allowed with 400.
pub async fn allowed_hosts_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let AllowedHosts::List(_) = state.allowed_hosts.as_ref() {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| request.uri().host());

        match host {
            Some(host) if state.allowed_hosts.allows(host) => {}
            other => {
                warn!("Rejected request for disallowed host {:?}", other);
                return ApiError::Validation("Invalid host header".to_string()).into_response();
            }
        }
    }

    next.run(request).await
}
