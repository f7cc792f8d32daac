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

//! Bearer token authentication middleware.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rollcall_features::iam::require_active;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

/// Authentication middleware for protected routes.
///
/// Verifies the bearer token, loads the current account and inserts its
/// [`Identity`](rollcall_features::iam::Identity) into request extensions.
/// Deactivated accounts are rejected here with 400 "Inactive user".
pub async fn bearer_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Some(token) => token,
        None => return ApiError::Unauthorized("Not authenticated".to_string()).into_response(),
    };

    let identity = match state.auth_service.authenticate(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!("Token authentication failed: {}", e);
            return ApiError::from(e).into_response();
        }
    };

    if let Err(e) = require_active(&identity) {
        return ApiError::from(e).into_response();
    }

    request.extensions_mut().insert(identity);
    next.run(request).await
}
