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

//! Registration, login and account handlers.

use axum::{
    extract::State,
    Extension, Json,
};
use rollcall_core::Role;
use rollcall_features::iam::{
    require_role, Identity, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest,
    UserResponse,
};
use serde_json::{json, Value};

use super::Pagination;
use crate::error::ApiError;
use crate::extract::{FormBody, JsonBody, PathParams, QueryParams};
use crate::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth_service.register(request).await?;
    Ok(Json(user.into()))
}

/// POST /api/auth/login
/// Body: { "username": "...", "password": "..." }
/// Returns: { "access_token": "...", "token_type": "bearer", "user": {...} }
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    Ok(Json(state.auth_service.login(request).await?))
}

/// POST /api/auth/token
///
/// OAuth2 password flow: same as login, with a form-encoded body.
pub async fn token(
    State(state): State<AppState>,
    FormBody(request): FormBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    Ok(Json(state.auth_service.login(request).await?))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth_service.current_user(&identity).await?;
    Ok(Json(user.into()))
}

/// PUT /api/auth/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(request): JsonBody<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth_service.update_profile(&identity, request).await?;
    Ok(Json(user.into()))
}

/// List all users - requires admin role.
///
/// GET /api/auth/users?skip=&limit=
pub async fn list_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    QueryParams(pagination): QueryParams<Pagination>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require_role(&identity, Role::Admin)?;

    let users = state.auth_service.list_users(pagination.page()).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Deactivate a user - requires admin role.
///
/// PUT /api/auth/users/:id/deactivate
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(user_id): PathParams<i64>,
) -> Result<Json<Value>, ApiError> {
    require_role(&identity, Role::Admin)?;

    state.auth_service.deactivate_user(user_id).await?;
    Ok(Json(json!({ "message": "User deactivated successfully" })))
}
