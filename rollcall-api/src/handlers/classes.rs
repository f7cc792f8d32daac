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

//! Class handlers, mounted at `/api/classes` and `/api/stages`.

use axum::{
    extract::State,
    Extension, Json,
};
use rollcall_features::iam::{require_teacher_or_admin, Identity};
use rollcall_features::roster::{ClassWithCount, CreateClassRequest, UpdateClassRequest};
use serde_json::{json, Value};

use super::Pagination;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParams, QueryParams};
use crate::AppState;

pub async fn list_classes(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<Pagination>,
) -> Result<Json<Vec<ClassWithCount>>, ApiError> {
    Ok(Json(state.class_service.list(pagination.page()).await?))
}

pub async fn create_class(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(request): JsonBody<CreateClassRequest>,
) -> Result<Json<ClassWithCount>, ApiError> {
    require_teacher_or_admin(&identity)?;

    let class = state.class_service.create(request).await?;
    Ok(Json(ClassWithCount {
        class,
        student_count: 0,
    }))
}

pub async fn get_class(
    State(state): State<AppState>,
    PathParams(class_id): PathParams<i64>,
) -> Result<Json<ClassWithCount>, ApiError> {
    Ok(Json(state.class_service.get(class_id).await?))
}

pub async fn update_class(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(class_id): PathParams<i64>,
    JsonBody(request): JsonBody<UpdateClassRequest>,
) -> Result<Json<ClassWithCount>, ApiError> {
    require_teacher_or_admin(&identity)?;
    Ok(Json(state.class_service.update(class_id, request).await?))
}

/// Deletes the class together with its students and attendance.
pub async fn delete_class(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(class_id): PathParams<i64>,
) -> Result<Json<Value>, ApiError> {
    require_teacher_or_admin(&identity)?;

    state.class_service.delete(class_id).await?;
    Ok(Json(json!({ "message": "Class deleted successfully" })))
}
