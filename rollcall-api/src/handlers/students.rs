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

//! Student roster handlers.

use axum::{
    extract::State,
    Extension, Json,
};
use rollcall_core::{Page, Role, Student, StudentFilter};
use rollcall_features::iam::{require_teacher_or_admin, Identity};
use rollcall_features::roster::{CreateStudentRequest, StudentWithAccount, UpdateStudentRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{load_visible_student, MAX_PAGE_LIMIT};
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParams, QueryParams};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StudentListQuery {
    pub class_id: Option<i64>,
    pub has_account: Option<bool>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClassQuery {
    pub class_id: Option<i64>,
}

/// Student record with its overall attendance rate.
#[derive(Debug, Serialize)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: Student,
    pub attendance_rate: f64,
}

/// GET /api/students
///
/// Students are limited to their own class; staff may filter by any class.
pub async fn list_students(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    QueryParams(query): QueryParams<StudentListQuery>,
) -> Result<Json<Vec<StudentWithAccount>>, ApiError> {
    let class_id = match identity.role {
        Role::Student => Some(
            identity
                .class_id
                .ok_or_else(|| ApiError::Forbidden("Insufficient permissions".to_string()))?,
        ),
        Role::Teacher | Role::Admin => query.class_id,
    };

    let filter = StudentFilter {
        class_id,
        has_account: query.has_account,
        page: Some(Page::new(
            query.skip.unwrap_or(0),
            query.limit.unwrap_or(Page::DEFAULT_LIMIT).min(MAX_PAGE_LIMIT),
        )),
    };
    Ok(Json(state.student_service.list(&filter).await?))
}

/// POST /api/students
///
/// Teachers may only enroll students into classes they teach.
pub async fn create_student(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(request): JsonBody<CreateStudentRequest>,
) -> Result<Json<Student>, ApiError> {
    require_teacher_or_admin(&identity)?;

    if identity.role == Role::Teacher
        && !state
            .class_service
            .is_taught_by(request.class_id, identity.user_id)
            .await?
    {
        return Err(ApiError::Forbidden("Access denied to this class".to_string()));
    }

    Ok(Json(state.student_service.create(request).await?))
}

/// GET /api/students/without-account
pub async fn students_without_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    QueryParams(query): QueryParams<ClassQuery>,
) -> Result<Json<Vec<Student>>, ApiError> {
    require_teacher_or_admin(&identity)?;
    Ok(Json(state.student_service.without_account(query.class_id).await?))
}

/// GET /api/students/:id
pub async fn get_student(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(student_id): PathParams<i64>,
) -> Result<Json<StudentDetail>, ApiError> {
    let student = load_visible_student(&state, &identity, student_id).await?;

    let attendance_rate = state
        .attendance_service
        .student_attendance_rate(student_id)
        .await?;
    Ok(Json(StudentDetail {
        student,
        attendance_rate,
    }))
}

/// PUT /api/students/:id
pub async fn update_student(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(student_id): PathParams<i64>,
    JsonBody(request): JsonBody<UpdateStudentRequest>,
) -> Result<Json<Student>, ApiError> {
    require_teacher_or_admin(&identity)?;
    Ok(Json(state.student_service.update(student_id, request).await?))
}

/// DELETE /api/students/:id
pub async fn delete_student(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(student_id): PathParams<i64>,
) -> Result<Json<Value>, ApiError> {
    require_teacher_or_admin(&identity)?;

    state.student_service.delete(student_id).await?;
    Ok(Json(json!({ "message": "Student deleted successfully" })))
}

/// PUT /api/students/:id/link/:user_id
pub async fn link_student_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams((student_id, user_id)): PathParams<(i64, i64)>,
) -> Result<Json<Student>, ApiError> {
    require_teacher_or_admin(&identity)?;
    Ok(Json(state.student_service.link_user(student_id, user_id).await?))
}
