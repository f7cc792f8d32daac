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

//! Report handlers.

use axum::{
    extract::State,
    Extension, Json,
};
use rollcall_features::attendance::{MonthlyReport, StudentSummary};
use rollcall_features::iam::{require_teacher_or_admin, Identity};
use serde::Deserialize;

use super::load_visible_student;
use crate::error::ApiError;
use crate::extract::{PathParams, QueryParams};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    pub class_id: i64,
    pub year: i32,
    pub month: u32,
}

/// GET /api/reports/monthly?class_id=&year=&month=
pub async fn monthly_report(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    QueryParams(query): QueryParams<MonthlyQuery>,
) -> Result<Json<MonthlyReport>, ApiError> {
    require_teacher_or_admin(&identity)?;

    let report = state
        .attendance_service
        .monthly_report(query.class_id, query.year, query.month)
        .await?;
    Ok(Json(report))
}

/// GET /api/reports/student/:id/summary
pub async fn student_summary(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(student_id): PathParams<i64>,
) -> Result<Json<StudentSummary>, ApiError> {
    load_visible_student(&state, &identity, student_id).await?;

    Ok(Json(state.attendance_service.student_summary(student_id).await?))
}
