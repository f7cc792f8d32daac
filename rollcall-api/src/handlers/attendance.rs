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

//! Attendance handlers.
//!
//! All routes require a teacher or admin, except a student's own history,
//! which class members may read.

use axum::{
    extract::State,
    Extension, Json,
};
use chrono::NaiveDate;
use rollcall_core::{Attendance, AttendanceFilter, NewAttendance};
use rollcall_features::attendance::{AttendanceUpdate, BulkResult, DailyStats, SheetEntry};
use rollcall_features::iam::{require_teacher_or_admin, Identity};
use serde::Deserialize;
use tracing::debug;

use super::{load_visible_student, Pagination};
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParams, QueryParams};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceQuery {
    pub class_id: Option<i64>,
    pub student_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// GET /api/attendance?class_id=&student_id=&date=&skip=&limit=
pub async fn list_attendance(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    QueryParams(query): QueryParams<AttendanceQuery>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
    require_teacher_or_admin(&identity)?;

    let page = Pagination {
        skip: query.skip,
        limit: query.limit,
    }
    .page();
    let filter = AttendanceFilter {
        class_id: query.class_id,
        student_id: query.student_id,
        date: query.date,
        page: Some(page),
        ..Default::default()
    };
    Ok(Json(state.attendance_service.list_attendance(&filter).await?))
}

/// POST /api/attendance
pub async fn create_attendance(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(record): JsonBody<NewAttendance>,
) -> Result<Json<Attendance>, ApiError> {
    require_teacher_or_admin(&identity)?;
    Ok(Json(state.attendance_service.record_attendance(record).await?))
}

/// POST /api/attendance/bulk
///
/// Always 200; per-entry failures are reported in the body.
pub async fn create_bulk_attendance(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    JsonBody(records): JsonBody<Vec<NewAttendance>>,
) -> Result<Json<BulkResult>, ApiError> {
    require_teacher_or_admin(&identity)?;

    debug!("Bulk attendance submission of {} entries", records.len());
    Ok(Json(state.attendance_service.record_bulk(records).await))
}

/// PUT /api/attendance/:id
pub async fn update_attendance(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(attendance_id): PathParams<i64>,
    JsonBody(update): JsonBody<AttendanceUpdate>,
) -> Result<Json<Attendance>, ApiError> {
    require_teacher_or_admin(&identity)?;
    Ok(Json(
        state
            .attendance_service
            .update_attendance(attendance_id, update)
            .await?,
    ))
}

/// GET /api/attendance/class/:class_id/date/:date
pub async fn class_sheet(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams((class_id, date)): PathParams<(i64, NaiveDate)>,
) -> Result<Json<Vec<SheetEntry>>, ApiError> {
    require_teacher_or_admin(&identity)?;
    Ok(Json(state.attendance_service.class_sheet(class_id, date).await?))
}

/// GET /api/attendance/class/:class_id/date/:date/stats
pub async fn daily_stats(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams((class_id, date)): PathParams<(i64, NaiveDate)>,
) -> Result<Json<DailyStats>, ApiError> {
    require_teacher_or_admin(&identity)?;
    Ok(Json(state.attendance_service.daily_stats(class_id, date).await?))
}

/// GET /api/attendance/student/:id/history?start_date=&end_date=
pub async fn student_history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(student_id): PathParams<i64>,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
    load_visible_student(&state, &identity, student_id).await?;

    Ok(Json(
        state
            .attendance_service
            .student_history(student_id, query.start_date, query.end_date)
            .await?,
    ))
}
