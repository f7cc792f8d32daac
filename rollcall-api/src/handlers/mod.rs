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

//! HTTP request handlers.

pub mod attendance;
pub mod auth;
pub mod classes;
pub mod reports;
pub mod stats;
pub mod students;

use rollcall_core::{Page, Student};
use rollcall_features::iam::{require_class_access, require_teacher_or_admin, Identity};
use rollcall_features::ServiceError;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

const CLASS_ACCESS_DENIED: &str = "Access denied to this class";

/// Largest page a list endpoint will return.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// `skip`/`limit` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl Pagination {
    pub fn page(&self) -> Page {
        Page::new(
            self.skip.unwrap_or(0),
            self.limit.unwrap_or(Page::DEFAULT_LIMIT).min(MAX_PAGE_LIMIT),
        )
    }
}

/// Staff may read any student record; students only those of their own class.
///
/// A non-staff caller asking for an unknown id is refused the same way as for
/// a student of another class.
pub(crate) async fn load_visible_student(
    state: &AppState,
    identity: &Identity,
    student_id: i64,
) -> Result<Student, ApiError> {
    if require_teacher_or_admin(identity).is_ok() {
        return Ok(state.student_service.get(student_id).await?);
    }
    match state.student_service.get(student_id).await {
        Ok(student) => {
            require_class_access(identity, student.class_id)?;
            Ok(student)
        }
        Err(ServiceError::NotFound(_)) => {
            Err(ApiError::Forbidden(CLASS_ACCESS_DENIED.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
