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

//! Student roster management.

use std::sync::Arc;

use rollcall_core::{NewStudent, Repository, Student, StudentFilter};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::error::ServiceError;
use crate::iam::models::UserResponse;

const EMAIL_TAKEN: &str = "A student with this email already exists";
const ACCOUNT_LINKED: &str = "This user account is already linked to another student";

const STUDENT_UNIQUE_COLUMNS: &[(&str, &str)] = &[
    ("students.email", EMAIL_TAKEN),
    ("students.user_id", ACCOUNT_LINKED),
];

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    #[validate(email(message = "Invalid email address"))]
    #[serde(default)]
    pub email: Option<String>,

    pub class_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub class_id: Option<i64>,
}

/// Student with its linked account, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentWithAccount {
    #[serde(flatten)]
    pub student: Student,
    pub has_user_account: bool,
    pub user: Option<UserResponse>,
}

#[derive(Clone)]
pub struct StudentService {
    repo: Arc<dyn Repository>,
}

impl StudentService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Create a student.
    ///
    /// A user account with the same email, not yet linked to a student, is
    /// linked automatically.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed fields
    /// - `NotFound` when the class does not exist
    /// - `Duplicate` when the email is taken by another student
    pub async fn create(&self, request: CreateStudentRequest) -> Result<Student, ServiceError> {
        request.validate()?;
        self.require_class(request.class_id).await?;

        let mut user_id = None;
        if let Some(email) = &request.email {
            if self.repo.get_student_by_email(email).await?.is_some() {
                return Err(ServiceError::Duplicate(EMAIL_TAKEN.to_string()));
            }
            if let Some(user) = self.repo.get_user_by_email(email).await? {
                if self.repo.get_student_by_user(user.id).await?.is_none() {
                    user_id = Some(user.id);
                }
            }
        }

        let student = self
            .repo
            .insert_student(NewStudent {
                first_name: request.first_name,
                last_name: request.last_name,
                email: request.email,
                class_id: request.class_id,
                user_id,
            })
            .await
            .map_err(|e| ServiceError::from_unique(e, STUDENT_UNIQUE_COLUMNS))?;

        info!(
            "Created student #{} in class #{}{}",
            student.id,
            student.class_id,
            if student.user_id.is_some() { " (linked to existing account)" } else { "" }
        );
        Ok(student)
    }

    pub async fn get(&self, student_id: i64) -> Result<Student, ServiceError> {
        self.repo
            .get_student(student_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Student not found".to_string()))
    }

    /// List students with their linked accounts; filtering happens in storage.
    pub async fn list(
        &self,
        filter: &StudentFilter,
    ) -> Result<Vec<StudentWithAccount>, ServiceError> {
        let students = self.repo.list_students(filter).await?;

        let mut out = Vec::with_capacity(students.len());
        for student in students {
            let user = match student.user_id {
                Some(user_id) => self.repo.get_user(user_id).await?.map(UserResponse::from),
                None => None,
            };
            out.push(StudentWithAccount {
                has_user_account: student.user_id.is_some(),
                user,
                student,
            });
        }
        Ok(out)
    }

    /// Students without a linked user account, optionally within one class.
    pub async fn without_account(
        &self,
        class_id: Option<i64>,
    ) -> Result<Vec<Student>, ServiceError> {
        Ok(self
            .repo
            .list_students(&StudentFilter {
                class_id,
                has_account: Some(false),
                page: None,
            })
            .await?)
    }

    pub async fn update(
        &self,
        student_id: i64,
        request: UpdateStudentRequest,
    ) -> Result<Student, ServiceError> {
        request.validate()?;
        let mut student = self.get(student_id).await?;

        if let Some(class_id) = request.class_id {
            self.require_class(class_id).await?;
            student.class_id = class_id;
        }
        if let Some(email) = request.email {
            if let Some(other) = self.repo.get_student_by_email(&email).await? {
                if other.id != student.id {
                    return Err(ServiceError::Duplicate(EMAIL_TAKEN.to_string()));
                }
            }
            student.email = Some(email);
        }
        if let Some(first_name) = request.first_name {
            student.first_name = first_name;
        }
        if let Some(last_name) = request.last_name {
            student.last_name = last_name;
        }

        self.repo
            .update_student(&student)
            .await
            .map_err(|e| ServiceError::from_unique(e, STUDENT_UNIQUE_COLUMNS))
    }

    /// Delete a student and its attendance records.
    pub async fn delete(&self, student_id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete_student(student_id).await? {
            return Err(ServiceError::NotFound("Student not found".to_string()));
        }
        info!("Deleted student #{}", student_id);
        Ok(())
    }

    /// Link a student to a user account (one-to-one).
    pub async fn link_user(&self, student_id: i64, user_id: i64) -> Result<Student, ServiceError> {
        let mut student = self.get(student_id).await?;
        if self.repo.get_user(user_id).await?.is_none() {
            return Err(ServiceError::NotFound("User not found".to_string()));
        }
        if let Some(linked) = self.repo.get_student_by_user(user_id).await? {
            if linked.id != student.id {
                return Err(ServiceError::Duplicate(ACCOUNT_LINKED.to_string()));
            }
        }

        student.user_id = Some(user_id);
        let student = self
            .repo
            .update_student(&student)
            .await
            .map_err(|e| ServiceError::from_unique(e, STUDENT_UNIQUE_COLUMNS))?;

        info!("Linked student #{} to user #{}", student.id, user_id);
        Ok(student)
    }

    async fn require_class(&self, class_id: i64) -> Result<(), ServiceError> {
        match self.repo.get_class(class_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound("Class not found".to_string())),
        }
    }
}
