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

//! Class management.

use std::sync::Arc;

use rollcall_core::{Class, NewClass, Page, Repository, Role};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::error::ServiceError;

const NAME_TAKEN: &str = "A class with this name already exists";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClassRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 20))]
    pub grade: String,

    /// Must reference a teacher account
    #[serde(default)]
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateClassRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 20))]
    pub grade: Option<String>,

    pub teacher_id: Option<i64>,
}

/// Class with its current roster size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassWithCount {
    #[serde(flatten)]
    pub class: Class,
    pub student_count: u64,
}

#[derive(Clone)]
pub struct ClassService {
    repo: Arc<dyn Repository>,
}

impl ClassService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Create a class.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed fields or a non-teacher `teacher_id`
    /// - `Duplicate` when the name is taken
    pub async fn create(&self, request: CreateClassRequest) -> Result<Class, ServiceError> {
        request.validate()?;
        if let Some(teacher_id) = request.teacher_id {
            self.require_teacher(teacher_id).await?;
        }

        let class = self
            .repo
            .insert_class(NewClass {
                name: request.name,
                grade: request.grade,
                teacher_id: request.teacher_id,
            })
            .await
            .map_err(|e| ServiceError::from_unique(e, &[("classes.name", NAME_TAKEN)]))?;

        info!("Created class {} (#{})", class.name, class.id);
        Ok(class)
    }

    pub async fn get(&self, class_id: i64) -> Result<ClassWithCount, ServiceError> {
        let class = self.require(class_id).await?;
        self.with_count(class).await
    }

    pub async fn list(&self, page: Page) -> Result<Vec<ClassWithCount>, ServiceError> {
        let classes = self.repo.list_classes(page).await?;

        let mut out = Vec::with_capacity(classes.len());
        for class in classes {
            out.push(self.with_count(class).await?);
        }
        Ok(out)
    }

    pub async fn update(
        &self,
        class_id: i64,
        request: UpdateClassRequest,
    ) -> Result<ClassWithCount, ServiceError> {
        request.validate()?;
        let mut class = self.require(class_id).await?;

        if let Some(teacher_id) = request.teacher_id {
            self.require_teacher(teacher_id).await?;
            class.teacher_id = Some(teacher_id);
        }
        if let Some(name) = request.name {
            class.name = name;
        }
        if let Some(grade) = request.grade {
            class.grade = grade;
        }

        let class = self
            .repo
            .update_class(&class)
            .await
            .map_err(|e| ServiceError::from_unique(e, &[("classes.name", NAME_TAKEN)]))?;
        self.with_count(class).await
    }

    /// Delete a class with its students and their attendance.
    pub async fn delete(&self, class_id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete_class(class_id).await? {
            return Err(ServiceError::NotFound("Class not found".to_string()));
        }
        info!("Deleted class #{}", class_id);
        Ok(())
    }

    /// Whether `user_id` is the assigned teacher of `class_id`.
    pub async fn is_taught_by(&self, class_id: i64, user_id: i64) -> Result<bool, ServiceError> {
        let class = self.require(class_id).await?;
        Ok(class.teacher_id == Some(user_id))
    }

    async fn require(&self, class_id: i64) -> Result<Class, ServiceError> {
        self.repo
            .get_class(class_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Class not found".to_string()))
    }

    async fn require_teacher(&self, teacher_id: i64) -> Result<(), ServiceError> {
        match self.repo.get_user(teacher_id).await? {
            Some(user) if user.role == Role::Teacher => Ok(()),
            _ => Err(ServiceError::Validation(
                "teacher_id must reference an existing teacher account".to_string(),
            )),
        }
    }

    async fn with_count(&self, class: Class) -> Result<ClassWithCount, ServiceError> {
        let student_count = self.repo.count_students(class.id).await?;
        Ok(ClassWithCount {
            class,
            student_count,
        })
    }
}
