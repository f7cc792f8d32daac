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

//! Repository trait and query types.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StorageError;
use crate::types::{
    Attendance, Class, NewAttendance, NewClass, NewStudent, NewUser, Student, User,
};

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Rows to skip.
    pub skip: u32,
    /// Maximum rows to return.
    pub limit: u32,
}

impl Page {
    /// Default page size used by list endpoints.
    pub const DEFAULT_LIMIT: u32 = 100;

    /// Creates a page.
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Filter for listing students.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// Restrict to one class.
    pub class_id: Option<i64>,
    /// `Some(true)` only students linked to a user, `Some(false)` only unlinked.
    pub has_account: Option<bool>,
    /// Pagination; `None` returns every match.
    pub page: Option<Page>,
}

/// Filter for listing and counting attendance records.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub class_id: Option<i64>,
    pub student_id: Option<i64>,
    /// Exact day.
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub to: Option<NaiveDate>,
    pub present: Option<bool>,
    /// Order by date descending instead of ascending.
    pub newest_first: bool,
    /// Pagination; `None` returns every match. Ignored when counting.
    pub page: Option<Page>,
}

/// A student together with their number of absences in a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsenceCount {
    pub student: Student,
    pub absent_days: u64,
}

/// Relational store for users, classes, students and attendance records.
///
/// Uniqueness (user email/username, class name, student email, student user
/// link, attendance triple) is enforced by the store itself and reported as
/// `StorageError::UniqueViolation`, so callers can rely on it instead of a
/// prior existence check.
#[async_trait]
pub trait Repository: Send + Sync {
    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Inserts a user and returns the stored row.
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError>;

    /// Fetches a user by primary key.
    async fn get_user(&self, id: i64) -> Result<Option<User>, StorageError>;

    /// Fetches a user by username.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// Fetches a user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// Lists users ordered by id.
    async fn list_users(&self, page: Page) -> Result<Vec<User>, StorageError>;

    /// Persists every mutable field of `user` and stamps `updated_at`.
    async fn update_user(&self, user: &User) -> Result<User, StorageError>;

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    async fn insert_class(&self, class: NewClass) -> Result<Class, StorageError>;

    async fn get_class(&self, id: i64) -> Result<Option<Class>, StorageError>;

    async fn list_classes(&self, page: Page) -> Result<Vec<Class>, StorageError>;

    async fn update_class(&self, class: &Class) -> Result<Class, StorageError>;

    /// Deletes a class together with its students and attendance records.
    ///
    /// Returns false when no class had this id.
    async fn delete_class(&self, id: i64) -> Result<bool, StorageError>;

    /// Number of students enrolled in a class.
    async fn count_students(&self, class_id: i64) -> Result<u64, StorageError>;

    // ------------------------------------------------------------------
    // Students
    // ------------------------------------------------------------------

    async fn insert_student(&self, student: NewStudent) -> Result<Student, StorageError>;

    async fn get_student(&self, id: i64) -> Result<Option<Student>, StorageError>;

    async fn get_student_by_email(&self, email: &str) -> Result<Option<Student>, StorageError>;

    /// Fetches the student linked to a user account.
    async fn get_student_by_user(&self, user_id: i64) -> Result<Option<Student>, StorageError>;

    /// Lists students matching `filter`, ordered by id.
    async fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>, StorageError>;

    async fn update_student(&self, student: &Student) -> Result<Student, StorageError>;

    /// Deletes a student together with its attendance records.
    async fn delete_student(&self, id: i64) -> Result<bool, StorageError>;

    // ------------------------------------------------------------------
    // Attendance
    // ------------------------------------------------------------------

    async fn insert_attendance(&self, record: NewAttendance) -> Result<Attendance, StorageError>;

    async fn get_attendance(&self, id: i64) -> Result<Option<Attendance>, StorageError>;

    /// Fetches the record for a (student, class, date) triple.
    async fn find_attendance(
        &self,
        student_id: i64,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, StorageError>;

    async fn update_attendance(&self, record: &Attendance) -> Result<Attendance, StorageError>;

    /// Lists records matching `filter`, ordered by date then id.
    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<Attendance>, StorageError>;

    /// Counts records matching `filter`.
    async fn count_attendance(&self, filter: &AttendanceFilter) -> Result<u64, StorageError>;

    /// Students of `class_id` with at least one absence in `[from, to]`,
    /// ranked by absence count descending then student id ascending.
    async fn absence_ranking(
        &self,
        class_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> Result<Vec<AbsenceCount>, StorageError>;
}
