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

//! Attendance request and report models.

use chrono::NaiveDate;
use rollcall_core::{Attendance, Student};
use serde::{Deserialize, Serialize};

/// Correction applied to an existing record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceUpdate {
    pub present: Option<bool>,
    pub reason: Option<String>,
}

/// Per-entry failure in a bulk submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkError {
    pub student_id: i64,
    pub date: NaiveDate,
    pub error_message: String,
}

/// Outcome of a bulk submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkResult {
    pub successful_count: u32,
    pub failed_count: u32,
    pub errors: Vec<BulkError>,
}

/// Attendance figures for one class on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub class_id: i64,
    pub total_students: u64,
    pub present_count: u64,
    /// Students without a present record, including those with no record
    pub absent_count: u64,
    /// Percentage rounded to 2 decimals, 0 for an empty class
    pub attendance_rate: f64,
}

/// One row of the class attendance sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetEntry {
    pub student: Student,
    pub attendance: Option<Attendance>,
    pub present: Option<bool>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbsentStudent {
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub absent_days: u64,
}

/// Month-long attendance report for a class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    /// `YYYY-MM`
    pub month: String,
    pub class_id: i64,
    pub total_days: u32,
    /// Days on which the class had at least one student
    pub days_with_data: u32,
    pub average_attendance: f64,
    pub daily_stats: Vec<DailyStats>,
    /// At most five, most absences first
    pub most_absent_students: Vec<AbsentStudent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbsenceEntry {
    pub date: NaiveDate,
    pub reason: Option<String>,
}

/// Attendance overview of a single student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub student: Student,
    pub attendance_rate: f64,
    pub recent_absences: Vec<AbsenceEntry>,
}
