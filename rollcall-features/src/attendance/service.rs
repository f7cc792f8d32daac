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

//! Attendance service.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use rollcall_core::{
    Attendance, AttendanceFilter, NewAttendance, Page, Repository, Student, StudentFilter,
};
use tracing::{debug, info};

use super::models::{
    AbsenceEntry, AbsentStudent, AttendanceUpdate, BulkError, BulkResult, DailyStats,
    MonthlyReport, SheetEntry, StudentSummary,
};
use crate::error::ServiceError;

const DUPLICATE_ATTENDANCE: &str = "Attendance already recorded for this student on this date";
const REASON_REQUIRED: &str = "A reason is required when marking a student absent";

/// Number of students listed in a monthly report's absence ranking.
pub const MOST_ABSENT_LIMIT: u32 = 5;

/// Number of absences listed in a student summary.
pub const RECENT_ABSENCES_LIMIT: u32 = 5;

/// Accepted report years.
pub const REPORT_YEARS: std::ops::RangeInclusive<i32> = 2000..=2100;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn is_blank(reason: &Option<String>) -> bool {
    reason.as_deref().map_or(true, |r| r.trim().is_empty())
}

/// First and last calendar day of a month.
///
/// The last day is the first of the following month minus one day, so
/// December rolls into January and February follows the leap-year rule.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    if !REPORT_YEARS.contains(&year) {
        return Err(ServiceError::Validation(format!(
            "Year must be between {} and {}",
            REPORT_YEARS.start(),
            REPORT_YEARS.end()
        )));
    }
    if !(1..=12).contains(&month) {
        return Err(ServiceError::Validation(
            "Month must be between 1 and 12".to_string(),
        ));
    }

    let invalid = || ServiceError::Validation(format!("Invalid month {}-{:02}", year, month));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next.pred_opt().ok_or_else(invalid)?;

    Ok((first, last))
}

/// Records attendance and derives statistics from stored records.
#[derive(Clone)]
pub struct AttendanceService {
    repo: Arc<dyn Repository>,
}

impl AttendanceService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Record one observation.
    ///
    /// # Errors
    ///
    /// - `Policy` when marking an absence without a reason
    /// - `NotFound` for an unknown student or class
    /// - `Validation` when the student is not enrolled in the class
    /// - `Duplicate` when the (student, class, date) triple exists
    pub async fn record_attendance(
        &self,
        mut record: NewAttendance,
    ) -> Result<Attendance, ServiceError> {
        if !record.present && is_blank(&record.reason) {
            return Err(ServiceError::policy(REASON_REQUIRED));
        }
        if is_blank(&record.reason) {
            record.reason = None;
        }

        let student = self.require_student(record.student_id).await?;
        self.require_class(record.class_id).await?;
        if student.class_id != record.class_id {
            return Err(ServiceError::Validation(
                "Student is not enrolled in this class".to_string(),
            ));
        }

        if self
            .repo
            .find_attendance(record.student_id, record.class_id, record.date)
            .await?
            .is_some()
        {
            return Err(ServiceError::Duplicate(DUPLICATE_ATTENDANCE.to_string()));
        }

        let saved = self.repo.insert_attendance(record).await.map_err(|e| {
            ServiceError::from_unique(e, &[("attendances.date", DUPLICATE_ATTENDANCE)])
        })?;

        debug!(
            "Recorded attendance #{} for student #{} on {}",
            saved.id, saved.student_id, saved.date
        );
        Ok(saved)
    }

    /// Record many observations. Each entry succeeds or fails on its own.
    pub async fn record_bulk(&self, entries: Vec<NewAttendance>) -> BulkResult {
        let mut result = BulkResult::default();

        for entry in entries {
            let (student_id, date) = (entry.student_id, entry.date);
            match self.record_attendance(entry).await {
                Ok(_) => result.successful_count += 1,
                Err(err) => {
                    result.failed_count += 1;
                    result.errors.push(BulkError {
                        student_id,
                        date,
                        error_message: err.to_string(),
                    });
                }
            }
        }

        info!(
            "Bulk attendance: {} recorded, {} failed",
            result.successful_count, result.failed_count
        );
        result
    }

    /// Correct an existing record.
    pub async fn update_attendance(
        &self,
        id: i64,
        update: AttendanceUpdate,
    ) -> Result<Attendance, ServiceError> {
        let mut record = self
            .repo
            .get_attendance(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Attendance record not found".to_string()))?;

        if let Some(present) = update.present {
            record.present = present;
        }
        if update.reason.is_some() {
            record.reason = update.reason;
        }
        if is_blank(&record.reason) {
            if !record.present {
                return Err(ServiceError::policy(REASON_REQUIRED));
            }
            record.reason = None;
        }

        Ok(self.repo.update_attendance(&record).await?)
    }

    pub async fn get_attendance(&self, id: i64) -> Result<Attendance, ServiceError> {
        self.repo
            .get_attendance(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Attendance record not found".to_string()))
    }

    pub async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<Attendance>, ServiceError> {
        Ok(self.repo.list_attendance(filter).await?)
    }

    /// Attendance figures for `class_id` on `date`.
    ///
    /// Students without a record count as absent.
    pub async fn daily_stats(
        &self,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<DailyStats, ServiceError> {
        self.require_class(class_id).await?;

        let total_students = self.repo.count_students(class_id).await?;
        let present_count = self
            .repo
            .count_attendance(&AttendanceFilter {
                class_id: Some(class_id),
                date: Some(date),
                present: Some(true),
                ..Default::default()
            })
            .await?;

        Ok(Self::stats_for(class_id, date, total_students, present_count))
    }

    fn stats_for(class_id: i64, date: NaiveDate, total: u64, present: u64) -> DailyStats {
        DailyStats {
            date,
            class_id,
            total_students: total,
            present_count: present,
            absent_count: total.saturating_sub(present),
            attendance_rate: round2(percentage(present, total)),
        }
    }

    /// Every student of the class paired with their record for `date`.
    pub async fn class_sheet(
        &self,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<SheetEntry>, ServiceError> {
        self.require_class(class_id).await?;

        let students = self
            .repo
            .list_students(&StudentFilter {
                class_id: Some(class_id),
                ..Default::default()
            })
            .await?;
        let mut by_student: HashMap<i64, Attendance> = self
            .repo
            .list_attendance(&AttendanceFilter {
                class_id: Some(class_id),
                date: Some(date),
                ..Default::default()
            })
            .await?
            .into_iter()
            .map(|record| (record.student_id, record))
            .collect();

        Ok(students
            .into_iter()
            .map(|student| {
                let attendance = by_student.remove(&student.id);
                SheetEntry {
                    present: attendance.as_ref().map(|a| a.present),
                    reason: attendance.as_ref().and_then(|a| a.reason.clone()),
                    attendance,
                    student,
                }
            })
            .collect())
    }

    /// Month-long report for a class.
    ///
    /// The roster size and the month's present records are loaded once and
    /// each day is derived from them.
    pub async fn monthly_report(
        &self,
        class_id: i64,
        year: i32,
        month: u32,
    ) -> Result<MonthlyReport, ServiceError> {
        let (first, last) = month_bounds(year, month)?;
        self.require_class(class_id).await?;

        let total_students = self.repo.count_students(class_id).await?;
        let mut present_by_day: HashMap<NaiveDate, u64> = HashMap::new();
        for record in self
            .repo
            .list_attendance(&AttendanceFilter {
                class_id: Some(class_id),
                from: Some(first),
                to: Some(last),
                present: Some(true),
                ..Default::default()
            })
            .await?
        {
            *present_by_day.entry(record.date).or_default() += 1;
        }

        let daily_stats: Vec<DailyStats> = first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|day| {
                let present = present_by_day.get(&day).copied().unwrap_or(0);
                Self::stats_for(class_id, day, total_students, present)
            })
            .collect();

        let (rate_sum, days_with_data) = daily_stats
            .iter()
            .filter(|day| day.total_students > 0)
            .fold((0.0, 0u32), |(sum, n), day| (sum + day.attendance_rate, n + 1));
        let average_attendance = if days_with_data > 0 {
            round2(rate_sum / f64::from(days_with_data))
        } else {
            0.0
        };

        let most_absent_students = self
            .repo
            .absence_ranking(class_id, first, last, MOST_ABSENT_LIMIT)
            .await?
            .into_iter()
            .map(|entry| AbsentStudent {
                student_id: entry.student.id,
                first_name: entry.student.first_name,
                last_name: entry.student.last_name,
                absent_days: entry.absent_days,
            })
            .collect();

        Ok(MonthlyReport {
            month: format!("{}-{:02}", first.year(), first.month()),
            class_id,
            total_days: daily_stats.len() as u32,
            days_with_data,
            average_attendance,
            daily_stats,
            most_absent_students,
        })
    }

    /// Share of a student's records marked present, 0 without records.
    pub async fn student_attendance_rate(&self, student_id: i64) -> Result<f64, ServiceError> {
        let all = AttendanceFilter {
            student_id: Some(student_id),
            ..Default::default()
        };
        let total = self.repo.count_attendance(&all).await?;
        if total == 0 {
            return Ok(0.0);
        }

        let present = self
            .repo
            .count_attendance(&AttendanceFilter {
                present: Some(true),
                ..all
            })
            .await?;
        Ok(percentage(present, total))
    }

    /// Records of a student within `[start, end]`, newest first.
    pub async fn student_history(
        &self,
        student_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Attendance>, ServiceError> {
        if start > end {
            return Err(ServiceError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }
        self.require_student(student_id).await?;

        Ok(self
            .repo
            .list_attendance(&AttendanceFilter {
                student_id: Some(student_id),
                from: Some(start),
                to: Some(end),
                newest_first: true,
                ..Default::default()
            })
            .await?)
    }

    /// Student record, overall rate and most recent absences.
    pub async fn student_summary(&self, student_id: i64) -> Result<StudentSummary, ServiceError> {
        let student = self.require_student(student_id).await?;
        let attendance_rate = self.student_attendance_rate(student_id).await?;

        let recent_absences = self
            .repo
            .list_attendance(&AttendanceFilter {
                student_id: Some(student_id),
                present: Some(false),
                newest_first: true,
                page: Some(Page::new(0, RECENT_ABSENCES_LIMIT)),
                ..Default::default()
            })
            .await?
            .into_iter()
            .map(|record| AbsenceEntry {
                date: record.date,
                reason: record.reason,
            })
            .collect();

        Ok(StudentSummary {
            student,
            attendance_rate: round2(attendance_rate),
            recent_absences,
        })
    }

    async fn require_student(&self, student_id: i64) -> Result<Student, ServiceError> {
        self.repo
            .get_student(student_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Student not found".to_string()))
    }

    async fn require_class(&self, class_id: i64) -> Result<(), ServiceError> {
        match self.repo.get_class(class_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound("Class not found".to_string())),
        }
    }
}
