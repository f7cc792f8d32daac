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

//! Attendance aggregation integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rollcall_core::{
    AbsenceCount, Attendance, AttendanceFilter, Class, NewAttendance, NewClass, NewStudent,
    NewUser, Page, Repository, SqliteRepository, StorageError, Student, StudentFilter, User,
};
use rollcall_features::attendance::{AttendanceService, AttendanceUpdate};
use rollcall_features::ServiceError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

struct Fixture {
    repo: Arc<dyn Repository>,
    service: AttendanceService,
    class_id: i64,
    students: Vec<i64>,
}

async fn fixture(student_count: usize) -> Fixture {
    let repo: Arc<dyn Repository> =
        Arc::new(SqliteRepository::open_in_memory().expect("Failed to open repository"));
    let class = repo
        .insert_class(NewClass {
            name: "5A".to_string(),
            grade: "5th".to_string(),
            teacher_id: None,
        })
        .await
        .unwrap();

    let mut students = Vec::new();
    for i in 0..student_count {
        let student = repo
            .insert_student(NewStudent {
                first_name: format!("Student{}", i),
                last_name: "Pupil".to_string(),
                email: None,
                class_id: class.id,
                user_id: None,
            })
            .await
            .unwrap();
        students.push(student.id);
    }

    Fixture {
        service: AttendanceService::new(repo.clone()),
        repo,
        class_id: class.id,
        students,
    }
}

fn present(student_id: i64, class_id: i64, day: NaiveDate) -> NewAttendance {
    NewAttendance {
        student_id,
        class_id,
        date: day,
        present: true,
        reason: None,
    }
}

fn absent(student_id: i64, class_id: i64, day: NaiveDate) -> NewAttendance {
    NewAttendance {
        student_id,
        class_id,
        date: day,
        present: false,
        reason: Some("sick".to_string()),
    }
}

#[tokio::test]
async fn test_daily_stats_seven_of_ten() {
    let f = fixture(10).await;
    let day = date(2024, 3, 4);

    for (i, &student) in f.students.iter().enumerate() {
        let record = if i < 7 {
            present(student, f.class_id, day)
        } else {
            absent(student, f.class_id, day)
        };
        f.service.record_attendance(record).await.unwrap();
    }

    let stats = f.service.daily_stats(f.class_id, day).await.unwrap();
    assert_eq!(stats.total_students, 10);
    assert_eq!(stats.present_count, 7);
    assert_eq!(stats.absent_count, 3);
    assert_eq!(stats.attendance_rate, 70.0);
}

#[tokio::test]
async fn test_missing_records_count_as_absent() {
    let f = fixture(4).await;
    let day = date(2024, 3, 4);
    f.service
        .record_attendance(present(f.students[0], f.class_id, day))
        .await
        .unwrap();

    let stats = f.service.daily_stats(f.class_id, day).await.unwrap();
    assert_eq!(stats.present_count, 1);
    assert_eq!(stats.absent_count, 3);
    assert_eq!(stats.attendance_rate, 25.0);
}

#[tokio::test]
async fn test_empty_class_rate_is_zero() {
    let f = fixture(0).await;
    let stats = f.service.daily_stats(f.class_id, date(2024, 3, 4)).await.unwrap();
    assert_eq!(stats.total_students, 0);
    assert_eq!(stats.attendance_rate, 0.0);
}

#[tokio::test]
async fn test_duplicate_attendance_rejected() {
    let f = fixture(1).await;
    let day = date(2024, 3, 4);

    f.service
        .record_attendance(present(f.students[0], f.class_id, day))
        .await
        .unwrap();
    let err = f
        .service
        .record_attendance(present(f.students[0], f.class_id, day))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Duplicate(_)));
}

/// Delegates to SQLite but never sees an existing attendance record, so
/// duplicates are only caught by the unique index.
struct StaleReadRepository {
    inner: SqliteRepository,
}

#[async_trait]
impl Repository for StaleReadRepository {
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError> {
        self.inner.insert_user(user).await
    }
    async fn get_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        self.inner.get_user(id).await
    }
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        self.inner.get_user_by_username(username).await
    }
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        self.inner.get_user_by_email(email).await
    }
    async fn list_users(&self, page: Page) -> Result<Vec<User>, StorageError> {
        self.inner.list_users(page).await
    }
    async fn update_user(&self, user: &User) -> Result<User, StorageError> {
        self.inner.update_user(user).await
    }
    async fn insert_class(&self, class: NewClass) -> Result<Class, StorageError> {
        self.inner.insert_class(class).await
    }
    async fn get_class(&self, id: i64) -> Result<Option<Class>, StorageError> {
        self.inner.get_class(id).await
    }
    async fn list_classes(&self, page: Page) -> Result<Vec<Class>, StorageError> {
        self.inner.list_classes(page).await
    }
    async fn update_class(&self, class: &Class) -> Result<Class, StorageError> {
        self.inner.update_class(class).await
    }
    async fn delete_class(&self, id: i64) -> Result<bool, StorageError> {
        self.inner.delete_class(id).await
    }
    async fn count_students(&self, class_id: i64) -> Result<u64, StorageError> {
        self.inner.count_students(class_id).await
    }
    async fn insert_student(&self, student: NewStudent) -> Result<Student, StorageError> {
        self.inner.insert_student(student).await
    }
    async fn get_student(&self, id: i64) -> Result<Option<Student>, StorageError> {
        self.inner.get_student(id).await
    }
    async fn get_student_by_email(&self, email: &str) -> Result<Option<Student>, StorageError> {
        self.inner.get_student_by_email(email).await
    }
    async fn get_student_by_user(&self, user_id: i64) -> Result<Option<Student>, StorageError> {
        self.inner.get_student_by_user(user_id).await
    }
    async fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>, StorageError> {
        self.inner.list_students(filter).await
    }
    async fn update_student(&self, student: &Student) -> Result<Student, StorageError> {
        self.inner.update_student(student).await
    }
    async fn delete_student(&self, id: i64) -> Result<bool, StorageError> {
        self.inner.delete_student(id).await
    }
    async fn insert_attendance(&self, record: NewAttendance) -> Result<Attendance, StorageError> {
        self.inner.insert_attendance(record).await
    }
    async fn get_attendance(&self, id: i64) -> Result<Option<Attendance>, StorageError> {
        self.inner.get_attendance(id).await
    }
    async fn find_attendance(
        &self,
        _student_id: i64,
        _class_id: i64,
        _date: NaiveDate,
    ) -> Result<Option<Attendance>, StorageError> {
        Ok(None)
    }
    async fn update_attendance(&self, record: &Attendance) -> Result<Attendance, StorageError> {
        self.inner.update_attendance(record).await
    }
    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<Attendance>, StorageError> {
        self.inner.list_attendance(filter).await
    }
    async fn count_attendance(&self, filter: &AttendanceFilter) -> Result<u64, StorageError> {
        self.inner.count_attendance(filter).await
    }
    async fn absence_ranking(
        &self,
        class_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> Result<Vec<AbsenceCount>, StorageError> {
        self.inner.absence_ranking(class_id, from, to, limit).await
    }
}

#[tokio::test]
async fn test_unique_index_violation_maps_to_duplicate() {
    let repo: Arc<dyn Repository> = Arc::new(StaleReadRepository {
        inner: SqliteRepository::open_in_memory().expect("Failed to open repository"),
    });
    let class = repo
        .insert_class(NewClass {
            name: "6B".to_string(),
            grade: "6th".to_string(),
            teacher_id: None,
        })
        .await
        .unwrap();
    let student = repo
        .insert_student(NewStudent {
            first_name: "Ada".to_string(),
            last_name: "Pupil".to_string(),
            email: None,
            class_id: class.id,
            user_id: None,
        })
        .await
        .unwrap();
    let service = AttendanceService::new(repo);
    let day = date(2024, 3, 4);

    service
        .record_attendance(present(student.id, class.id, day))
        .await
        .unwrap();
    let err = service
        .record_attendance(absent(student.id, class.id, day))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Duplicate(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_absence_without_reason_is_policy_error() {
    let f = fixture(1).await;
    let mut record = absent(f.students[0], f.class_id, date(2024, 3, 4));
    record.reason = Some("   ".to_string());

    let err = f.service.record_attendance(record).await.unwrap_err();
    assert!(matches!(err, ServiceError::Policy { .. }));
}

#[tokio::test]
async fn test_unknown_student_is_not_found() {
    let f = fixture(1).await;
    let err = f
        .service
        .record_attendance(present(999, f.class_id, date(2024, 3, 4)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_bulk_entries_are_independent() {
    let f = fixture(3).await;
    let day = date(2024, 3, 4);

    let result = f
        .service
        .record_bulk(vec![
            present(f.students[0], f.class_id, day),
            present(f.students[0], f.class_id, day),
            NewAttendance {
                reason: None,
                ..absent(f.students[1], f.class_id, day)
            },
            absent(f.students[2], f.class_id, day),
        ])
        .await;

    assert_eq!(result.successful_count, 2);
    assert_eq!(result.failed_count, 2);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].student_id, f.students[0]);
    assert_eq!(result.errors[1].student_id, f.students[1]);
    assert_eq!(result.errors[1].date, day);
}

#[tokio::test]
async fn test_update_keeps_reason_policy() {
    let f = fixture(1).await;
    let record = f
        .service
        .record_attendance(present(f.students[0], f.class_id, date(2024, 3, 4)))
        .await
        .unwrap();

    let err = f
        .service
        .update_attendance(
            record.id,
            AttendanceUpdate {
                present: Some(false),
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Policy { .. }));

    let updated = f
        .service
        .update_attendance(
            record.id,
            AttendanceUpdate {
                present: Some(false),
                reason: Some("dentist".to_string()),
            },
        )
        .await
        .unwrap();
    assert!(!updated.present);
    assert_eq!(updated.reason.as_deref(), Some("dentist"));
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn test_monthly_report_february_lengths() {
    let f = fixture(2).await;

    let leap = f.service.monthly_report(f.class_id, 2024, 2).await.unwrap();
    assert_eq!(leap.month, "2024-02");
    assert_eq!(leap.total_days, 29);
    assert_eq!(leap.daily_stats.len(), 29);
    assert_eq!(leap.daily_stats.last().unwrap().date, date(2024, 2, 29));

    let common = f.service.monthly_report(f.class_id, 2023, 2).await.unwrap();
    assert_eq!(common.total_days, 28);
}

#[tokio::test]
async fn test_monthly_report_average_and_ranking() {
    let f = fixture(2).await;
    let (a, b) = (f.students[0], f.students[1]);

    // Day 1: both present (100%); day 2: a present (50%); rest: nobody (0%)
    f.service.record_attendance(present(a, f.class_id, date(2024, 3, 1))).await.unwrap();
    f.service.record_attendance(present(b, f.class_id, date(2024, 3, 1))).await.unwrap();
    f.service.record_attendance(present(a, f.class_id, date(2024, 3, 2))).await.unwrap();
    f.service.record_attendance(absent(b, f.class_id, date(2024, 3, 2))).await.unwrap();
    f.service.record_attendance(absent(b, f.class_id, date(2024, 3, 3))).await.unwrap();
    f.service.record_attendance(absent(a, f.class_id, date(2024, 3, 3))).await.unwrap();
    // Outside the month
    f.service.record_attendance(absent(a, f.class_id, date(2024, 4, 1))).await.unwrap();

    let report = f.service.monthly_report(f.class_id, 2024, 3).await.unwrap();
    assert_eq!(report.total_days, 31);
    assert_eq!(report.days_with_data, 31);
    assert_eq!(report.daily_stats[0].attendance_rate, 100.0);
    assert_eq!(report.daily_stats[1].attendance_rate, 50.0);
    assert_eq!(report.average_attendance, 4.84); // 150 / 31

    let ranking: Vec<_> = report
        .most_absent_students
        .iter()
        .map(|s| (s.student_id, s.absent_days))
        .collect();
    assert_eq!(ranking, vec![(b, 2), (a, 1)]);
}

#[tokio::test]
async fn test_monthly_report_without_roster_has_no_data_days() {
    let f = fixture(0).await;
    let report = f.service.monthly_report(f.class_id, 2024, 12).await.unwrap();
    assert_eq!(report.total_days, 31);
    assert_eq!(report.days_with_data, 0);
    assert_eq!(report.average_attendance, 0.0);
    assert!(report.most_absent_students.is_empty());
}

#[tokio::test]
async fn test_monthly_report_validates_month() {
    let f = fixture(0).await;
    let err = f.service.monthly_report(f.class_id, 2024, 13).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_student_rate_and_history() {
    let f = fixture(1).await;
    let s = f.students[0];

    assert_eq!(f.service.student_attendance_rate(s).await.unwrap(), 0.0);

    f.service.record_attendance(present(s, f.class_id, date(2024, 3, 1))).await.unwrap();
    f.service.record_attendance(absent(s, f.class_id, date(2024, 3, 2))).await.unwrap();
    f.service.record_attendance(present(s, f.class_id, date(2024, 3, 3))).await.unwrap();
    f.service.record_attendance(present(s, f.class_id, date(2024, 3, 4))).await.unwrap();

    assert_eq!(f.service.student_attendance_rate(s).await.unwrap(), 75.0);

    let history = f
        .service
        .student_history(s, date(2024, 3, 2), date(2024, 3, 3))
        .await
        .unwrap();
    let days: Vec<_> = history.iter().map(|r| r.date).collect();
    assert_eq!(days, vec![date(2024, 3, 3), date(2024, 3, 2)]);

    let summary = f.service.student_summary(s).await.unwrap();
    assert_eq!(summary.attendance_rate, 75.0);
    assert_eq!(summary.recent_absences.len(), 1);
    assert_eq!(summary.recent_absences[0].reason.as_deref(), Some("sick"));
}

#[tokio::test]
async fn test_class_sheet_lists_every_student() {
    let f = fixture(3).await;
    let day = date(2024, 3, 4);
    f.service.record_attendance(present(f.students[0], f.class_id, day)).await.unwrap();
    f.service.record_attendance(absent(f.students[2], f.class_id, day)).await.unwrap();

    let sheet = f.service.class_sheet(f.class_id, day).await.unwrap();
    let marks: Vec<_> = sheet.iter().map(|e| e.present).collect();
    assert_eq!(marks, vec![Some(true), None, Some(false)]);
    assert_eq!(sheet[2].reason.as_deref(), Some("sick"));

    let listed = f
        .service
        .list_attendance(&AttendanceFilter {
            class_id: Some(f.class_id),
            date: Some(day),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(f.repo.count_students(f.class_id).await.unwrap(), 3);
}
