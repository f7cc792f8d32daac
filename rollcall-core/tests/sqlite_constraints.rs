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

//! SQLite repository integration tests
//!
//! Verifies the relational guarantees the services rely on: unique indexes,
//! foreign keys, cascading deletes, storage-side filters, and persistence
//! across reopen.

use chrono::NaiveDate;
use rollcall_core::{
    AttendanceFilter, NewAttendance, NewClass, NewStudent, NewUser, Page, Repository, Role,
    SqliteRepository, StorageError, StudentFilter,
};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn new_user(username: &str, role: Role) -> NewUser {
    NewUser {
        email: format!("{}@school.test", username),
        username: username.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        role,
        class_id: None,
    }
}

fn new_class(name: &str) -> NewClass {
    NewClass {
        name: name.to_string(),
        grade: "5th".to_string(),
        teacher_id: None,
    }
}

fn new_student(first: &str, class_id: i64) -> NewStudent {
    NewStudent {
        first_name: first.to_string(),
        last_name: "Pupil".to_string(),
        email: None,
        class_id,
        user_id: None,
    }
}

fn mark(student_id: i64, class_id: i64, day: NaiveDate, present: bool) -> NewAttendance {
    NewAttendance {
        student_id,
        class_id,
        date: day,
        present,
        reason: if present { None } else { Some("sick".to_string()) },
    }
}

#[tokio::test]
async fn test_duplicate_username_and_email_rejected() {
    let repo = SqliteRepository::open_in_memory().expect("Failed to open repository");
    repo.insert_user(new_user("alice", Role::Teacher))
        .await
        .expect("Failed to insert user");

    let err = repo
        .insert_user(new_user("alice", Role::Teacher))
        .await
        .unwrap_err();
    assert!(err.violates("users.username") || err.violates("users.email"));

    let mut other = new_user("alice2", Role::Teacher);
    other.email = "alice@school.test".to_string();
    let err = repo.insert_user(other).await.unwrap_err();
    assert!(err.violates("users.email"), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_duplicate_attendance_triple_rejected() {
    let repo = SqliteRepository::open_in_memory().expect("Failed to open repository");
    let class = repo.insert_class(new_class("5A")).await.unwrap();
    let student = repo.insert_student(new_student("Ann", class.id)).await.unwrap();
    let day = date(2024, 3, 4);

    repo.insert_attendance(mark(student.id, class.id, day, true))
        .await
        .unwrap();
    let err = repo
        .insert_attendance(mark(student.id, class.id, day, false))
        .await
        .unwrap_err();

    assert!(err.violates("attendances.date"), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_student_requires_existing_class() {
    let repo = SqliteRepository::open_in_memory().expect("Failed to open repository");
    let err = repo.insert_student(new_student("Ghost", 42)).await.unwrap_err();
    assert!(matches!(err, StorageError::ForeignKeyViolation));
}

#[tokio::test]
async fn test_deleting_class_cascades_to_students_and_attendance() {
    let repo = SqliteRepository::open_in_memory().expect("Failed to open repository");
    let class = repo.insert_class(new_class("5A")).await.unwrap();
    let student = repo.insert_student(new_student("Ann", class.id)).await.unwrap();
    let record = repo
        .insert_attendance(mark(student.id, class.id, date(2024, 3, 4), true))
        .await
        .unwrap();

    assert!(repo.delete_class(class.id).await.unwrap());

    assert!(repo.get_student(student.id).await.unwrap().is_none());
    assert!(repo.get_attendance(record.id).await.unwrap().is_none());
    assert!(!repo.delete_class(class.id).await.unwrap());
}

#[tokio::test]
async fn test_deleting_student_cascades_to_attendance_only() {
    let repo = SqliteRepository::open_in_memory().expect("Failed to open repository");
    let class = repo.insert_class(new_class("5A")).await.unwrap();
    let student = repo.insert_student(new_student("Ann", class.id)).await.unwrap();
    let record = repo
        .insert_attendance(mark(student.id, class.id, date(2024, 3, 4), false))
        .await
        .unwrap();

    assert!(repo.delete_student(student.id).await.unwrap());

    assert!(repo.get_attendance(record.id).await.unwrap().is_none());
    assert!(repo.get_class(class.id).await.unwrap().is_some());
    assert_eq!(repo.count_students(class.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_student_filters_applied_in_storage() {
    let repo = SqliteRepository::open_in_memory().expect("Failed to open repository");
    let a = repo.insert_class(new_class("5A")).await.unwrap();
    let b = repo.insert_class(new_class("5B")).await.unwrap();
    let user = repo.insert_user(new_user("ann", Role::Student)).await.unwrap();

    let mut linked = new_student("Ann", a.id);
    linked.user_id = Some(user.id);
    repo.insert_student(linked).await.unwrap();
    repo.insert_student(new_student("Ben", a.id)).await.unwrap();
    repo.insert_student(new_student("Cid", b.id)).await.unwrap();

    let in_a = repo
        .list_students(&StudentFilter {
            class_id: Some(a.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(in_a.len(), 2);

    let without = repo
        .list_students(&StudentFilter {
            has_account: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    let names: Vec<_> = without.iter().map(|s| s.first_name.as_str()).collect();
    assert_eq!(names, vec!["Ben", "Cid"]);

    let paged = repo
        .list_students(&StudentFilter {
            page: Some(Page::new(2, 10)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].first_name, "Cid");

    let by_user = repo.get_student_by_user(user.id).await.unwrap().unwrap();
    assert_eq!(by_user.first_name, "Ann");
}

#[tokio::test]
async fn test_attendance_range_and_ordering() {
    let repo = SqliteRepository::open_in_memory().expect("Failed to open repository");
    let class = repo.insert_class(new_class("5A")).await.unwrap();
    let student = repo.insert_student(new_student("Ann", class.id)).await.unwrap();

    for day in 1..=5 {
        repo.insert_attendance(mark(student.id, class.id, date(2024, 3, day), day % 2 == 0))
            .await
            .unwrap();
    }

    let filter = AttendanceFilter {
        student_id: Some(student.id),
        from: Some(date(2024, 3, 2)),
        to: Some(date(2024, 3, 4)),
        newest_first: true,
        ..Default::default()
    };
    let records = repo.list_attendance(&filter).await.unwrap();
    let days: Vec<_> = records.iter().map(|r| r.date).collect();
    assert_eq!(days, vec![date(2024, 3, 4), date(2024, 3, 3), date(2024, 3, 2)]);

    let present = AttendanceFilter {
        student_id: Some(student.id),
        present: Some(true),
        ..Default::default()
    };
    assert_eq!(repo.count_attendance(&present).await.unwrap(), 2);
}

#[tokio::test]
async fn test_absence_ranking_orders_by_count_then_id() {
    let repo = SqliteRepository::open_in_memory().expect("Failed to open repository");
    let class = repo.insert_class(new_class("5A")).await.unwrap();
    let ann = repo.insert_student(new_student("Ann", class.id)).await.unwrap();
    let ben = repo.insert_student(new_student("Ben", class.id)).await.unwrap();
    let cid = repo.insert_student(new_student("Cid", class.id)).await.unwrap();

    // Ben: 2 absences, Ann and Cid: 1 each, one of Ann's outside the range.
    repo.insert_attendance(mark(ben.id, class.id, date(2024, 3, 1), false)).await.unwrap();
    repo.insert_attendance(mark(ben.id, class.id, date(2024, 3, 2), false)).await.unwrap();
    repo.insert_attendance(mark(cid.id, class.id, date(2024, 3, 1), false)).await.unwrap();
    repo.insert_attendance(mark(ann.id, class.id, date(2024, 3, 3), false)).await.unwrap();
    repo.insert_attendance(mark(ann.id, class.id, date(2024, 4, 1), false)).await.unwrap();
    repo.insert_attendance(mark(ann.id, class.id, date(2024, 3, 4), true)).await.unwrap();

    let ranking = repo
        .absence_ranking(class.id, date(2024, 3, 1), date(2024, 3, 31), 5)
        .await
        .unwrap();
    let summary: Vec<_> = ranking
        .iter()
        .map(|r| (r.student.first_name.as_str(), r.absent_days))
        .collect();
    assert_eq!(summary, vec![("Ben", 2), ("Ann", 1), ("Cid", 1)]);

    let top = repo
        .absence_ranking(class.id, date(2024, 3, 1), date(2024, 3, 31), 1)
        .await
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].student.id, ben.id);
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("nested").join("rollcall.db");

    {
        let repo = SqliteRepository::open(&db_path).expect("Failed to open repository");
        let class = repo.insert_class(new_class("5A")).await.unwrap();
        repo.insert_student(new_student("Ann", class.id)).await.unwrap();
    }

    let repo = SqliteRepository::open(&db_path).expect("Failed to reopen repository");
    let classes = repo.list_classes(Page::default()).await.unwrap();
    assert_eq!(classes.len(), 1);
    assert_eq!(repo.count_students(classes[0].id).await.unwrap(), 1);
}
