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

//! SQLite-backed repository.

use std::path::Path;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::engine::{AbsenceCount, AttendanceFilter, Page, Repository, StudentFilter};
use super::schema;
use crate::error::StorageError;
use crate::types::{
    Attendance, Class, NewAttendance, NewClass, NewStudent, NewUser, Role, Student, User,
};

const USER_COLUMNS: &str = "id, email, username, password_hash, first_name, last_name, role, \
                            is_active, class_id, created_at, updated_at";
const CLASS_COLUMNS: &str = "id, name, grade, teacher_id, created_at, updated_at";
const STUDENT_COLUMNS: &str =
    "id, first_name, last_name, email, class_id, user_id, created_at, updated_at";
const ATTENDANCE_COLUMNS: &str =
    "id, student_id, class_id, date, present, reason, created_at, updated_at";

/// Repository over a single SQLite connection.
///
/// Every call takes the connection lock for one short synchronous critical
/// section; requests never hold it across an await point.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Opens (or creates) a database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!("Opening SQLite database at {:?}", path);
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database (tests, `:memory:` URLs).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        role: row.get(6)?,
        is_active: row.get(7)?,
        class_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn class_from_row(row: &Row<'_>) -> rusqlite::Result<Class> {
    Ok(Class {
        id: row.get(0)?,
        name: row.get(1)?,
        grade: row.get(2)?,
        teacher_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        class_id: row.get(4)?,
        user_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn attendance_from_row(row: &Row<'_>) -> rusqlite::Result<Attendance> {
    Ok(Attendance {
        id: row.get(0)?,
        student_id: row.get(1)?,
        class_id: row.get(2)?,
        date: row.get(3)?,
        present: row.get(4)?,
        reason: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

// ============================================================================
// Query helpers
// ============================================================================

/// AND-joined WHERE clause with positional parameters.
#[derive(Default)]
struct Conditions {
    clauses: Vec<&'static str>,
    params: Vec<Value>,
}

impl Conditions {
    fn bind(&mut self, clause: &'static str, value: Value) {
        self.clauses.push(clause);
        self.params.push(value);
    }

    fn raw(&mut self, clause: &'static str) {
        self.clauses.push(clause);
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

fn push_page(sql: &mut String, params: &mut Vec<Value>, page: Option<Page>) {
    if let Some(page) = page {
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(Value::Integer(i64::from(page.limit)));
        params.push(Value::Integer(i64::from(page.skip)));
    }
}

fn query_all<T, F>(
    conn: &Connection,
    sql: &str,
    params: &[Value],
    map: F,
) -> Result<Vec<T>, StorageError>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), map)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn user_where<K: ToSql>(
    conn: &Connection,
    column: &str,
    key: K,
) -> Result<Option<User>, StorageError> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    Ok(conn.query_row(&sql, params![key], user_from_row).optional()?)
}

fn class_by_id(conn: &Connection, id: i64) -> Result<Option<Class>, StorageError> {
    let sql = format!("SELECT {} FROM classes WHERE id = ?1", CLASS_COLUMNS);
    Ok(conn.query_row(&sql, params![id], class_from_row).optional()?)
}

fn student_where<K: ToSql>(
    conn: &Connection,
    column: &str,
    key: K,
) -> Result<Option<Student>, StorageError> {
    let sql = format!("SELECT {} FROM students WHERE {} = ?1", STUDENT_COLUMNS, column);
    Ok(conn.query_row(&sql, params![key], student_from_row).optional()?)
}

fn attendance_by_id(conn: &Connection, id: i64) -> Result<Option<Attendance>, StorageError> {
    let sql = format!("SELECT {} FROM attendances WHERE id = ?1", ATTENDANCE_COLUMNS);
    Ok(conn.query_row(&sql, params![id], attendance_from_row).optional()?)
}

fn attendance_conditions(filter: &AttendanceFilter) -> Conditions {
    let mut conditions = Conditions::default();
    if let Some(class_id) = filter.class_id {
        conditions.bind("class_id = ?", Value::Integer(class_id));
    }
    if let Some(student_id) = filter.student_id {
        conditions.bind("student_id = ?", Value::Integer(student_id));
    }
    if let Some(date) = filter.date {
        conditions.bind("date = ?", date_value(date));
    }
    if let Some(from) = filter.from {
        conditions.bind("date >= ?", date_value(from));
    }
    if let Some(to) = filter.to {
        conditions.bind("date <= ?", date_value(to));
    }
    if let Some(present) = filter.present {
        conditions.bind("present = ?", Value::Integer(i64::from(present)));
    }
    conditions
}

fn require<T>(row: Option<T>, table: &'static str, id: i64) -> Result<T, StorageError> {
    row.ok_or(StorageError::RecordNotFound { table, id })
}

// ============================================================================
// Repository implementation
// ============================================================================

#[async_trait]
impl Repository for SqliteRepository {
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users(email, username, password_hash, first_name, last_name, role, \
             is_active, class_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)",
            params![
                user.email,
                user.username,
                user.password_hash,
                user.first_name,
                user.last_name,
                user.role,
                user.class_id,
                Utc::now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted user #{} ({})", id, user.username);
        require(user_where(&conn, "id", id)?, "users", id)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        let conn = self.conn.lock().await;
        user_where(&conn, "id", id)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let conn = self.conn.lock().await;
        user_where(&conn, "username", username)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let conn = self.conn.lock().await;
        user_where(&conn, "email", email)
    }

    async fn list_users(&self, page: Page) -> Result<Vec<User>, StorageError> {
        let conn = self.conn.lock().await;
        let mut sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let mut params = Vec::new();
        push_page(&mut sql, &mut params, Some(page));
        query_all(&conn, &sql, &params, user_from_row)
    }

    async fn update_user(&self, user: &User) -> Result<User, StorageError> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE users SET email = ?1, username = ?2, password_hash = ?3, first_name = ?4, \
             last_name = ?5, role = ?6, is_active = ?7, class_id = ?8, updated_at = ?9 \
             WHERE id = ?10",
            params![
                user.email,
                user.username,
                user.password_hash,
                user.first_name,
                user.last_name,
                user.role,
                user.is_active,
                user.class_id,
                Utc::now(),
                user.id,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::RecordNotFound {
                table: "users",
                id: user.id,
            });
        }
        require(user_where(&conn, "id", user.id)?, "users", user.id)
    }

    async fn insert_class(&self, class: NewClass) -> Result<Class, StorageError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO classes(name, grade, teacher_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![class.name, class.grade, class.teacher_id, Utc::now()],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted class #{} ({})", id, class.name);
        require(class_by_id(&conn, id)?, "classes", id)
    }

    async fn get_class(&self, id: i64) -> Result<Option<Class>, StorageError> {
        let conn = self.conn.lock().await;
        class_by_id(&conn, id)
    }

    async fn list_classes(&self, page: Page) -> Result<Vec<Class>, StorageError> {
        let conn = self.conn.lock().await;
        let mut sql = format!("SELECT {} FROM classes ORDER BY id", CLASS_COLUMNS);
        let mut params = Vec::new();
        push_page(&mut sql, &mut params, Some(page));
        query_all(&conn, &sql, &params, class_from_row)
    }

    async fn update_class(&self, class: &Class) -> Result<Class, StorageError> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE classes SET name = ?1, grade = ?2, teacher_id = ?3, updated_at = ?4 \
             WHERE id = ?5",
            params![class.name, class.grade, class.teacher_id, Utc::now(), class.id],
        )?;
        if changed == 0 {
            return Err(StorageError::RecordNotFound {
                table: "classes",
                id: class.id,
            });
        }
        require(class_by_id(&conn, class.id)?, "classes", class.id)
    }

    async fn delete_class(&self, id: i64) -> Result<bool, StorageError> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM classes WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    async fn count_students(&self, class_id: i64) -> Result<u64, StorageError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM students WHERE class_id = ?1",
            params![class_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    async fn insert_student(&self, student: NewStudent) -> Result<Student, StorageError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO students(first_name, last_name, email, class_id, user_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                student.first_name,
                student.last_name,
                student.email,
                student.class_id,
                student.user_id,
                Utc::now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted student #{} in class #{}", id, student.class_id);
        require(student_where(&conn, "id", id)?, "students", id)
    }

    async fn get_student(&self, id: i64) -> Result<Option<Student>, StorageError> {
        let conn = self.conn.lock().await;
        student_where(&conn, "id", id)
    }

    async fn get_student_by_email(&self, email: &str) -> Result<Option<Student>, StorageError> {
        let conn = self.conn.lock().await;
        student_where(&conn, "email", email)
    }

    async fn get_student_by_user(&self, user_id: i64) -> Result<Option<Student>, StorageError> {
        let conn = self.conn.lock().await;
        student_where(&conn, "user_id", user_id)
    }

    async fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>, StorageError> {
        let conn = self.conn.lock().await;

        let mut conditions = Conditions::default();
        if let Some(class_id) = filter.class_id {
            conditions.bind("class_id = ?", Value::Integer(class_id));
        }
        match filter.has_account {
            Some(true) => conditions.raw("user_id IS NOT NULL"),
            Some(false) => conditions.raw("user_id IS NULL"),
            None => {}
        }

        let mut sql = format!(
            "SELECT {} FROM students{} ORDER BY id",
            STUDENT_COLUMNS,
            conditions.where_sql()
        );
        let mut params = conditions.params;
        push_page(&mut sql, &mut params, filter.page);
        query_all(&conn, &sql, &params, student_from_row)
    }

    async fn update_student(&self, student: &Student) -> Result<Student, StorageError> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE students SET first_name = ?1, last_name = ?2, email = ?3, class_id = ?4, \
             user_id = ?5, updated_at = ?6 WHERE id = ?7",
            params![
                student.first_name,
                student.last_name,
                student.email,
                student.class_id,
                student.user_id,
                Utc::now(),
                student.id,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::RecordNotFound {
                table: "students",
                id: student.id,
            });
        }
        require(student_where(&conn, "id", student.id)?, "students", student.id)
    }

    async fn delete_student(&self, id: i64) -> Result<bool, StorageError> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM students WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    async fn insert_attendance(&self, record: NewAttendance) -> Result<Attendance, StorageError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO attendances(student_id, class_id, date, present, reason, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.student_id,
                record.class_id,
                record.date,
                record.present,
                record.reason,
                Utc::now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        require(attendance_by_id(&conn, id)?, "attendances", id)
    }

    async fn get_attendance(&self, id: i64) -> Result<Option<Attendance>, StorageError> {
        let conn = self.conn.lock().await;
        attendance_by_id(&conn, id)
    }

    async fn find_attendance(
        &self,
        student_id: i64,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, StorageError> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {} FROM attendances WHERE student_id = ?1 AND class_id = ?2 AND date = ?3",
            ATTENDANCE_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![student_id, class_id, date], attendance_from_row)
            .optional()?)
    }

    async fn update_attendance(&self, record: &Attendance) -> Result<Attendance, StorageError> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE attendances SET present = ?1, reason = ?2, updated_at = ?3 WHERE id = ?4",
            params![record.present, record.reason, Utc::now(), record.id],
        )?;
        if changed == 0 {
            return Err(StorageError::RecordNotFound {
                table: "attendances",
                id: record.id,
            });
        }
        require(attendance_by_id(&conn, record.id)?, "attendances", record.id)
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<Attendance>, StorageError> {
        let conn = self.conn.lock().await;
        let conditions = attendance_conditions(filter);
        let order = if filter.newest_first {
            "date DESC, id DESC"
        } else {
            "date ASC, id ASC"
        };

        let mut sql = format!(
            "SELECT {} FROM attendances{} ORDER BY {}",
            ATTENDANCE_COLUMNS,
            conditions.where_sql(),
            order
        );
        let mut params = conditions.params;
        push_page(&mut sql, &mut params, filter.page);
        query_all(&conn, &sql, &params, attendance_from_row)
    }

    async fn count_attendance(&self, filter: &AttendanceFilter) -> Result<u64, StorageError> {
        let conn = self.conn.lock().await;
        let conditions = attendance_conditions(filter);
        let sql = format!("SELECT COUNT(*) FROM attendances{}", conditions.where_sql());
        let count: i64 =
            conn.query_row(&sql, params_from_iter(conditions.params.iter()), |row| row.get(0))?;
        Ok(count as u64)
    }

    async fn absence_ranking(
        &self,
        class_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> Result<Vec<AbsenceCount>, StorageError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT s.id, s.first_name, s.last_name, s.email, s.class_id, s.user_id, \
             s.created_at, s.updated_at, COUNT(a.id) AS absent_days \
             FROM students s \
             JOIN attendances a ON a.student_id = s.id \
             WHERE s.class_id = ?1 AND a.present = 0 AND a.date >= ?2 AND a.date <= ?3 \
             GROUP BY s.id \
             ORDER BY absent_days DESC, s.id ASC \
             LIMIT ?4",
        )?;
        let rows = stmt.query_map(params![class_id, from, to, limit], |row| {
            let absent_days: i64 = row.get(8)?;
            Ok(AbsenceCount {
                student: student_from_row(row)?,
                absent_days: absent_days as u64,
            })
        })?;

        let mut ranking = Vec::new();
        for row in rows {
            ranking.push(row?);
        }
        Ok(ranking)
    }
}
