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

//! Error types for the storage layer.

use rusqlite::ffi;
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A unique index rejected the write.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Columns named by the violated index (e.g. `users.email`).
        constraint: String,
    },

    /// A foreign key referenced a missing row.
    #[error("Foreign key constraint violated")]
    ForeignKeyViolation,

    /// Row targeted by an update does not exist.
    #[error("Record not found: {table} #{id}")]
    RecordNotFound {
        /// Table that was searched.
        table: &'static str,
        /// Primary key that was not found.
        id: i64,
    },

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation error.
    #[error("Database error: {0}")]
    Database(String),
}

impl StorageError {
    /// Returns true when the error is a unique violation on the given column.
    ///
    /// `column` is matched against the `table.column` list SQLite reports.
    pub fn violates(&self, column: &str) -> bool {
        match self {
            StorageError::UniqueViolation { constraint } => {
                constraint.split(',').any(|c| c.trim() == column)
            }
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &err {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    let constraint = message
                        .as_deref()
                        .and_then(|m| m.strip_prefix("UNIQUE constraint failed: "))
                        .unwrap_or("unknown")
                        .to_string();
                    return StorageError::UniqueViolation { constraint };
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return StorageError::ForeignKeyViolation,
                _ => {}
            }
        }
        StorageError::Database(err.to_string())
    }
}
