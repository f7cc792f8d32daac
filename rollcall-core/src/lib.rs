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

//! Rollcall Core - Entities and Storage
//!
//! This crate provides the persistent model of the attendance service:
//! - Entities (users, classes, students, attendance records)
//! - The `Repository` trait consumed by the domain services
//! - A SQLite-backed repository with the relational constraints enforced
//!   by the schema (unique indexes, foreign keys, cascades)

pub mod error;
pub mod storage;
pub mod types;

pub use error::StorageError;
pub use storage::{
    AbsenceCount, AttendanceFilter, Page, Repository, SqliteRepository, StudentFilter,
};
pub use types::*;
