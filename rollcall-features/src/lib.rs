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

//! Rollcall Domain Features
//!
//! This crate provides the domain logic of the attendance service:
//! - IAM: password hashing and strength policy, JWT tokens, access checks
//! - Attendance recording and aggregation (daily stats, monthly reports)
//! - Class and student roster management

pub mod attendance;
pub mod error;
pub mod iam;
pub mod roster;

pub use attendance::AttendanceService;
pub use error::ServiceError;
pub use iam::{AuthService, Identity, IamError, JwtManager};
pub use roster::{ClassService, StudentService};
