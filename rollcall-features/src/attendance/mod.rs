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

//! Attendance recording and aggregation.
//!
//! Daily statistics, monthly reports, class sheets and per-student rate,
//! history and summaries, all computed from the repository.

pub mod models;
pub mod service;

pub use models::{
    AbsenceEntry, AbsentStudent, AttendanceUpdate, BulkError, BulkResult, DailyStats,
    MonthlyReport, SheetEntry, StudentSummary,
};
pub use service::{month_bounds, AttendanceService};
