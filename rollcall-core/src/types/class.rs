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

//! Classes (teaching groups).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    /// Primary key
    pub id: i64,
    /// Class name (unique)
    pub name: String,
    /// Grade label, e.g. "5th"
    pub grade: String,
    /// Owning teacher, if assigned
    pub teacher_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields required to insert a class.
#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub grade: String,
    pub teacher_id: Option<i64>,
}
