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

//! Entity types shared by storage and the domain services.

pub mod attendance;
pub mod class;
pub mod student;
pub mod user;

pub use attendance::{Attendance, NewAttendance};
pub use class::{Class, NewClass};
pub use student::{NewStudent, Student};
pub use user::{NewUser, ParseRoleError, Role, User};
