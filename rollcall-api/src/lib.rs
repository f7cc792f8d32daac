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

//! Rollcall API Layer - HTTP API
//!
//! This crate exposes the attendance services over JSON/HTTP:
//! - Routing for auth, classes, students, attendance and reports
//! - Bearer token authentication and allowed-host checks
//! - Middleware for metrics and request logging
//! - Mapping of service errors to HTTP responses

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::ApiError;
pub use extract::{FormBody, JsonBody, PathParams, QueryParams};
pub use middleware::AllowedHosts;
pub use server::{create_router, AppState};
