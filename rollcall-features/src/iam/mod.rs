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

//! IAM (Identity and Access Management) module.
//!
//! Provides password hashing and strength scoring, JWT issuance and
//! verification, and the role/class access checks.

pub mod access;
pub mod auth;
pub mod error;
pub mod jwt;
pub mod models;
pub mod password;

pub use access::{
    require_active, require_class_access, require_role, require_teacher_or_admin, Identity,
};
pub use auth::AuthService;
pub use error::IamError;
pub use jwt::{JwtManager, TokenClaims, DEFAULT_TOKEN_TTL_MINUTES};
pub use models::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest, UserResponse};
pub use password::{score_password_strength, PasswordHasher, PasswordStrength, Strength};
