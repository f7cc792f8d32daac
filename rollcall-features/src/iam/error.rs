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

//! IAM error types.

use thiserror::Error;

/// Credential, token and access-control failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IamError {
    /// Unknown username or wrong password
    #[error("Incorrect username or password")]
    InvalidCredentials,

    /// Password hashing operation failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// JWT token generation failed
    #[error("Token generation failed")]
    TokenGenerationFailed,

    /// JWT token has a bad signature, is malformed or expired
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token decoded but lacks the subject or user id
    #[error("Token is missing required claims")]
    MissingClaims,

    /// Account has been deactivated
    #[error("Inactive user")]
    InactiveAccount,

    /// Identity lacks the role or class membership a resource requires
    #[error("{0}")]
    Forbidden(String),
}
