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

//! Service-level error taxonomy.

use rollcall_core::StorageError;
use thiserror::Error;

use crate::iam::error::IamError;
use crate::iam::password::Strength;

/// Errors returned by the domain services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Malformed input caught before domain logic
    #[error("{0}")]
    Validation(String),

    /// Unique constraint (email, username, name, attendance triple)
    #[error("{0}")]
    Duplicate(String),

    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Bad credentials or invalid/expired token
    #[error("{0}")]
    Authentication(String),

    /// Authenticated but lacking role or scope
    #[error("{0}")]
    Authorization(String),

    /// Business rule violated (weak password, absence without reason)
    #[error("{message}")]
    Policy {
        message: String,
        /// Strength label for weak-password rejections
        password_strength: Option<Strength>,
    },

    /// Underlying storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn policy(message: impl Into<String>) -> Self {
        ServiceError::Policy {
            message: message.into(),
            password_strength: None,
        }
    }

    /// Maps a storage error to `Duplicate` when it violates one of the
    /// listed `(column, message)` pairs.
    pub(crate) fn from_unique(err: StorageError, columns: &[(&str, &str)]) -> Self {
        match &err {
            StorageError::UniqueViolation { .. } => {
                for (column, message) in columns {
                    if err.violates(column) {
                        return ServiceError::Duplicate((*message).to_string());
                    }
                }
                ServiceError::Storage(err)
            }
            _ => ServiceError::Storage(err),
        }
    }
}

impl From<IamError> for ServiceError {
    fn from(err: IamError) -> Self {
        match err {
            IamError::InvalidCredentials => ServiceError::Authentication(err.to_string()),
            IamError::InvalidToken | IamError::MissingClaims => {
                ServiceError::Authentication("Could not validate credentials".to_string())
            }
            IamError::InactiveAccount => ServiceError::Validation(err.to_string()),
            IamError::Forbidden(message) => ServiceError::Authorization(message),
            IamError::HashingFailed | IamError::TokenGenerationFailed => {
                ServiceError::Internal(err.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}
