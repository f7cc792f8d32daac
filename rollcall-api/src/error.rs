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

//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"detail": "<message>"}` with a fixed
//! status per error class. Storage and internal failures are logged and
//! replaced by a generic message.

use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rollcall_core::StorageError;
use rollcall_features::iam::{IamError, Strength};
use rollcall_features::ServiceError;
use serde_json::json;
use tracing::error;

/// Header carrying the strength label of a rejected password.
pub const PASSWORD_STRENGTH_HEADER: &str = "x-password-strength";

const INTERNAL_MESSAGE: &str = "Internal server error";

/// API error returned by handlers and middleware.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed input (400)
    Validation(String),
    /// Unique constraint violated (400)
    Duplicate(String),
    /// Missing entity (404)
    NotFound(String),
    /// Missing or invalid credentials (401, with `WWW-Authenticate`)
    Unauthorized(String),
    /// Insufficient role or scope (403)
    Forbidden(String),
    /// Business rule violated (400)
    Policy {
        message: String,
        password_strength: Option<Strength>,
    },
    /// Any failure whose detail must not leave the server (500)
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Duplicate(_) | ApiError::Policy { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(m) => ApiError::Validation(m),
            ServiceError::Duplicate(m) => ApiError::Duplicate(m),
            ServiceError::NotFound(m) => ApiError::NotFound(m),
            ServiceError::Authentication(m) => ApiError::Unauthorized(m),
            ServiceError::Authorization(m) => ApiError::Forbidden(m),
            ServiceError::Policy {
                message,
                password_strength,
            } => ApiError::Policy {
                message,
                password_strength,
            },
            ServiceError::Storage(e) => {
                error!("Storage failure: {}", e);
                ApiError::Internal
            }
            ServiceError::Internal(m) => {
                error!("Internal failure: {}", m);
                ApiError::Internal
            }
        }
    }
}

impl From<IamError> for ApiError {
    fn from(err: IamError) -> Self {
        ServiceError::from(err).into()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ServiceError::from(err).into()
    }
}

macro_rules! rejection_is_validation {
    ($($rejection:ty),+) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    ApiError::Validation(rejection.body_text())
                }
            }
        )+
    };
}

rejection_is_validation!(JsonRejection, QueryRejection, PathRejection, FormRejection);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, strength) = match self {
            ApiError::Validation(m)
            | ApiError::Duplicate(m)
            | ApiError::NotFound(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m) => (m, None),
            ApiError::Policy {
                message,
                password_strength,
            } => (message, password_strength),
            ApiError::Internal => (INTERNAL_MESSAGE.to_string(), None),
        };

        let mut response = (status, Json(json!({ "detail": message }))).into_response();
        let headers = response.headers_mut();
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if let Some(strength) = strength {
            headers.insert(
                PASSWORD_STRENGTH_HEADER,
                HeaderValue::from_static(strength.as_str()),
            );
        }
        response
    }
}
