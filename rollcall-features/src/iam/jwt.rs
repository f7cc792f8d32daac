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

//! JWT token generation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rollcall_core::Role;
use serde::{Deserialize, Serialize};

use super::error::IamError;

/// Default access token lifetime in minutes.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Numeric user id, used to load the account on each request
    pub user_id: i64,
    /// Role at issuance time
    pub role: Option<Role>,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Lenient shape used for decoding so absent claims surface as
/// `MissingClaims` rather than a generic decode failure.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    user_id: Option<i64>,
    role: Option<Role>,
    exp: i64,
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime: Duration,
}

impl JwtManager {
    /// Create new JWT manager with secret key.
    ///
    /// # Arguments
    ///
    /// * `secret` - Secret key for signing tokens
    /// * `token_lifetime` - Lifetime applied by [`JwtManager::issue`]
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rollcall_features::iam::jwt::JwtManager;
    ///
    /// let manager = JwtManager::new("my-secret-key", chrono::Duration::minutes(30));
    /// ```
    pub fn new(secret: &str, token_lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_lifetime,
        }
    }

    /// Issue a token with the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `IamError::TokenGenerationFailed` if signing fails.
    pub fn issue(&self, subject: &str, user_id: i64, role: Role) -> Result<String, IamError> {
        self.issue_with_ttl(subject, user_id, role, self.token_lifetime)
    }

    /// Issue a token expiring `ttl` from now.
    pub fn issue_with_ttl(
        &self,
        subject: &str,
        user_id: i64,
        role: Role,
        ttl: Duration,
    ) -> Result<String, IamError> {
        let claims = TokenClaims {
            sub: subject.to_string(),
            user_id,
            role: Some(role),
            exp: (Utc::now() + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| IamError::TokenGenerationFailed)
    }

    /// Validate and decode a token.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` on a bad signature, malformed token or expiry
    /// - `MissingClaims` when `sub` or `user_id` is absent
    pub fn verify(&self, token: &str) -> Result<TokenClaims, IamError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<RawClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| IamError::InvalidToken)?;
        let raw = data.claims;

        match (raw.sub, raw.user_id) {
            (Some(sub), Some(user_id)) => Ok(TokenClaims {
                sub,
                user_id,
                role: raw.role,
                exp: raw.exp,
            }),
            _ => Err(IamError::MissingClaims),
        }
    }
}
