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

//! Password hashing, verification and strength scoring.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use serde::Serialize;

use super::error::IamError;

/// Minimum character count for the length check.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Maximum UTF-8 byte length accepted by the length ceiling check.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password hasher using Argon2.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create new password hasher with default parameters.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Hash password using Argon2 with a random salt.
    ///
    /// # Returns
    ///
    /// Returns PHC string format hash that can be stored in database.
    ///
    /// # Errors
    ///
    /// Returns `IamError::HashingFailed` if hashing fails.
    pub fn hash_password(&self, password: &str) -> Result<String, IamError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| IamError::HashingFailed)?;
        Ok(hash.to_string())
    }

    /// Verify password against a stored hash.
    ///
    /// A malformed hash never matches.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self.argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse strength label derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

impl Strength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
        }
    }

    fn from_score(score: u8) -> Self {
        if score >= 5 {
            Strength::Strong
        } else if score >= 3 {
            Strength::Medium
        } else {
            Strength::Weak
        }
    }
}

/// Outcome of each individual strength check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrengthChecks {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digit: bool,
    pub special: bool,
    pub not_too_long: bool,
}

impl StrengthChecks {
    fn passed(&self) -> u8 {
        [
            self.length,
            self.uppercase,
            self.lowercase,
            self.digit,
            self.special,
            self.not_too_long,
        ]
        .iter()
        .filter(|&&c| c)
        .count() as u8
    }
}

/// Strength report for a candidate password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    pub strength: Strength,
    /// Number of passed checks, 0..=6
    pub score: u8,
    pub checks: StrengthChecks,
    /// True only when every check passes
    pub valid: bool,
}

/// Scores a password against the registration policy.
///
/// Length is counted in characters; the ceiling in UTF-8 bytes.
pub fn score_password_strength(password: &str) -> PasswordStrength {
    let checks = StrengthChecks {
        length: password.chars().count() >= MIN_PASSWORD_CHARS,
        uppercase: password.chars().any(char::is_uppercase),
        lowercase: password.chars().any(char::is_lowercase),
        digit: password.chars().any(|c| c.is_ascii_digit()),
        special: password.chars().any(|c| !c.is_alphanumeric()),
        not_too_long: password.len() <= MAX_PASSWORD_BYTES,
    };
    let score = checks.passed();

    PasswordStrength {
        strength: Strength::from_score(score),
        score,
        checks,
        valid: score == 6,
    }
}
