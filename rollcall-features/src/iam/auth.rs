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

//! Authentication service.

use std::sync::Arc;

use rollcall_core::{NewUser, Page, Repository, Role, User};
use tracing::{info, warn};
use validator::Validate;

use super::access::Identity;
use super::error::IamError;
use super::jwt::JwtManager;
use super::models::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest};
use super::password::{score_password_strength, PasswordHasher};
use crate::error::ServiceError;

const EMAIL_TAKEN: &str = "Email already registered";
const USERNAME_TAKEN: &str = "Username already taken";

const USER_UNIQUE_COLUMNS: &[(&str, &str)] = &[
    ("users.email", EMAIL_TAKEN),
    ("users.username", USERNAME_TAKEN),
];

/// Authentication service combining the user repository, the Argon2
/// hasher and the JWT manager.
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn Repository>,
    hasher: PasswordHasher,
    jwt_manager: JwtManager,
}

impl AuthService {
    /// Create new authentication service.
    ///
    /// # Arguments
    ///
    /// * `repo` - Repository holding user accounts
    /// * `jwt_manager` - JWT manager for token generation/validation
    pub fn new(repo: Arc<dyn Repository>, jwt_manager: JwtManager) -> Self {
        Self {
            repo,
            hasher: PasswordHasher::new(),
            jwt_manager,
        }
    }

    /// Register a new account.
    ///
    /// Checks run in order: email uniqueness, username uniqueness, class
    /// requirement for students, class existence, password strength.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed fields
    /// - `Duplicate` when the email or username is taken
    /// - `Policy` for a student without class or a weak password
    /// - `NotFound` when the class does not exist
    pub async fn register(&self, request: RegisterRequest) -> Result<User, ServiceError> {
        request.validate()?;

        if self.repo.get_user_by_email(&request.email).await?.is_some() {
            return Err(ServiceError::Duplicate(EMAIL_TAKEN.to_string()));
        }
        if self.repo.get_user_by_username(&request.username).await?.is_some() {
            return Err(ServiceError::Duplicate(USERNAME_TAKEN.to_string()));
        }

        if request.role == Role::Student && request.class_id.is_none() {
            return Err(ServiceError::policy("Students must be assigned to a class"));
        }
        if let Some(class_id) = request.class_id {
            if self.repo.get_class(class_id).await?.is_none() {
                return Err(ServiceError::NotFound("Class not found".to_string()));
            }
        }

        let strength = score_password_strength(&request.password);
        if !strength.valid {
            return Err(ServiceError::Policy {
                message: "Password too weak".to_string(),
                password_strength: Some(strength.strength),
            });
        }

        let password_hash = self.hasher.hash_password(&request.password)?;
        let user = self
            .repo
            .insert_user(NewUser {
                email: request.email,
                username: request.username,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
                role: request.role,
                class_id: request.class_id,
            })
            .await
            .map_err(|e| ServiceError::from_unique(e, USER_UNIQUE_COLUMNS))?;

        info!("Registered user {} ({})", user.username, user.role);
        Ok(user)
    }

    /// Authenticate user with username and password.
    ///
    /// # Returns
    ///
    /// Returns a bearer token and the user it was issued for.
    ///
    /// # Errors
    ///
    /// `Authentication` for an unknown user, a wrong password or a
    /// deactivated account.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
        let user = match self.repo.get_user_by_username(&request.username).await? {
            Some(user) if self.hasher.verify_password(&request.password, &user.password_hash) => {
                user
            }
            _ => {
                warn!("Failed login attempt for {}", request.username);
                return Err(IamError::InvalidCredentials.into());
            }
        };

        if !user.is_active {
            warn!("Login attempt for inactive user {}", user.username);
            return Err(ServiceError::Authentication(
                IamError::InactiveAccount.to_string(),
            ));
        }

        let access_token = self.jwt_manager.issue(&user.username, user.id, user.role)?;
        info!("User {} logged in", user.username);

        Ok(LoginResponse {
            access_token,
            token_type: "bearer".to_string(),
            user: user.into(),
        })
    }

    /// Resolve a bearer token into the caller's current identity.
    ///
    /// The identity reflects the stored account, not the role embedded in
    /// the token. Activity is not checked here.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, ServiceError> {
        let claims = self.jwt_manager.verify(token)?;

        let user = self
            .repo
            .get_user(claims.user_id)
            .await?
            .ok_or(IamError::InvalidToken)?;

        Ok(Identity::from(&user))
    }

    /// Load the account behind an identity.
    pub async fn current_user(&self, identity: &Identity) -> Result<User, ServiceError> {
        self.get_user(identity.user_id).await
    }

    pub async fn list_users(&self, page: Page) -> Result<Vec<User>, ServiceError> {
        Ok(self.repo.list_users(page).await?)
    }

    /// Deactivate an account. The row is kept.
    pub async fn deactivate_user(&self, user_id: i64) -> Result<User, ServiceError> {
        let mut user = self.get_user(user_id).await?;
        user.is_active = false;

        let user = self.repo.update_user(&user).await?;
        info!("Deactivated user {}", user.username);
        Ok(user)
    }

    /// Update the caller's own names and email.
    pub async fn update_profile(
        &self,
        identity: &Identity,
        request: UpdateProfileRequest,
    ) -> Result<User, ServiceError> {
        request.validate()?;
        let mut user = self.get_user(identity.user_id).await?;

        if let Some(email) = request.email {
            if email != user.email {
                if let Some(other) = self.repo.get_user_by_email(&email).await? {
                    if other.id != user.id {
                        return Err(ServiceError::Duplicate(EMAIL_TAKEN.to_string()));
                    }
                }
                user.email = email;
            }
        }
        if let Some(first_name) = request.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = request.last_name {
            user.last_name = last_name;
        }

        self.repo
            .update_user(&user)
            .await
            .map_err(|e| ServiceError::from_unique(e, USER_UNIQUE_COLUMNS))
    }

    /// Create the bootstrap admin account unless the username exists.
    ///
    /// Returns `true` when a new account was created.
    pub async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, ServiceError> {
        if let Some(existing) = self.repo.get_user_by_username(username).await? {
            if existing.role != Role::Admin {
                warn!("Bootstrap user {} exists but is not an admin", username);
            }
            return Ok(false);
        }

        let strength = score_password_strength(password);
        if !strength.valid {
            warn!(
                "Bootstrap admin password is {} (score {}/6)",
                strength.strength.as_str(),
                strength.score
            );
        }

        let password_hash = self.hasher.hash_password(password)?;
        self.repo
            .insert_user(NewUser {
                email: email.to_string(),
                username: username.to_string(),
                password_hash,
                first_name: "Admin".to_string(),
                last_name: "User".to_string(),
                role: Role::Admin,
                class_id: None,
            })
            .await
            .map_err(|e| ServiceError::from_unique(e, USER_UNIQUE_COLUMNS))?;

        info!("Created admin user {}", username);
        Ok(true)
    }

    async fn get_user(&self, user_id: i64) -> Result<User, ServiceError> {
        self.repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }
}
