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

//! Role and class access checks.
//!
//! Every check is a pure function of the resolved [`Identity`] and the
//! referenced resource.

use rollcall_core::{Role, User};
use serde::Serialize;

use super::error::IamError;

/// Caller resolved from a verified token and the current user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub class_id: Option<i64>,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            is_active: user.is_active,
            class_id: user.class_id,
        }
    }
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Rejects deactivated accounts.
pub fn require_active(identity: &Identity) -> Result<(), IamError> {
    if identity.is_active {
        Ok(())
    } else {
        Err(IamError::InactiveAccount)
    }
}

/// Passes when the identity holds `role` or is an admin.
pub fn require_role(identity: &Identity, role: Role) -> Result<(), IamError> {
    if identity.role.satisfies(role) {
        Ok(())
    } else {
        Err(IamError::Forbidden(format!("Requires {} role", role)))
    }
}

pub fn require_teacher_or_admin(identity: &Identity) -> Result<(), IamError> {
    match identity.role {
        Role::Teacher | Role::Admin => Ok(()),
        Role::Student => Err(IamError::Forbidden(
            "Requires teacher or admin role".to_string(),
        )),
    }
}

/// Admins see every class; students only their own. Teachers are denied.
pub fn require_class_access(identity: &Identity, class_id: i64) -> Result<(), IamError> {
    if identity.is_admin() {
        return Ok(());
    }
    match identity.role {
        Role::Student if identity.class_id == Some(class_id) => Ok(()),
        _ => Err(IamError::Forbidden("Access denied to this class".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role, class_id: Option<i64>) -> Identity {
        Identity {
            user_id: 1,
            username: "someone".to_string(),
            role,
            is_active: true,
            class_id,
        }
    }

    #[test]
    fn test_inactive_identity_rejected() {
        let mut id = identity(Role::Admin, None);
        assert!(require_active(&id).is_ok());

        id.is_active = false;
        assert_eq!(require_active(&id), Err(IamError::InactiveAccount));
    }

    #[test]
    fn test_student_cannot_act_as_teacher() {
        let student = identity(Role::Student, Some(5));
        assert!(matches!(
            require_role(&student, Role::Teacher),
            Err(IamError::Forbidden(_))
        ));
        assert!(require_role(&student, Role::Student).is_ok());
    }

    #[test]
    fn test_admin_passes_every_role_check() {
        let admin = identity(Role::Admin, None);
        assert!(require_role(&admin, Role::Teacher).is_ok());
        assert!(require_role(&admin, Role::Student).is_ok());
        assert!(require_teacher_or_admin(&admin).is_ok());
    }

    #[test]
    fn test_teacher_or_admin() {
        assert!(require_teacher_or_admin(&identity(Role::Teacher, None)).is_ok());
        assert!(require_teacher_or_admin(&identity(Role::Student, Some(5))).is_err());
    }

    #[test]
    fn test_class_access_for_students_and_admins() {
        assert!(require_class_access(&identity(Role::Student, Some(5)), 5).is_ok());
        assert!(require_class_access(&identity(Role::Student, Some(6)), 5).is_err());
        assert!(require_class_access(&identity(Role::Student, None), 5).is_err());
        assert!(require_class_access(&identity(Role::Admin, None), 5).is_ok());
    }

    #[test]
    fn test_teacher_denied_class_access() {
        // Teachers currently have no class-scoped read access, even for a
        // class they teach. Needs product-owner sign-off before changing.
        let teacher = identity(Role::Teacher, Some(5));
        assert!(require_class_access(&teacher, 5).is_err());
    }
}
