use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Portal roles.
///
/// The order of variants matters: it defines the privilege hierarchy.
/// `Student` is the least privileged, `Admin` is the most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default role of every signed-in user. Read-only.
    Student = 0,
    /// May write and submit articles.
    Author = 1,
    /// Full moderation access.
    Admin = 2,
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Author => write!(f, "author"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl Role {
    /// Parse a role from a string (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "student" => Some(Role::Student),
            "author" => Some(Role::Author),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Returns `true` if `self` has at least the required role.
    pub fn has_access(&self, required: Role) -> bool {
        *self >= required
    }
}

/// A portal user as stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Subject of the bearer token.
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// The caller of an authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Fails with `Forbidden` unless the user holds at least `required`.
    pub fn require(&self, required: Role) -> Result<(), crate::error::AppError> {
        if self.role.has_access(required) {
            Ok(())
        } else {
            Err(crate::error::AppError::Forbidden(format!(
                "This action requires the '{}' role",
                required
            )))
        }
    }

    /// Name shown as an article byline.
    pub fn byline(&self) -> String {
        self.display_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.clone())
    }
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            uid: user.uid,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin > Role::Author);
        assert!(Role::Author > Role::Student);
    }

    #[test]
    fn test_has_access() {
        assert!(Role::Admin.has_access(Role::Author));
        assert!(Role::Author.has_access(Role::Author));
        assert!(!Role::Author.has_access(Role::Admin));
        assert!(!Role::Student.has_access(Role::Author));
    }

    #[test]
    fn test_from_str_ci() {
        assert_eq!(Role::from_str_ci("Admin"), Some(Role::Admin));
        assert_eq!(Role::from_str_ci("AUTHOR"), Some(Role::Author));
        assert_eq!(Role::from_str_ci("student"), Some(Role::Student));
        assert_eq!(Role::from_str_ci("moderator"), None);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Author).unwrap(), "\"author\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_require_and_byline() {
        let user = AuthenticatedUser {
            uid: "u1".to_string(),
            email: "writer@dept.edu".to_string(),
            display_name: None,
            role: Role::Author,
        };
        assert!(user.require(Role::Author).is_ok());
        assert!(matches!(
            user.require(Role::Admin),
            Err(crate::error::AppError::Forbidden(_))
        ));
        assert_eq!(user.byline(), "writer@dept.edu");
    }
}
