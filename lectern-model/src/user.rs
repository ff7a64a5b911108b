//! User accounts.
//!
//! The password hash never lives on [`User`]; repositories keep it beside
//! the row and hand it out only to the authentication path.

use uuid::Uuid;

use crate::{
    audit::{AuditFields, Draft},
    error::{ModelError, Result, require_non_blank},
    ids::UserID,
    patch::apply_nullable,
    role::Role,
};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    pub id: UserID,
    /// Unique among live users.
    pub username: String,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewUser {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub id: Option<Uuid>,
    pub username: String,
    pub email: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: Role,
    #[cfg_attr(feature = "serde", serde(default))]
    pub full_name: Option<String>,
}

impl NewUser {
    /// A new account whose email defaults to the username.
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        let username = username.into();
        Self {
            id: None,
            email: username.clone(),
            username,
            role,
            full_name: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_blank("username", &self.username)?;
        if self.username.chars().any(char::is_whitespace) {
            return Err(ModelError::Validation(
                "username must not contain whitespace".into(),
            ));
        }
        require_non_blank("email", &self.email)
    }
}

impl Draft for NewUser {
    fn claimed_id(&self) -> Option<Uuid> {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UserPatch {
    pub email: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub full_name: Option<Option<String>>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(email) = &self.email {
            require_non_blank("email", email)?;
        }
        Ok(())
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        apply_nullable(&mut user.full_name, &self.full_name);
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_defaults_to_username() {
        let draft = NewUser::new("lan.nguyen", Role::Lecturer);
        assert_eq!(draft.email, "lan.nguyen");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn rejects_blank_or_spaced_usernames() {
        assert!(NewUser::new("  ", Role::Student).validate().is_err());
        assert!(NewUser::new("two words", Role::Student).validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn client_supplied_id_is_captured_not_dropped() {
        let raw = r#"{"id":"0190b7a4-6a4e-7c3e-9c55-000000000001",
            "username":"minh","email":"minh@example.edu"}"#;
        let draft: NewUser = serde_json::from_str(raw).unwrap();
        assert!(draft.claimed_id().is_some());
        assert_eq!(draft.role, Role::Student);
    }
}
