use std::{fmt, str::FromStr};

use crate::error::ModelError;

/// Account role. Stored and serialized in upper case (`ADMIN`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Role {
    Admin,
    Lecturer,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Lecturer => "LECTURER",
            Role::Student => "STUDENT",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "LECTURER" => Ok(Role::Lecturer),
            "STUDENT" => Ok(Role::Student),
            other => Err(ModelError::Parse(format!("unknown role '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Lecturer ".parse::<Role>().unwrap(), Role::Lecturer);
        assert!("teacher".parse::<Role>().is_err());
    }

    #[test]
    fn defaults_to_student() {
        assert_eq!(Role::default(), Role::Student);
        assert_eq!(Role::default().to_string(), "STUDENT");
    }
}
