use uuid::Uuid;

use crate::{
    audit::{AuditFields, Draft},
    error::{Result, require_non_blank},
    ids::FacultyID,
};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Faculty {
    pub id: FacultyID,
    pub name: String,
    /// Short code, unique among live faculties.
    pub code: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewFaculty {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub id: Option<Uuid>,
    pub name: String,
    pub code: String,
}

impl NewFaculty {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            code: code.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("code", &self.code)
    }
}

impl Draft for NewFaculty {
    fn claimed_id(&self) -> Option<Uuid> {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FacultyPatch {
    pub name: Option<String>,
    pub code: Option<String>,
}

impl FacultyPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        if let Some(code) = &self.code {
            require_non_blank("code", code)?;
        }
        Ok(())
    }

    pub fn apply(&self, faculty: &mut Faculty) {
        if let Some(name) = &self.name {
            faculty.name = name.clone();
        }
        if let Some(code) = &self.code {
            faculty.code = code.clone();
        }
    }
}

/// Name-or-code substring match shared by faculty and major searches.
pub(crate) fn matches_search(
    search: Option<&str>,
    name: &str,
    code: &str,
) -> bool {
    match search.map(str::trim) {
        Some(needle) if !needle.is_empty() => {
            let needle = needle.to_lowercase();
            name.to_lowercase().contains(&needle)
                || code.to_lowercase().contains(&needle)
        }
        _ => true,
    }
}

impl Faculty {
    pub fn matches_search(&self, search: Option<&str>) -> bool {
        matches_search(search, &self.name, &self.code)
    }
}
