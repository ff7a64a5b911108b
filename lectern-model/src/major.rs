use uuid::Uuid;

use crate::{
    audit::{AuditFields, Draft},
    error::{Result, require_non_blank},
    faculty::matches_search,
    ids::{FacultyID, MajorID},
    patch::apply_nullable,
};

/// A degree programme offered by a faculty.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Major {
    pub id: MajorID,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub faculty_id: FacultyID,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewMajor {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub id: Option<Uuid>,
    pub name: String,
    pub code: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    pub faculty_id: FacultyID,
}

impl NewMajor {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        faculty_id: FacultyID,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            code: code.into(),
            description: None,
            faculty_id,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("code", &self.code)
    }
}

impl Draft for NewMajor {
    fn claimed_id(&self) -> Option<Uuid> {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MajorPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub description: Option<Option<String>>,
    pub faculty_id: Option<FacultyID>,
}

impl MajorPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        if let Some(code) = &self.code {
            require_non_blank("code", code)?;
        }
        Ok(())
    }

    pub fn apply(&self, major: &mut Major) {
        if let Some(name) = &self.name {
            major.name = name.clone();
        }
        if let Some(code) = &self.code {
            major.code = code.clone();
        }
        apply_nullable(&mut major.description, &self.description);
        if let Some(faculty_id) = self.faculty_id {
            major.faculty_id = faculty_id;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MajorFilter {
    pub search: Option<String>,
    pub faculty_id: Option<FacultyID>,
}

impl MajorFilter {
    pub fn matches(&self, major: &Major) -> bool {
        matches_search(self.search.as_deref(), &major.name, &major.code)
            && self
                .faculty_id
                .is_none_or(|faculty| major.faculty_id == faculty)
    }
}
