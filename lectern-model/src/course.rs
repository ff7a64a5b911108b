use uuid::Uuid;

use crate::{
    audit::{AuditFields, Draft},
    error::{Result, require_non_blank},
    ids::CourseID,
    patch::apply_nullable,
    video::Video,
};

/// A course authored by a lecturer. The author is `audit.created_by`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Course {
    pub id: CourseID,
    pub title: String,
    pub description: Option<String>,
    pub status: i32,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub audit: AuditFields,
}

/// A course together with its live videos in `order` sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CourseDetail {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub course: Course,
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewCourse {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub id: Option<Uuid>,
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: i32,
}

impl NewCourse {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_blank("title", &self.title)
    }
}

impl Draft for NewCourse {
    fn claimed_id(&self) -> Option<Uuid> {
        self.id
    }
}

/// Partial update; `None` leaves the stored value untouched and
/// `Some(None)` clears `description`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoursePatch {
    pub title: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub description: Option<Option<String>>,
    pub status: Option<i32>,
}

impl CoursePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            require_non_blank("title", title)?;
        }
        Ok(())
    }

    pub fn apply(&self, course: &mut Course) {
        if let Some(title) = &self.title {
            course.title = title.clone();
        }
        apply_nullable(&mut course.description, &self.description);
        if let Some(status) = self.status {
            course.status = status;
        }
    }
}

/// List filter: case-insensitive title search plus optional status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CourseFilter {
    pub search: Option<String>,
    pub status: Option<i32>,
}

impl CourseFilter {
    pub fn matches(&self, course: &Course) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => course
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        };
        let status_ok = self.status.is_none_or(|status| course.status == status);
        search_ok && status_ok
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::audit::reporting_offset;

    #[test]
    fn patch_clears_or_keeps_description() {
        let mut course = Course {
            id: CourseID::new(),
            title: "Rust".into(),
            description: Some("Ownership first".into()),
            status: 0,
            audit: AuditFields::created(
                Utc::now().with_timezone(&reporting_offset()),
                None,
            ),
        };

        CoursePatch {
            title: Some("Rust 101".into()),
            ..CoursePatch::default()
        }
        .apply(&mut course);
        assert_eq!(course.description.as_deref(), Some("Ownership first"));

        CoursePatch {
            description: Some(None),
            ..CoursePatch::default()
        }
        .apply(&mut course);
        assert_eq!(course.title, "Rust 101");
        assert_eq!(course.description, None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn null_description_is_a_clear() {
        let absent: CoursePatch =
            serde_json::from_str(r#"{"title":"Rust"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: CoursePatch =
            serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: CoursePatch =
            serde_json::from_str(r#"{"description":"Intro"}"#).unwrap();
        assert_eq!(set.description, Some(Some("Intro".into())));
    }
}
