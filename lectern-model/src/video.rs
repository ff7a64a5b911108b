use uuid::Uuid;

use crate::{
    audit::{AuditFields, Draft},
    error::{Result, require_non_blank},
    ids::{CourseID, VideoID},
    patch::apply_nullable,
};

/// A lesson video. `order` is its zero-based slot among the live videos of
/// `course_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Video {
    pub id: VideoID,
    pub course_id: CourseID,
    pub title: String,
    pub url: Option<String>,
    pub size: Option<i64>,
    pub status: Option<String>,
    pub order: i32,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub audit: AuditFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewVideo {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub id: Option<Uuid>,
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub url: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub size: Option<i64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: Option<String>,
}

impl NewVideo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_blank("title", &self.title)?;
        if self.size.is_some_and(|size| size < 0) {
            return Err(crate::ModelError::Validation(
                "size must not be negative".into(),
            ));
        }
        Ok(())
    }
}

impl Draft for NewVideo {
    fn claimed_id(&self) -> Option<Uuid> {
        self.id
    }
}

/// Partial update of the descriptive fields. Position changes go through
/// reordering, never through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VideoPatch {
    pub title: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub url: Option<Option<String>>,
    #[cfg_attr(
        feature = "serde",
        serde(
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub size: Option<Option<i64>>,
    #[cfg_attr(
        feature = "serde",
        serde(
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub status: Option<Option<String>>,
}

impl VideoPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            require_non_blank("title", title)?;
        }
        if self.size.flatten().is_some_and(|size| size < 0) {
            return Err(crate::ModelError::Validation(
                "size must not be negative".into(),
            ));
        }
        Ok(())
    }

    pub fn apply(&self, video: &mut Video) {
        if let Some(title) = &self.title {
            video.title = title.clone();
        }
        apply_nullable(&mut video.url, &self.url);
        apply_nullable(&mut video.size, &self.size);
        apply_nullable(&mut video.status, &self.status);
    }
}
